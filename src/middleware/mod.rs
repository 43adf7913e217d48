/*
 * Responsibility
 * - router-level layers: transport (http), browser policy (cors, security_headers)
 * - identity and authorization gates live under auth
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
