/*
 * Responsibility
 * - request/response shapes of v1, one module per resource
 * - request types carry validate(); failures are collected per field
 */
pub mod schools;
pub mod tokens;
pub mod users;
