/*
 * Responsibility
 * - authenticate: resolve `Authorization` into an AuthCtx on every request
 * - authorize: per-route gates (activated user, named permission)
 */
pub mod authenticate;
pub mod authorize;

pub use authorize::{require_activated_user, require_permission};
