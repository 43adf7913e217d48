/*
 * Responsibility
 * - the "who is calling" type handlers see
 * - the authenticate middleware attaches exactly one per request and
 *   handlers receive it only through the extractor in core.rs
 */
use crate::error::AppError;
use crate::repos::user_repo::UserRow;

/// Identity attached to a request.
///
/// - `Anonymous`: no credential was presented
/// - `User`: a valid authentication token resolved to this user
///
/// There is no third "unset" state; a request without an `AuthCtx` means the
/// middleware was not wired in.
#[derive(Debug, Clone)]
pub enum AuthCtx {
    Anonymous,
    User(UserRow),
}

impl AuthCtx {
    pub fn user(&self) -> Option<&UserRow> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user().map(|u| u.id)
    }

    /// Authenticated first, then activated.
    pub fn require_activated(&self) -> Result<&UserRow, AppError> {
        match self {
            Self::Anonymous => Err(AppError::AuthenticationRequired),
            Self::User(user) if !user.activated => Err(AppError::InactiveAccount),
            Self::User(user) => Ok(user),
        }
    }
}
