use axum::extract::FromRequestParts;
use axum::http::{Extensions, request::Parts};
use tracing::error;

use crate::error::AppError;

use super::AuthCtx;

/// Read the identity attached by the authenticate middleware.
///
/// Absence is a wiring fault (the route is not behind `authenticate`), not a
/// client error: it is logged loudly and answered as a 500.
pub fn attached(extensions: &Extensions) -> Result<&AuthCtx, AppError> {
    extensions.get::<AuthCtx>().ok_or_else(|| {
        error!("AuthCtx missing from request; authenticate middleware is not applied to this route");
        AppError::Internal
    })
}

/// Extractor for handlers that need the caller's identity.
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        attached(&parts.extensions).cloned().map(AuthCtxExtractor)
    }
}
