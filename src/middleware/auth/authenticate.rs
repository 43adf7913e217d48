//! Resolve the `Authorization` header into an [`AuthCtx`] and attach it to the request.
//!
//! - no header: `AuthCtx::Anonymous`, the request proceeds
//! - `Bearer <token>` with a live authentication token: `AuthCtx::User`
//! - anything else: 401 `invalid_authentication_token`, the handler never runs
//!
//! Every response carries `Vary: Authorization`.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{Scope, TokenError};
use crate::state::AppState;

/// Wrap every route of `router` with `authenticate`.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, authenticate))
}

async fn authenticate(State(state): State<AppState>, mut req: Request<Body>, next: Next) -> Response {
    let resolved = resolve(&state, req.headers()).await;
    let mut res = match resolved {
        Ok(ctx) => match attach(&mut req, ctx) {
            Ok(()) => next.run(req).await,
            Err(e) => e.into_response(),
        },
        Err(e) => e.into_response(),
    };

    res.headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    res
}

async fn resolve(state: &AppState, headers: &HeaderMap) -> Result<AuthCtx, AppError> {
    let Some(token) = bearer_token(headers)? else {
        return Ok(AuthCtx::Anonymous);
    };

    match state.tokens.validate(token, Scope::Authentication).await {
        Ok(user) => Ok(AuthCtx::User(user)),
        Err(TokenError::InvalidOrExpiredToken) => {
            warn!("authentication token rejected");
            Err(AppError::InvalidAuthToken)
        }
        Err(e) => Err(e.into()),
    }
}

/// `Ok(None)` when the header is absent; a present but malformed header is an error.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty() && !t.contains(' '))
        .ok_or_else(|| {
            warn!("malformed Authorization header");
            AppError::InvalidAuthToken
        })?;

    Ok(Some(token))
}

/// Identity is attached once per request.
fn attach(req: &mut Request<Body>, ctx: AuthCtx) -> Result<(), AppError> {
    if req.extensions_mut().insert(ctx).is_some() {
        error!("AuthCtx attached twice; authenticate middleware is layered more than once");
        return Err(AppError::Internal);
    }
    Ok(())
}
