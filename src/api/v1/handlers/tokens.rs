use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, warn};

use crate::api::v1::dto::tokens::{AuthTokenEnvelope, CreateAuthTokenRequest};
use crate::api::v1::extractors::JsonBody;
use crate::error::AppError;
use crate::services::auth::{Scope, password};
use crate::state::AppState;

/// POST /tokens/authentication
///
/// Unknown email and wrong password get the same answer.
pub async fn create_authentication_token(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateAuthTokenRequest>,
) -> Result<(StatusCode, Json<AuthTokenEnvelope>), AppError> {
    req.validate().map_err(AppError::FailedValidation)?;

    let Some(user) = state.users.get_by_email(&req.email).await? else {
        warn!("login for unknown email");
        return Err(AppError::InvalidCredentials);
    };

    let matches =
        password::verify_password_off_runtime(req.password, user.password_hash.clone()).await?;
    if !matches {
        warn!(user_id = user.id, "login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state
        .tokens
        .issue(user.id, state.ttls.authentication, Scope::Authentication)
        .await?;

    info!(user_id = user.id, "authentication token issued");
    Ok((
        StatusCode::CREATED,
        Json(AuthTokenEnvelope {
            authentication_token: token,
        }),
    ))
}
