/*
 * Responsibility
 * - POST /users: store the user, its default permission and an activation
 *   token as one write, then hand the welcome mail to a background task
 * - PUT /users/activated: redeem an activation token
 */
use axum::{Json, extract::State, http::StatusCode};
use serde_json::json;
use tracing::info;

use crate::api::v1::dto::users::{ActivateUserRequest, RegisterUserRequest, UserEnvelope};
use crate::api::v1::extractors::JsonBody;
use crate::error::AppError;
use crate::repos::permission_repo::SCHOOLS_READ;
use crate::repos::user_repo::NewUser;
use crate::services::auth::{Scope, TokenError, TokenService, password};
use crate::services::mailer::USER_WELCOME_TEMPLATE;
use crate::state::AppState;

pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>), AppError> {
    req.validate().map_err(AppError::FailedValidation)?;

    let password_hash = password::hash_password_off_runtime(req.password).await?;

    let token = TokenService::mint(state.ttls.activation, Scope::Activation)?;

    let user = state
        .users
        .register(
            NewUser {
                name: req.name,
                email: req.email,
                password_hash,
            },
            &[SCHOOLS_READ],
            token.record(),
        )
        .await?;

    let mailer = state.mailer.clone();
    let recipient = user.email.clone();
    let user_id = user.id;
    state.background.spawn("welcome_mail", async move {
        let data = json!({
            "activationToken": token.plaintext,
            "userID": user_id,
        });
        mailer.send(&recipient, USER_WELCOME_TEMPLATE, data).await
    });

    info!(user_id, "user registered");
    Ok((StatusCode::ACCEPTED, Json(UserEnvelope { user: user.into() })))
}

pub async fn activate_user(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ActivateUserRequest>,
) -> Result<Json<UserEnvelope>, AppError> {
    req.validate().map_err(AppError::FailedValidation)?;

    let mut user = match state.tokens.validate(&req.token, Scope::Activation).await {
        Ok(user) => user,
        Err(TokenError::InvalidOrExpiredToken) => {
            return Err(AppError::field(
                "token",
                "invalid or expired activation token",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    user.activated = true;
    state.users.update(&mut user).await?;
    state.tokens.revoke_all(user.id, Scope::Activation).await?;

    info!(user_id = user.id, "user activated");
    Ok(Json(UserEnvelope { user: user.into() }))
}
