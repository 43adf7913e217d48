/*
 * Responsibility
 * - the ApiError of this application
 * - IntoResponse (HTTP status / JSON error body)
 * - RepoError / TokenError / PasswordError are converted here in one place;
 *   store faults are logged with detail and leave as an undifferentiated 500
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::repos::error::RepoError;
use crate::services::auth::{TokenError, password::PasswordError};
use crate::validator::FieldErrors;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("the request failed validation")]
    FailedValidation(FieldErrors),
    #[error("invalid authentication credentials")]
    InvalidCredentials,
    #[error("invalid or missing authentication token")]
    InvalidAuthToken,
    #[error("you must be authenticated to access this resource")]
    AuthenticationRequired,
    #[error("your user account must be activated to access this resource")]
    InactiveAccount,
    #[error("your user account doesn't have the necessary permissions to access this resource")]
    NotPermitted,
    #[error("the requested resource could not be found")]
    NotFound,
    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,
    #[error("the server encountered a problem and could not process your request")]
    Internal,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field, message.into());
        Self::FailedValidation(fields)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::FailedValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidCredentials
            | AppError::InvalidAuthToken
            | AppError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            AppError::InactiveAccount | AppError::NotPermitted => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::EditConflict => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::FailedValidation(_) => "failed_validation",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidAuthToken => "invalid_authentication_token",
            AppError::AuthenticationRequired => "authentication_required",
            AppError::InactiveAccount => "inactive_account",
            AppError::NotPermitted => "not_permitted",
            AppError::NotFound => "not_found",
            AppError::EditConflict => "edit_conflict",
            AppError::Internal => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.to_string();
        let bearer_challenge = matches!(self, AppError::InvalidAuthToken);

        let fields = match self {
            AppError::FailedValidation(fields) => Some(fields),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message,
                fields,
            },
        };

        let mut res = (status, Json(body)).into_response();
        if bearer_challenge {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        res
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => AppError::NotFound,
            RepoError::EditConflict => AppError::EditConflict,
            RepoError::DuplicateEmail => {
                AppError::field("email", "a user with this email address already exists")
            }
            RepoError::Timeout => {
                error!("store deadline exceeded");
                AppError::Internal
            }
            RepoError::Db(err) => {
                error!(error = ?err, "store failure");
                AppError::Internal
            }
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InvalidOrExpiredToken => AppError::InvalidAuthToken,
            TokenError::Store(err) => err.into(),
            TokenError::Rng(err) => {
                error!(error = %err, "failed to draw token entropy");
                AppError::Internal
            }
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        error!(error = %e, "password digest failure");
        AppError::Internal
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn store_failure_leaks_no_detail() {
        let err: AppError = RepoError::Db(sqlx::Error::PoolTimedOut).into();
        let res = err.into_response();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(res).await;
        assert_eq!(body["error"]["code"], "internal_error");
        assert!(!body.to_string().to_lowercase().contains("pool"));
    }

    #[tokio::test]
    async fn validation_failure_carries_fields() {
        let res = AppError::field("email", "must be provided").into_response();

        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(res).await;
        assert_eq!(body["error"]["fields"]["email"], "must be provided");
    }

    #[tokio::test]
    async fn invalid_token_sends_bearer_challenge() {
        let res = AppError::InvalidAuthToken.into_response();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn invalid_token_reason_is_undifferentiated() {
        let err: AppError = TokenError::InvalidOrExpiredToken.into();
        assert!(matches!(err, AppError::InvalidAuthToken));
        assert_eq!(err.to_string(), "invalid or missing authentication token");
    }

    #[test]
    fn conflict_and_not_found_keep_their_meaning() {
        assert_eq!(AppError::from(RepoError::EditConflict).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::from(RepoError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(RepoError::Timeout).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
