/*
 * Responsibility
 * - Users request/response DTOs
 * - validate() checks shape only; uniqueness of email is the store's call
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::user_repo::UserRow;
use crate::services::auth::token_service::TOKEN_PLAINTEXT_LEN;
use crate::validator::{FieldErrors, Validator, is_email};

const NAME_MAX_BYTES: usize = 500;
const PASSWORD_MIN_BYTES: usize = 8;
const PASSWORD_MAX_BYTES: usize = 72;

pub(crate) fn check_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(is_email(email), "email", "must be a valid email address");
}

pub(crate) fn check_password(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(
        password.len() >= PASSWORD_MIN_BYTES,
        "password",
        "must be at least 8 bytes long",
    );
    v.check(
        password.len() <= PASSWORD_MAX_BYTES,
        "password",
        "must not be more than 72 bytes long",
    );
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut v = Validator::new();

        v.check(!self.name.is_empty(), "name", "must be provided");
        v.check(
            self.name.len() <= NAME_MAX_BYTES,
            "name",
            "must not be more than 500 bytes long",
        );
        check_email(&mut v, &self.email);
        check_password(&mut v, &self.password);

        v.into_result()
    }
}

impl std::fmt::Debug for RegisterUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUserRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivateUserRequest {
    #[serde(default)]
    pub token: String,
}

impl ActivateUserRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut v = Validator::new();
        v.check(!self.token.is_empty(), "token", "must be provided");
        v.check(
            self.token.len() == TOKEN_PLAINTEXT_LEN,
            "token",
            "must be 26 bytes long",
        );
        v.into_result()
    }
}

/// Public view of a user; the password digest and version stay server-side.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub activated: bool,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            name: row.name,
            email: row.email,
            activated: row.activated,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(name: &str, email: &str, password: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(register("Alice", "alice@example.com", "pa55word!").validate().is_ok());
    }

    #[test]
    fn each_field_reports_its_first_problem() {
        let errors = register("", "nope", "short").validate().unwrap_err();

        assert_eq!(errors["name"], "must be provided");
        assert_eq!(errors["email"], "must be a valid email address");
        assert_eq!(errors["password"], "must be at least 8 bytes long");
    }

    #[test]
    fn password_is_capped_at_72_bytes() {
        let long = "x".repeat(73);
        let errors = register("Alice", "alice@example.com", &long)
            .validate()
            .unwrap_err();
        assert_eq!(errors["password"], "must not be more than 72 bytes long");
    }

    #[test]
    fn activation_token_must_have_issued_length() {
        let ok = ActivateUserRequest {
            token: "A".repeat(TOKEN_PLAINTEXT_LEN),
        };
        assert!(ok.validate().is_ok());

        let short = ActivateUserRequest { token: "ABC".into() };
        assert_eq!(short.validate().unwrap_err()["token"], "must be 26 bytes long");
    }

    #[test]
    fn password_never_shows_in_debug_output() {
        let dbg = format!("{:?}", register("Alice", "alice@example.com", "pa55word!"));
        assert!(!dbg.contains("pa55word!"));
    }
}
