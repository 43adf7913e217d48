use serde::{Deserialize, Serialize};

use crate::services::auth::Token;
use crate::validator::{FieldErrors, Validator};

use super::users::{check_email, check_password};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAuthTokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl CreateAuthTokenRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut v = Validator::new();
        check_email(&mut v, &self.email);
        check_password(&mut v, &self.password);
        v.into_result()
    }
}

impl std::fmt::Debug for CreateAuthTokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateAuthTokenRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// `{"authentication_token": {"token": "...", "expiry": "..."}}`
#[derive(Serialize)]
pub struct AuthTokenEnvelope {
    pub authentication_token: Token,
}
