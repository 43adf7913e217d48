use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use data_encoding::BASE32_NOPAD;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::repos::{
    error::RepoError,
    token_repo::{NewToken, TokenStore},
    user_repo::UserRow,
};

/// Random bytes per token. 16 bytes encode to exactly 26 base-32 characters.
const TOKEN_ENTROPY_BYTES: usize = 16;

/// Length of every plaintext this service issues.
pub const TOKEN_PLAINTEXT_LEN: usize = 26;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Activation,
    Authentication,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activation => "activation",
            Self::Authentication => "authentication",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly issued token.
///
/// `plaintext` exists only here and in the response that hands it to the
/// client; the store keeps `hash` alone.
#[derive(Clone, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: Vec<u8>,
    pub expiry: DateTime<Utc>,
    #[serde(skip)]
    pub scope: Scope,
}

impl Token {
    /// The persisted form: hash, expiry and scope, no plaintext.
    pub fn record(&self) -> NewToken {
        NewToken {
            hash: self.hash.clone(),
            expiry: self.expiry,
            scope: self.scope.as_str(),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// Covers every failed predicate (length, hash, scope, expiry) alike.
    #[error("invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("random source unavailable: {0}")]
    Rng(getrandom::Error),
    #[error(transparent)]
    Store(#[from] RepoError),
}

/// Issues, validates and revokes opaque bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Generate a token valid for `ttl` from now without persisting it.
    ///
    /// The caller writes `token.record()` itself, e.g. alongside the row that
    /// will own it.
    pub fn mint(ttl: ChronoDuration, scope: Scope) -> Result<Token, TokenError> {
        generate_token(Utc::now() + ttl, scope)
    }

    /// Issue a token for `user_id`, valid for `ttl` from now, and persist its hash.
    pub async fn issue(
        &self,
        user_id: i64,
        ttl: ChronoDuration,
        scope: Scope,
    ) -> Result<Token, TokenError> {
        let token = Self::mint(ttl, scope)?;

        debug!(
            user_id,
            scope = %scope,
            expiry = %token.expiry,
            "issuing token"
        );

        self.store
            .insert(token.hash.clone(), user_id, token.expiry, scope.as_str())
            .await?;

        Ok(token)
    }

    /// Resolve `candidate` to the user owning a live token of `scope`.
    pub async fn validate(&self, candidate: &str, scope: Scope) -> Result<UserRow, TokenError> {
        // Anything we did not issue cannot match; skip the store entirely.
        if candidate.len() != TOKEN_PLAINTEXT_LEN {
            return Err(TokenError::InvalidOrExpiredToken);
        }

        self.store
            .find_user_for_token(hash_token(candidate), scope.as_str(), Utc::now())
            .await?
            .ok_or(TokenError::InvalidOrExpiredToken)
    }

    /// Delete every token of `user_id` in `scope`.
    pub async fn revoke_all(&self, user_id: i64, scope: Scope) -> Result<u64, TokenError> {
        let removed = self
            .store
            .delete_all_for_user(scope.as_str(), user_id)
            .await?;

        debug!(user_id, scope = %scope, removed, "revoked tokens");
        Ok(removed)
    }
}

fn generate_token(expiry: DateTime<Utc>, scope: Scope) -> Result<Token, TokenError> {
    let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
    getrandom::fill(&mut bytes).map_err(TokenError::Rng)?;

    let plaintext = BASE32_NOPAD.encode(&bytes);
    let hash = hash_token(&plaintext);

    Ok(Token {
        plaintext,
        hash,
        expiry,
        scope,
    })
}

fn hash_token(plaintext: &str) -> Vec<u8> {
    // sha256(plaintext) -> raw 32 bytes (stored as BYTEA)
    Sha256::digest(plaintext.as_bytes()).to_vec()
}
