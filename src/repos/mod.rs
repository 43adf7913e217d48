/*
 * Responsibility
 * - persistence seams (traits) and their Postgres implementations
 * - every store round-trip is bounded by `with_deadline`
 */
use std::future::Future;
use std::time::Duration;

pub mod error;
pub mod paging;
pub mod permission_repo;
pub mod school_repo;
pub mod token_repo;
pub mod user_repo;
pub mod versioned;

#[cfg(test)]
pub mod memory;

use error::{RepoError, RepoResult};

/// Run one store interaction under `deadline`.
///
/// Elapsing is a store failure (`RepoError::Timeout`), never an auth failure.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> RepoResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(res) => res.map_err(RepoError::from_sqlx),
        Err(_) => Err(RepoError::Timeout),
    }
}
