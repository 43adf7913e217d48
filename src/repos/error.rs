/**
 * Responsibility
 * - meaning that repos hand to the layers above
 * - sqlx errors with a business meaning (unique violation) are translated here
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,
    #[error("edit conflict")]
    EditConflict,
    #[error("duplicate email")]
    DuplicateEmail,
    #[error("store deadline exceeded")]
    Timeout,
    #[error("db error")]
    Db(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

const UNIQUE_VIOLATION: &str = "23505";
const USERS_EMAIL_KEY: &str = "users_email_key";

impl RepoError {
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some(UNIQUE_VIOLATION)
            && dbe.constraint() == Some(USERS_EMAIL_KEY)
        {
            return RepoError::DuplicateEmail;
        }
        RepoError::Db(e)
    }
}
