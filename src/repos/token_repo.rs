use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::repos::{error::RepoResult, user_repo::UserRow, with_deadline};

/// `$1` hash, `$2` user id, `$3` expiry, `$4` scope.
pub(crate) const INSERT_TOKEN_SQL: &str = r#"
    INSERT INTO tokens (hash, user_id, expiry, scope)
    VALUES ($1, $2, $3, $4)
"#;

/// A token row whose owner is assigned when it is written.
#[derive(Debug, Clone)]
pub struct NewToken {
    pub hash: Vec<u8>,
    pub expiry: DateTime<Utc>,
    pub scope: &'static str,
}

/// DB access for bearer token persistence.
///
/// Notes:
/// - Only the SHA-256 of the plaintext is stored; the plaintext never reaches the DB.
/// - Schema:
///   - tokens.hash (bytea, primary key)
///   - tokens.user_id (bigint, FK users ON DELETE CASCADE)
///   - tokens.expiry (timestamptz)
///   - tokens.scope (text)
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(
        &self,
        hash: Vec<u8>,
        user_id: i64,
        expiry: DateTime<Utc>,
        scope: &str,
    ) -> RepoResult<()>;

    /// Owning user of the token matching `(hash, scope, expiry > now)`, if any.
    async fn find_user_for_token(
        &self,
        hash: Vec<u8>,
        scope: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<UserRow>>;

    /// Delete every token of `user_id` in `scope`. Returns the number removed.
    async fn delete_all_for_user(&self, scope: &str, user_id: i64) -> RepoResult<u64>;
}

#[derive(Clone, Debug)]
pub struct TokenRepo {
    pool: PgPool,
    deadline: Duration,
}

impl TokenRepo {
    pub fn new(pool: PgPool, deadline: Duration) -> Self {
        Self { pool, deadline }
    }
}

#[async_trait]
impl TokenStore for TokenRepo {
    async fn insert(
        &self,
        hash: Vec<u8>,
        user_id: i64,
        expiry: DateTime<Utc>,
        scope: &str,
    ) -> RepoResult<()> {
        with_deadline(
            self.deadline,
            sqlx::query(INSERT_TOKEN_SQL)
                .bind(hash)
                .bind(user_id)
                .bind(expiry)
                .bind(scope)
                .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn find_user_for_token(
        &self,
        hash: Vec<u8>,
        scope: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<UserRow>> {
        let row = with_deadline(
            self.deadline,
            sqlx::query_as::<_, UserRow>(
                r#"
                SELECT
                    users.id,
                    users.created_at,
                    users.name,
                    users.email,
                    users.password_hash,
                    users.activated,
                    users.version
                FROM users
                INNER JOIN tokens
                    ON users.id = tokens.user_id
                WHERE tokens.hash = $1
                    AND tokens.scope = $2
                    AND tokens.expiry > $3
                "#,
            )
            .bind(hash)
            .bind(scope)
            .bind(now)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row)
    }

    async fn delete_all_for_user(&self, scope: &str, user_id: i64) -> RepoResult<u64> {
        let done = with_deadline(
            self.deadline,
            sqlx::query(
                r#"
                DELETE FROM tokens
                WHERE scope = $1 AND user_id = $2
                "#,
            )
            .bind(scope)
            .bind(user_id)
            .execute(&self.pool),
        )
        .await?;

        Ok(done.rows_affected())
    }
}
