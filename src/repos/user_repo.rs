/*
 * Responsibility
 * - SQLx operations for the users table (the principal record)
 * - registration writes the user, its grants and its activation token
 *   in one transaction
 * - full-record update goes through the versioned write
 * - DB errors are returned as RepoError (duplicate email is given meaning)
 */
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::{
    error::RepoResult,
    permission_repo::GRANT_SQL,
    token_repo::{INSERT_TOKEN_SQL, NewToken},
    versioned::VersionedUpdate,
    with_deadline,
};

#[derive(Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub activated: bool,
    pub version: i32,
}

// password_hash is intentionally not printable.
impl fmt::Debug for UserRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRow")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("activated", &self.activated)
            .field("version", &self.version)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert an unactivated user together with its initial permission
    /// grants and activation token. All three are written or none is.
    ///
    /// `RepoError::DuplicateEmail` on a taken email.
    async fn register(
        &self,
        user: NewUser,
        grants: &[&str],
        activation: NewToken,
    ) -> RepoResult<UserRow>;

    async fn get_by_email(&self, email: &str) -> RepoResult<Option<UserRow>>;

    /// Version-guarded full-record write. On success `user.version` is advanced.
    async fn update(&self, user: &mut UserRow) -> RepoResult<()>;
}

#[derive(Clone, Debug)]
pub struct UserRepo {
    pool: PgPool,
    deadline: Duration,
}

impl UserRepo {
    pub fn new(pool: PgPool, deadline: Duration) -> Self {
        Self { pool, deadline }
    }
}

#[async_trait]
impl UserStore for UserRepo {
    async fn register(
        &self,
        user: NewUser,
        grants: &[&str],
        activation: NewToken,
    ) -> RepoResult<UserRow> {
        let grants: Vec<String> = grants.iter().map(|c| c.to_string()).collect();

        // Dropping `tx` on any early return (or on deadline) rolls it back.
        let row = with_deadline(self.deadline, async {
            let mut tx = self.pool.begin().await?;

            let row = sqlx::query_as::<_, UserRow>(
                r#"
                INSERT INTO users (name, email, password_hash, activated)
                VALUES ($1, $2, $3, false)
                RETURNING id, created_at, name, email, password_hash, activated, version
                "#,
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(GRANT_SQL)
                .bind(row.id)
                .bind(&grants)
                .execute(&mut *tx)
                .await?;

            sqlx::query(INSERT_TOKEN_SQL)
                .bind(&activation.hash)
                .bind(row.id)
                .bind(activation.expiry)
                .bind(activation.scope)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(row)
        })
        .await?;

        Ok(row)
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<Option<UserRow>> {
        let row = with_deadline(
            self.deadline,
            sqlx::query_as::<_, UserRow>(
                r#"
                SELECT id, created_at, name, email, password_hash, activated, version
                FROM users
                WHERE email = $1::citext
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row)
    }

    async fn update(&self, user: &mut UserRow) -> RepoResult<()> {
        let version = VersionedUpdate::new("users", "id", user.id, user.version)
            .set("name", user.name.clone())
            .set("email", user.email.clone())
            .set("password_hash", user.password_hash.clone())
            .set("activated", user.activated)
            .execute(&self.pool, self.deadline)
            .await?;

        user.version = version;
        Ok(())
    }
}
