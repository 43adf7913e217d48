/*
 * Responsibility
 * - users <-> permissions (many-to-many) lookups and grants
 * - the permission set type used by the authorization gates
 */
use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::repos::{error::RepoResult, with_deadline};

pub const SCHOOLS_READ: &str = "schools:read";
pub const SCHOOLS_WRITE: &str = "schools:write";

/// `$1` user id, `$2` text[] of codes. Unknown codes are skipped.
pub(crate) const GRANT_SQL: &str = r#"
    INSERT INTO users_permissions (user_id, permission_id)
    SELECT $1, permissions.id
    FROM permissions
    WHERE permissions.code = ANY($2)
    ON CONFLICT DO NOTHING
"#;

/// Capability codes granted to one user. Codes are opaque and compared exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions(BTreeSet<String>);

impl Permissions {
    pub fn includes(&self, code: &str) -> bool {
        self.0.contains(code)
    }
}

impl FromIterator<String> for Permissions {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn all_for_user(&self, user_id: i64) -> RepoResult<Permissions>;

    /// Idempotent: granting a code the user already holds is a no-op.
    async fn grant(&self, user_id: i64, codes: &[&str]) -> RepoResult<()>;
}

#[derive(Clone, Debug)]
pub struct PermissionRepo {
    pool: PgPool,
    deadline: Duration,
}

impl PermissionRepo {
    pub fn new(pool: PgPool, deadline: Duration) -> Self {
        Self { pool, deadline }
    }
}

#[async_trait]
impl PermissionStore for PermissionRepo {
    async fn all_for_user(&self, user_id: i64) -> RepoResult<Permissions> {
        let codes = with_deadline(
            self.deadline,
            sqlx::query_scalar::<_, String>(
                r#"
                SELECT permissions.code
                FROM permissions
                INNER JOIN users_permissions
                    ON users_permissions.permission_id = permissions.id
                WHERE users_permissions.user_id = $1
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(codes.into_iter().collect())
    }

    async fn grant(&self, user_id: i64, codes: &[&str]) -> RepoResult<()> {
        let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();

        with_deadline(
            self.deadline,
            sqlx::query(GRANT_SQL)
                .bind(user_id)
                .bind(codes)
                .execute(&self.pool),
        )
        .await?;

        Ok(())
    }
}
