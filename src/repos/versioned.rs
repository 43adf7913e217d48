//! Optimistic concurrency for every mutable record.
//!
//! A versioned row carries an integer `version` starting at 1. Writes are a
//! single compare-and-swap at commit time:
//!
//! ```sql
//! UPDATE <table> SET <cols...>, version = version + 1
//! WHERE <id_col> = $id AND version = $expected
//! RETURNING version
//! ```
//!
//! Zero matched rows means another writer got there first (`EditConflict`).
//! Whether the record exists at all is decided by the read that precedes the
//! write, not here. Conflicts are never retried by this crate.

use std::time::Duration;

use sqlx::{Encode, PgPool, Postgres, QueryBuilder, Type};

use crate::repos::{
    error::{RepoError, RepoResult},
    with_deadline,
};

/// Conditional write builder shared by all versioned tables.
///
/// Table and column names are `&'static str` so only compile-time identifiers
/// ever reach the SQL text; values always go through bind parameters.
pub struct VersionedUpdate<'args> {
    builder: QueryBuilder<'args, Postgres>,
    id_column: &'static str,
    id: i64,
    expected_version: i32,
}

impl<'args> VersionedUpdate<'args> {
    pub fn new(
        table: &'static str,
        id_column: &'static str,
        id: i64,
        expected_version: i32,
    ) -> Self {
        Self {
            builder: QueryBuilder::new(format!("UPDATE {table} SET ")),
            id_column,
            id,
            expected_version,
        }
    }

    pub fn set<T>(mut self, column: &'static str, value: T) -> Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        self.builder
            .push(column)
            .push(" = ")
            .push_bind(value)
            .push(", ");
        self
    }

    fn push_guard(&mut self) {
        self.builder
            .push("version = version + 1 WHERE ")
            .push(self.id_column)
            .push(" = ")
            .push_bind(self.id)
            .push(" AND version = ")
            .push_bind(self.expected_version)
            .push(" RETURNING version");
    }

    /// Execute the write. Returns the new version on success.
    pub async fn execute(mut self, db: &PgPool, deadline: Duration) -> RepoResult<i32> {
        self.push_guard();

        let new_version = with_deadline(
            deadline,
            self.builder
                .build_query_scalar::<i32>()
                .fetch_optional(db),
        )
        .await?;

        new_version.ok_or(RepoError::EditConflict)
    }
}

/// The same compare-and-swap rule for stores that keep rows in memory.
pub fn compare_and_bump(stored: &mut i32, expected: i32) -> RepoResult<i32> {
    if *stored != expected {
        return Err(RepoError::EditConflict);
    }
    *stored += 1;
    Ok(*stored)
}

/// Honour a client-supplied expected version (e.g. `X-Expected-Version`)
/// against the version that was just read.
pub fn check_expected(current: i32, expected: Option<i32>) -> RepoResult<()> {
    match expected {
        Some(v) if v != current => Err(RepoError::EditConflict),
        _ => Ok(()),
    }
}
