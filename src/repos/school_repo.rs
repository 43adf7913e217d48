/*
 * Responsibility
 * - schools CRUD (the versioned record of this API)
 * - update is a version-guarded full-record write
 * - list supports full-text name/level filters, mode containment and paging
 */
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::{
    error::{RepoError, RepoResult},
    paging::{Metadata, Page, Sort},
    versioned::VersionedUpdate,
    with_deadline,
};

#[derive(Debug, Clone, FromRow)]
pub struct SchoolRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub level: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub address: String,
    pub mode: Vec<String>,
    pub version: i32,
}

/// Mutable fields of a school, as accepted on create.
#[derive(Debug, Clone)]
pub struct NewSchool {
    pub name: String,
    pub level: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub address: String,
    pub mode: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SchoolFilters {
    pub name: String,
    pub level: String,
    pub mode: Vec<String>,
    pub page: Page,
    pub sort: Sort,
}

#[derive(Debug, FromRow)]
struct SchoolListRow {
    total_records: i64,
    #[sqlx(flatten)]
    school: SchoolRow,
}

#[async_trait]
pub trait SchoolStore: Send + Sync {
    async fn insert(&self, school: NewSchool) -> RepoResult<SchoolRow>;

    /// `RepoError::NotFound` when no school has this id.
    async fn get(&self, id: i64) -> RepoResult<SchoolRow>;

    /// Version-guarded full-record write. On success `school.version` is advanced.
    async fn update(&self, school: &mut SchoolRow) -> RepoResult<()>;

    /// `RepoError::NotFound` when nothing was deleted.
    async fn delete(&self, id: i64) -> RepoResult<()>;

    async fn list(&self, filters: &SchoolFilters) -> RepoResult<(Vec<SchoolRow>, Metadata)>;
}

#[derive(Clone, Debug)]
pub struct SchoolRepo {
    pool: PgPool,
    deadline: Duration,
}

impl SchoolRepo {
    pub fn new(pool: PgPool, deadline: Duration) -> Self {
        Self { pool, deadline }
    }
}

#[async_trait]
impl SchoolStore for SchoolRepo {
    async fn insert(&self, school: NewSchool) -> RepoResult<SchoolRow> {
        let row = with_deadline(
            self.deadline,
            sqlx::query_as::<_, SchoolRow>(
                r#"
                INSERT INTO schools (name, level, contact, phone, email, website, address, mode)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING
                    id, created_at, name, level, contact, phone, email, website, address, mode, version
                "#,
            )
            .bind(school.name)
            .bind(school.level)
            .bind(school.contact)
            .bind(school.phone)
            .bind(school.email)
            .bind(school.website)
            .bind(school.address)
            .bind(school.mode)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(row)
    }

    async fn get(&self, id: i64) -> RepoResult<SchoolRow> {
        if id < 1 {
            return Err(RepoError::NotFound);
        }

        with_deadline(
            self.deadline,
            sqlx::query_as::<_, SchoolRow>(
                r#"
                SELECT
                    id, created_at, name, level, contact, phone, email, website, address, mode, version
                FROM schools
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn update(&self, school: &mut SchoolRow) -> RepoResult<()> {
        let version = VersionedUpdate::new("schools", "id", school.id, school.version)
            .set("name", school.name.clone())
            .set("level", school.level.clone())
            .set("contact", school.contact.clone())
            .set("phone", school.phone.clone())
            .set("email", school.email.clone())
            .set("website", school.website.clone())
            .set("address", school.address.clone())
            .set("mode", school.mode.clone())
            .execute(&self.pool, self.deadline)
            .await?;

        school.version = version;
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        if id < 1 {
            return Err(RepoError::NotFound);
        }

        let result = with_deadline(
            self.deadline,
            sqlx::query(
                r#"
                DELETE FROM schools
                WHERE id = $1
                "#,
            )
            .bind(id)
            .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, filters: &SchoolFilters) -> RepoResult<(Vec<SchoolRow>, Metadata)> {
        // ORDER BY cannot be bound; both parts come from the Sort safelist.
        let query = format!(
            r#"
            SELECT
                COUNT(*) OVER() AS total_records,
                id, created_at, name, level, contact, phone, email, website, address, mode, version
            FROM schools
            WHERE (to_tsvector('simple', name) @@ plainto_tsquery('simple', $1) OR $1 = '')
                AND (to_tsvector('simple', level) @@ plainto_tsquery('simple', $2) OR $2 = '')
                AND (mode @> $3 OR $3 = '{{}}')
            ORDER BY {} {}, id ASC
            LIMIT $4 OFFSET $5
            "#,
            filters.sort.column.as_sql(),
            filters.sort.direction_sql(),
        );

        let rows = with_deadline(
            self.deadline,
            sqlx::query_as::<_, SchoolListRow>(&query)
                .bind(&filters.name)
                .bind(&filters.level)
                .bind(&filters.mode)
                .bind(filters.page.limit())
                .bind(filters.page.offset())
                .fetch_all(&self.pool),
        )
        .await?;

        let total = rows.first().map(|r| r.total_records).unwrap_or(0);
        let schools = rows.into_iter().map(|r| r.school).collect();

        Ok((schools, Metadata::calculate(total, filters.page)))
    }
}
