//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// PostgreSQL repository for link storage and retrieval.
///
/// Uses SQLx prepared statements for SQL injection protection. The click
/// counter is only touched by a single `UPDATE ... SET click_count =
/// click_count + 1`, so concurrent visits never lose increments.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    short_code: String,
    long_url: String,
    click_count: i64,
    created_at: DateTime<Utc>,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Link::new(row.short_code, row.long_url, row.click_count, row.created_at)
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn exists(&self, short_code: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM links WHERE short_code = $1)")
                .bind(short_code)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            INSERT INTO links (short_code, long_url)
            VALUES ($1, $2)
            RETURNING short_code, long_url, click_count, created_at
            "#,
        )
        .bind(&new_link.short_code)
        .bind(&new_link.long_url)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT short_code, long_url, click_count, created_at
            FROM links
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn increment_click_count(&self, short_code: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE links SET click_count = click_count + 1 WHERE short_code = $1")
                .bind(short_code)
                .execute(self.pool.as_ref())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
