//! Repository layer for database operations
//!
//! Every method takes the caller's connection, normally a request-scoped
//! transaction opened with [`Repository::begin`]. Dropping that transaction
//! without committing rolls it back.

pub mod authors;
pub mod books;
pub mod users;

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::AppResult;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: PgPool,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a transaction for the duration of one operation
    pub async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Round-trip to the database (readiness probe)
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
