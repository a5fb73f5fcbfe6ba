//! Author domain methods on Repository

use std::collections::HashSet;

use sqlx::PgConnection;

use super::Repository;
use crate::{error::AppResult, models::author::Author};

impl Repository {
    /// List all authors
    pub async fn authors_list(&self, conn: &mut PgConnection) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>("SELECT id, name FROM authors ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }

    /// Get author by ID
    pub async fn authors_get(&self, conn: &mut PgConnection, id: i32) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>("SELECT id, name FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(author)
    }

    /// Check if a name is already held by another author
    pub async fn authors_name_exists(
        &self,
        conn: &mut PgConnection,
        name: &str,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM authors WHERE name = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    /// Subset of `ids` that reference existing authors
    pub async fn authors_existing_ids(
        &self,
        conn: &mut PgConnection,
        ids: &[i32],
    ) -> AppResult<HashSet<i32>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let found: Vec<i32> = sqlx::query_scalar("SELECT id FROM authors WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *conn)
            .await?;
        Ok(found.into_iter().collect())
    }

    /// Create author
    pub async fn authors_create(&self, conn: &mut PgConnection, name: &str) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
        Ok(author)
    }

    /// Rename author. Returns `None` when the author does not exist.
    pub async fn authors_rename(
        &self,
        conn: &mut PgConnection,
        id: i32,
        name: &str,
    ) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "UPDATE authors SET name = $1 WHERE id = $2 RETURNING id, name",
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(author)
    }

    /// Delete author; their books go with them (ON DELETE CASCADE)
    pub async fn authors_delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
