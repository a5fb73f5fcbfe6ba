//! Users repository for database operations

use sqlx::PgConnection;

use super::Repository;
use crate::{
    error::AppResult,
    models::user::{User, UserChanges},
};

const USER_COLUMNS: &str =
    "id, email, hashed_password, is_active, is_superuser, is_verified, created_at, updated_at";

impl Repository {
    /// List all users
    pub async fn users_list(&self, conn: &mut PgConnection) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id",
            USER_COLUMNS
        ))
        .fetch_all(&mut *conn)
        .await?;
        Ok(users)
    }

    /// Get user by ID
    pub async fn users_get(&self, conn: &mut PgConnection, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(user)
    }

    /// Get user by email (login identifier)
    pub async fn users_get_by_email(
        &self,
        conn: &mut PgConnection,
        email: &str,
    ) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(user)
    }

    /// Check if email already exists
    pub async fn users_email_exists(
        &self,
        conn: &mut PgConnection,
        email: &str,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    /// Create user with an already hashed password
    pub async fn users_create(
        &self,
        conn: &mut PgConnection,
        email: &str,
        hashed_password: &str,
    ) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, hashed_password) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&mut *conn)
        .await?;
        Ok(user)
    }

    /// Apply user changes. Returns `None` when the user does not exist.
    pub async fn users_update(
        &self,
        conn: &mut PgConnection,
        id: i32,
        changes: &UserChanges,
    ) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                email = COALESCE($1, email),
                hashed_password = COALESCE($2, hashed_password),
                is_active = COALESCE($3, is_active),
                is_superuser = COALESCE($4, is_superuser),
                is_verified = COALESCE($5, is_verified),
                updated_at = NOW()
            WHERE id = $6
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&changes.email)
        .bind(&changes.hashed_password)
        .bind(changes.is_active)
        .bind(changes.is_superuser)
        .bind(changes.is_verified)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(user)
    }

    /// Delete user
    pub async fn users_delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
