//! Author service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, CreateAuthor},
    repository::Repository,
};

fn validated_name(data: &CreateAuthor) -> AppResult<&str> {
    data.validate()?;
    data.normalized_name()
        .ok_or_else(|| AppError::Validation("Author name cannot be empty".to_string()))
}

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Author>> {
        let mut tx = self.repository.begin().await?;
        let authors = self.repository.authors_list(&mut tx).await?;
        tx.commit().await?;
        Ok(authors)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        let mut tx = self.repository.begin().await?;
        let author = self.repository.authors_get(&mut tx, id).await?;
        tx.commit().await?;
        author.ok_or_else(|| AppError::NotFound("Author not found".to_string()))
    }

    /// Create an author; names are unique
    pub async fn create(&self, data: &CreateAuthor) -> AppResult<Author> {
        let name = validated_name(data)?;

        let mut tx = self.repository.begin().await?;
        if self.repository.authors_name_exists(&mut tx, name, None).await? {
            return Err(AppError::Conflict("Author already exists".to_string()));
        }
        let author = self.repository.authors_create(&mut tx, name).await?;
        tx.commit().await?;

        tracing::info!(author_id = author.id, "Author created");
        Ok(author)
    }

    /// Rename an author
    pub async fn update(&self, id: i32, data: &CreateAuthor) -> AppResult<Author> {
        let name = validated_name(data)?;

        let mut tx = self.repository.begin().await?;
        if self.repository.authors_get(&mut tx, id).await?.is_none() {
            return Err(AppError::NotFound("Author not found".to_string()));
        }
        if self.repository.authors_name_exists(&mut tx, name, Some(id)).await? {
            return Err(AppError::Conflict("Author already exists".to_string()));
        }
        let author = self
            .repository
            .authors_rename(&mut tx, id, name)
            .await?
            .ok_or_else(|| AppError::NotFound("Author not found".to_string()))?;
        tx.commit().await?;
        Ok(author)
    }

    /// Delete an author together with their books
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        if !self.repository.authors_delete(&mut tx, id).await? {
            return Err(AppError::NotFound("Author not found".to_string()));
        }
        tx.commit().await?;

        tracing::info!(author_id = id, "Author deleted with their books");
        Ok(())
    }
}
