//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{RegisterUser, TokenResponse, UpdateUser, User, UserChanges, UserClaims, UserRead},
    repository::Repository,
};

/// Hash a password using Argon2
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Run CPU-bound password work off the async workers
async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Password task failed: {}", e)))?
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new account
    pub async fn register(&self, data: RegisterUser) -> AppResult<UserRead> {
        data.validate()?;

        let password = data.password;
        let hashed = blocking(move || hash_password(&password)).await?;

        let mut tx = self.repository.begin().await?;
        if self.repository.users_email_exists(&mut tx, &data.email, None).await? {
            return Err(AppError::Conflict("A user with this email already exists".to_string()));
        }
        let user = self.repository.users_create(&mut tx, &data.email, &hashed).await?;
        tx.commit().await?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user.into())
    }

    /// Check credentials and issue a bearer token
    pub async fn login(&self, email: &str, password: &str) -> AppResult<TokenResponse> {
        let invalid = || AppError::Authentication("Invalid login or password".to_string());

        let mut tx = self.repository.begin().await?;
        let user = self.repository.users_get_by_email(&mut tx, email).await?;
        tx.commit().await?;
        let user = user.ok_or_else(invalid)?;

        let hash = user.hashed_password.clone();
        let password = password.to_string();
        if !blocking(move || verify_password(&hash, &password)).await? {
            return Err(invalid());
        }
        if !user.is_active {
            return Err(AppError::Authentication("Account is inactive".to_string()));
        }

        let access_token = UserClaims::new(user.id, self.config.jwt_expiration_minutes)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Resolve a bearer token to an active user
    pub async fn authenticate(&self, token: &str) -> AppResult<User> {
        let claims = UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let mut tx = self.repository.begin().await?;
        let user = self.repository.users_get(&mut tx, claims.user_id).await?;
        tx.commit().await?;

        match user {
            Some(user) if user.is_active => Ok(user),
            Some(_) => Err(AppError::Authentication("Account is inactive".to_string())),
            None => Err(AppError::Authentication("Unknown user".to_string())),
        }
    }

    pub async fn list(&self) -> AppResult<Vec<UserRead>> {
        let mut tx = self.repository.begin().await?;
        let users = self.repository.users_list(&mut tx).await?;
        tx.commit().await?;
        Ok(users.into_iter().map(UserRead::from).collect())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<UserRead> {
        let mut tx = self.repository.begin().await?;
        let user = self.repository.users_get(&mut tx, id).await?;
        tx.commit().await?;
        user.map(UserRead::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Apply a partial update; a new password is hashed before storage
    pub async fn update_user(&self, id: i32, data: UpdateUser) -> AppResult<UserRead> {
        if data.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        data.validate()?;

        let hashed_password = match data.password {
            Some(password) => Some(blocking(move || hash_password(&password)).await?),
            None => None,
        };
        let changes = UserChanges {
            email: data.email,
            hashed_password,
            is_active: data.is_active,
            is_superuser: data.is_superuser,
            is_verified: data.is_verified,
        };

        let mut tx = self.repository.begin().await?;
        if let Some(ref email) = changes.email {
            if self.repository.users_email_exists(&mut tx, email, Some(id)).await? {
                return Err(AppError::Conflict("A user with this email already exists".to_string()));
            }
        }
        let user = self
            .repository
            .users_update(&mut tx, id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        tx.commit().await?;
        Ok(user.into())
    }

    /// Grant superuser rights to a user
    pub async fn make_superuser(&self, id: i32) -> AppResult<UserRead> {
        let changes = UserChanges {
            is_superuser: Some(true),
            ..Default::default()
        };

        let mut tx = self.repository.begin().await?;
        let user = self
            .repository
            .users_update(&mut tx, id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        tx.commit().await?;

        tracing::warn!(user_id = id, "User promoted to superuser");
        Ok(user.into())
    }

    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        if !self.repository.users_delete(&mut tx, id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        tx.commit().await?;
        Ok(())
    }
}
