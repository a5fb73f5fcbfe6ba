//! User management endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use axum_extra::extract::WithRejection;

use crate::{
    error::{AppError, AppResult},
    models::user::{UpdateUser, UserRead},
};

use super::{AuthenticatedUser, DetailResponse};

/// List users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "List of users", body = Vec<UserRead>)
    )
)]
pub async fn list_users(State(state): State<crate::AppState>) -> AppResult<Json<Vec<UserRead>>> {
    let users = state.services.users.list().await?;
    Ok(Json(users))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserRead),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<UserRead>> {
    let user = state.services.users.get_by_id(id).await?;
    Ok(Json(user))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserRead),
        (status = 400, description = "No fields to update"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(data), _): WithRejection<Json<UpdateUser>, AppError>,
) -> AppResult<Json<UserRead>> {
    let user = state.services.users.update_user(id, data).await?;
    Ok(Json(user))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = DetailResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<DetailResponse>> {
    state.services.users.delete_user(id).await?;
    Ok(Json(DetailResponse::new(format!("User {} deleted successfully", id))))
}

/// Promote the calling user to superuser (development helper)
#[utoipa::path(
    patch,
    path = "/users/make-me-superuser",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller promoted", body = DetailResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn make_me_superuser(
    State(state): State<crate::AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<DetailResponse>> {
    state.services.users.make_superuser(user.id).await?;
    Ok(Json(DetailResponse::new("You are now a superuser")))
}
