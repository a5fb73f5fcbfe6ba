//! Registration and login endpoints

use axum::{extract::State, http::StatusCode, Json};

use axum_extra::extract::WithRejection;

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginRequest, RegisterUser, TokenResponse, UserRead},
    AppState,
};

use super::AuthenticatedUser;

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "Account created", body = UserRead),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid email or password")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(data), _): WithRejection<Json<RegisterUser>, AppError>,
) -> AppResult<(StatusCode, Json<UserRead>)> {
    let user = state.services.users.register(data).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/jwt/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .services
        .users
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(token))
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserRead),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<UserRead> {
    Json(user.into())
}
