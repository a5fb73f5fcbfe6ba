//! API handlers for Bookshelf REST endpoints

pub mod auth;
pub mod authors;
pub mod books;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderName, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    RequestPartsExt, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::{Deserialize, Serialize};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{error::AppError, models::User, AppState};

/// Extractor for the authenticated, active user behind a bearer token
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| AppError::Authentication(format!("Missing bearer token: {}", e)))?;

        let user = state.services.users.authenticate(bearer.token()).await?;
        Ok(AuthenticatedUser(user))
    }
}

/// Plain confirmation body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self { detail: detail.into() }
    }
}

/// Re-shape the governor's plain-text 429 into the common error body,
/// keeping its wait hints.
async fn rate_limit_response(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let wait = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .map(|secs| format!("retry after {}s", secs))
        .unwrap_or_else(|| "retry later".to_string());

    let mut limited = AppError::RateLimited(wait).into_response();
    for name in [header::RETRY_AFTER, HeaderName::from_static("x-ratelimit-after")] {
        if let Some(value) = response.headers().get(&name) {
            limited.headers_mut().insert(name, value.clone());
        }
    }
    limited
}

/// Wrap `router` in a per-peer-IP limit of `per_minute` requests
fn rate_limited(router: Router<AppState>, per_minute: u32) -> Router<AppState> {
    let per_minute = per_minute.max(1);
    let config = GovernorConfigBuilder::default()
        .per_millisecond(60_000 / u64::from(per_minute))
        .burst_size(per_minute)
        .finish();

    match config {
        // One config per route, built once at startup
        Some(config) => router
            .route_layer(GovernorLayer {
                config: Box::leak(Box::new(config)),
            })
            .route_layer(middleware::map_response(rate_limit_response)),
        None => {
            tracing::warn!(per_minute, "Invalid rate limit, route left unlimited");
            router
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let limits = state.config.rate_limit.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut book_listing = Router::new().route("/books", get(books::list_books));
    let mut recommendation = Router::new().route("/books/recommend", get(books::recommend_books));
    if limits.enabled {
        book_listing = rate_limited(book_listing, limits.books_per_minute);
        recommendation = rate_limited(recommendation, limits.recommend_per_minute);
    }

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .merge(book_listing)
        .merge(recommendation)
        // Books
        .route("/books", post(books::create_book))
        .route("/books/all", get(books::list_all_books))
        .route("/books/export", get(books::export_books))
        .route("/books/import", post(books::import_books))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Users
        .route("/users", get(users::list_users))
        .route("/users/make-me-superuser", patch(users::make_me_superuser))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/jwt/login", post(auth::login))
        .route("/auth/me", get(auth::me));

    Router::new()
        .nest("/api/v1", api_v1)
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
