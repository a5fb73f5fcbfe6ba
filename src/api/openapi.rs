//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, health, users};

/// Registers the `bearer_auth` scheme referenced by protected endpoints
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        version = "1.0.0",
        description = "Books and authors catalog REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Books
        books::list_books,
        books::list_all_books,
        books::recommend_books,
        books::export_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::import_books,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Users
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::make_me_superuser,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Health
        health::health_check,
        health::readiness_check,
    ),
    components(
        schemas(
            // Books
            crate::models::book::BookOut,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::enums::Genre,
            crate::models::import_report::ImportSummary,
            books::ImportUpload,
            // Authors
            crate::models::author::Author,
            crate::models::author::CreateAuthor,
            // Users
            crate::models::user::UserRead,
            crate::models::user::RegisterUser,
            crate::models::user::UpdateUser,
            crate::models::user::LoginRequest,
            crate::models::user::TokenResponse,
            // Common
            crate::api::DetailResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "books", description = "Book catalog, recommendation, import and export"),
        (name = "authors", description = "Author management"),
        (name = "users", description = "User management"),
        (name = "auth", description = "Registration and login"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/books", "/books/recommend", "/books/import", "/authors/{id}", "/auth/jwt/login"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
