//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{Multipart, WithRejection};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookOut, BookQuery, CreateBook, ExportQuery, RecommendQuery, UpdateBook},
        import_report::{ImportFormat, ImportSummary},
    },
    services::books::Export,
    AppState,
};

use super::{AuthenticatedUser, DetailResponse};

/// Multipart form accepted by the import endpoint
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImportUpload {
    /// A `.json` array of books or a `.csv` file with a header row
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// List books with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Matching books", body = Vec<BookOut>),
        (status = 422, description = "Invalid query parameter"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<BookQuery>, AppError>,
) -> AppResult<Json<Vec<BookOut>>> {
    let books = state.services.books.list_books(query).await?;
    Ok(Json(books))
}

/// List every book, unpaginated
#[utoipa::path(
    get,
    path = "/books/all",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<BookOut>)
    )
)]
pub async fn list_all_books(State(state): State<AppState>) -> AppResult<Json<Vec<BookOut>>> {
    let books = state.services.books.all_books().await?;
    Ok(Json(books))
}

/// Recommend up to five random books matching the filters
#[utoipa::path(
    get,
    path = "/books/recommend",
    tag = "books",
    params(RecommendQuery),
    responses(
        (status = 200, description = "Recommended books", body = Vec<BookOut>),
        (status = 422, description = "Invalid genre"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn recommend_books(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<RecommendQuery>, AppError>,
) -> AppResult<Json<Vec<BookOut>>> {
    let books = state.services.books.recommend(query).await?;
    Ok(Json(books))
}

/// Export the catalog as JSON or CSV
#[utoipa::path(
    get,
    path = "/books/export",
    tag = "books",
    params(ExportQuery),
    responses(
        (status = 200, description = "JSON array or CSV document", body = Vec<BookOut>),
        (status = 422, description = "Unknown export format")
    )
)]
pub async fn export_books(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ExportQuery>, AppError>,
) -> AppResult<Response> {
    let export = state.services.books.export_books(query.format.as_deref()).await?;

    Ok(match export {
        Export::Json(books) => Json(books).into_response(),
        Export::Csv(body) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"books.csv\""),
            ],
            body,
        )
            .into_response(),
    })
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookOut),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<BookOut>> {
    let book = state.services.books.get_book(id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookOut),
        (status = 400, description = "Author does not exist"),
        (status = 401, description = "Not authenticated"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    WithRejection(Json(data), _): WithRejection<Json<CreateBook>, AppError>,
) -> AppResult<(StatusCode, Json<BookOut>)> {
    let created = state.services.books.create_book(data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookOut),
        (status = 400, description = "Empty patch or unknown author"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
    WithRejection(Json(patch), _): WithRejection<Json<UpdateBook>, AppError>,
) -> AppResult<Json<BookOut>> {
    let updated = state.services.books.update_book(id, patch).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = DetailResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<i32>, AppError>,
) -> AppResult<Json<DetailResponse>> {
    state.services.books.delete_book(id).await?;
    Ok(Json(DetailResponse::new(format!("Book {} deleted successfully", id))))
}

/// Bulk import books from an uploaded `.json` or `.csv` file
#[utoipa::path(
    post,
    path = "/books/import",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body(content = ImportUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import summary", body = ImportSummary),
        (status = 400, description = "Missing file, unsupported or unparseable format"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn import_books(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    mut multipart: Multipart,
) -> AppResult<Json<ImportSummary>> {
    let upload_error = |e: axum_extra::extract::multipart::MultipartError| {
        AppError::BadRequest(format!("Invalid upload: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let format = ImportFormat::from_filename(&filename)
            .ok_or_else(|| AppError::BadRequest("Unsupported file format".to_string()))?;
        let payload = field.bytes().await.map_err(upload_error)?;

        tracing::info!(user_id = user.id, file = %filename, size = payload.len(), "Book import requested");
        let summary = state.services.import.import_books(&payload, format).await?;
        return Ok(Json(summary));
    }

    Err(AppError::BadRequest("Missing file field".to_string()))
}
