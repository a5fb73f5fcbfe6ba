//! Book model, request bodies and query parameters

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::Genre;
use crate::error::{AppError, AppResult};

/// Earliest publication year accepted on write
pub const MIN_PUBLISHED_YEAR: i32 = 1800;

pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// Check a publication year against `[MIN_PUBLISHED_YEAR, current year]`
pub fn check_published_year(year: i32) -> Result<(), String> {
    let max = current_year();
    if (MIN_PUBLISHED_YEAR..=max).contains(&year) {
        Ok(())
    } else {
        Err(format!(
            "published_year must be between {} and {}, got {}",
            MIN_PUBLISHED_YEAR, max, year
        ))
    }
}

/// Book joined with its author's name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookOut {
    pub id: i32,
    pub title: String,
    pub genre: Genre,
    pub published_year: i32,
    pub author_id: i32,
    pub author_name: String,
}

/// A book ready to be written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub published_year: i32,
    pub genre: Genre,
    pub author_id: i32,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(range(min = 1800, message = "published_year must be 1800 or later"))]
    pub published_year: i32,
    pub genre: Genre,
    pub author_id: i32,
}

impl CreateBook {
    /// Validate and convert into a storable book
    pub fn into_new_book(self) -> AppResult<NewBook> {
        self.validate()?;
        check_published_year(self.published_year).map_err(AppError::Validation)?;

        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title must not be blank".to_string()));
        }

        Ok(NewBook {
            title: title.to_string(),
            published_year: self.published_year,
            genre: self.genre,
            author_id: self.author_id,
        })
    }
}

/// Partial book update; only supplied fields change
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub published_year: Option<i32>,
    pub genre: Option<Genre>,
    pub author_id: Option<i32>,
}

impl UpdateBook {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.published_year.is_none()
            && self.genre.is_none()
            && self.author_id.is_none()
    }

    /// Validate supplied fields, trimming the title in place
    pub fn normalize(mut self) -> AppResult<Self> {
        if let Some(title) = self.title.take() {
            let title = title.trim();
            if title.is_empty() {
                return Err(AppError::Validation("Title must not be blank".to_string()));
            }
            self.title = Some(title.to_string());
        }
        if let Some(year) = self.published_year {
            check_published_year(year).map_err(AppError::Validation)?;
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Query engine inputs
// ---------------------------------------------------------------------------

/// Columns a book listing may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    PublishedYear,
    AuthorId,
}

impl SortKey {
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::Title => "b.title",
            SortKey::PublishedYear => "b.published_year",
            SortKey::AuthorId => "b.author_id",
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(SortKey::Title),
            "published_year" => Ok(SortKey::PublishedYear),
            "author_id" => Ok(SortKey::AuthorId),
            _ => Err(format!(
                "Invalid sort_by: {} (expected one of title, published_year, author_id)",
                s
            )),
        }
    }
}

/// Predicates shared by listing and recommendation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub title: Option<String>,
    pub genre: Option<Genre>,
    pub author_id: Option<i32>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub exclude_id: Option<i32>,
}

/// Book listing query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive title substring
    pub title: Option<String>,
    /// Exact genre literal
    pub genre: Option<String>,
    pub author_id: Option<i32>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    /// One of `title`, `published_year`, `author_id`
    pub sort_by: Option<String>,
    /// Number of rows to skip (default 0)
    pub skip: Option<i64>,
    /// Maximum number of rows (default 10)
    pub limit: Option<i64>,
}

pub const DEFAULT_LIMIT: i64 = 10;

/// Validated form of [`BookQuery`]
#[derive(Debug, Clone, PartialEq)]
pub struct BookListing {
    pub filter: BookFilter,
    pub sort: Option<SortKey>,
    pub skip: i64,
    pub limit: i64,
}

impl TryFrom<BookQuery> for BookListing {
    type Error = AppError;

    fn try_from(query: BookQuery) -> AppResult<Self> {
        let genre = query
            .genre
            .as_deref()
            .map(str::parse::<Genre>)
            .transpose()
            .map_err(AppError::Validation)?;
        let sort = query
            .sort_by
            .as_deref()
            .map(str::parse::<SortKey>)
            .transpose()
            .map_err(AppError::Validation)?;

        let skip = query.skip.unwrap_or(0);
        if skip < 0 {
            return Err(AppError::Validation("skip must be >= 0".to_string()));
        }
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        if limit <= 0 {
            return Err(AppError::Validation("limit must be > 0".to_string()));
        }

        Ok(Self {
            filter: BookFilter {
                title: query.title.filter(|t| !t.is_empty()),
                genre,
                author_id: query.author_id,
                year_from: query.year_from,
                year_to: query.year_to,
                exclude_id: None,
            },
            sort,
            skip,
            limit,
        })
    }
}

/// Recommendation query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct RecommendQuery {
    /// Genre, matched case-insensitively
    pub genre: Option<String>,
    pub author_id: Option<i32>,
    /// Book id that must not be recommended
    pub exclude_id: Option<i32>,
}

impl TryFrom<RecommendQuery> for BookFilter {
    type Error = AppError;

    fn try_from(query: RecommendQuery) -> AppResult<Self> {
        let genre = query
            .genre
            .as_deref()
            .filter(|g| !g.is_empty())
            .map(Genre::parse_normalized)
            .transpose()
            .map_err(AppError::Validation)?;

        Ok(BookFilter {
            genre,
            author_id: query.author_id,
            exclude_id: query.exclude_id,
            ..Default::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(format!("Invalid export format: {} (expected json or csv)", s)),
        }
    }
}

/// Export query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ExportQuery {
    /// `json` (default) or `csv`
    pub format: Option<String>,
}
