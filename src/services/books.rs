//! Book catalog service: listing, recommendation, CRUD and export

use rand::{seq::SliceRandom, Rng};

use crate::{
    error::{AppError, AppResult},
    models::book::{
        BookFilter, BookListing, BookOut, BookQuery, CreateBook, ExportFormat, RecommendQuery,
        UpdateBook,
    },
    repository::Repository,
};

/// Maximum number of books returned by a recommendation
pub const RECOMMENDATION_SIZE: usize = 5;

/// Column order of CSV exports; also written when there are no books
pub const EXPORT_COLUMNS: [&str; 6] = [
    "id",
    "title",
    "genre",
    "published_year",
    "author_id",
    "author_name",
];

/// Serialized export payload
#[derive(Debug)]
pub enum Export {
    Json(Vec<BookOut>),
    Csv(String),
}

/// Uniform sample of at most `amount` books, without replacement
pub fn sample_books<R: Rng + ?Sized>(books: &[BookOut], amount: usize, rng: &mut R) -> Vec<BookOut> {
    books.choose_multiple(rng, amount).cloned().collect()
}

/// Render books as CSV with a fixed header row
pub fn books_to_csv(books: &[BookOut]) -> AppResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    let to_internal = |e: csv::Error| AppError::Internal(format!("CSV export failed: {}", e));

    writer.write_record(EXPORT_COLUMNS).map_err(to_internal)?;
    for book in books {
        writer.serialize(book).map_err(to_internal)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Filtered, sorted, paginated listing
    pub async fn list_books(&self, query: BookQuery) -> AppResult<Vec<BookOut>> {
        let listing = BookListing::try_from(query)?;

        if let (Some(from), Some(to)) = (listing.filter.year_from, listing.filter.year_to) {
            if from > to {
                return Ok(Vec::new());
            }
        }

        let mut tx = self.repository.begin().await?;
        let books = self.repository.books_list(&mut tx, &listing).await?;
        tx.commit().await?;
        Ok(books)
    }

    /// Every book, unpaginated
    pub async fn all_books(&self) -> AppResult<Vec<BookOut>> {
        let mut tx = self.repository.begin().await?;
        let books = self
            .repository
            .books_filter(&mut tx, &BookFilter::default())
            .await?;
        tx.commit().await?;
        Ok(books)
    }

    /// Up to [`RECOMMENDATION_SIZE`] random books matching the filters
    pub async fn recommend(&self, query: RecommendQuery) -> AppResult<Vec<BookOut>> {
        let filter = BookFilter::try_from(query)?;

        let mut tx = self.repository.begin().await?;
        let candidates = self.repository.books_filter(&mut tx, &filter).await?;
        tx.commit().await?;

        Ok(sample_books(&candidates, RECOMMENDATION_SIZE, &mut rand::thread_rng()))
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<BookOut> {
        let mut tx = self.repository.begin().await?;
        let book = self.repository.books_get(&mut tx, id).await?;
        tx.commit().await?;
        book.ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Create a book for an existing author
    pub async fn create_book(&self, data: CreateBook) -> AppResult<BookOut> {
        let book = data.into_new_book()?;

        let mut tx = self.repository.begin().await?;
        if self.repository.authors_get(&mut tx, book.author_id).await?.is_none() {
            return Err(AppError::BadRequest("Author does not exist".to_string()));
        }
        let created = self.repository.books_create(&mut tx, &book).await?;
        tx.commit().await?;

        tracing::info!(book_id = created.id, author_id = created.author_id, "Book created");
        Ok(created)
    }

    /// Apply a partial update
    pub async fn update_book(&self, id: i32, patch: UpdateBook) -> AppResult<BookOut> {
        let mut tx = self.repository.begin().await?;

        if self.repository.books_get(&mut tx, id).await?.is_none() {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        if patch.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        let patch = patch.normalize()?;

        if let Some(author_id) = patch.author_id {
            if self.repository.authors_get(&mut tx, author_id).await?.is_none() {
                return Err(AppError::BadRequest("Author does not exist".to_string()));
            }
        }

        let updated = self
            .repository
            .books_update(&mut tx, id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a book
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        if !self.repository.books_delete(&mut tx, id).await? {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        tx.commit().await?;

        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    /// Serialize the whole catalog
    pub async fn export_books(&self, format: Option<&str>) -> AppResult<Export> {
        let format = format
            .unwrap_or("json")
            .parse::<ExportFormat>()
            .map_err(AppError::Validation)?;

        let books = self.all_books().await?;
        match format {
            ExportFormat::Json => Ok(Export::Json(books)),
            ExportFormat::Csv => books_to_csv(&books).map(Export::Csv),
        }
    }
}
