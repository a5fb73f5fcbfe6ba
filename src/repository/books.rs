//! Book domain methods on Repository

use sqlx::{PgConnection, Postgres, QueryBuilder};

use super::Repository;
use crate::{
    error::AppResult,
    models::book::{BookFilter, BookListing, BookOut, NewBook, UpdateBook},
};

const SELECT_BOOKS: &str = r#"
    SELECT b.id, b.title, b.genre, b.published_year, b.author_id, a.name AS author_name
    FROM books b
    JOIN authors a ON a.id = b.author_id
"#;

/// Rows per INSERT statement; keeps bind count well below the Postgres limit
const INSERT_CHUNK_SIZE: usize = 1000;

/// Escape LIKE metacharacters so user input matches literally
fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    qb.push(" WHERE 1=1");

    if let Some(ref title) = filter.title {
        qb.push(" AND b.title ILIKE ")
            .push_bind(format!("%{}%", escape_like(title)));
    }
    if let Some(genre) = filter.genre {
        qb.push(" AND b.genre = ").push_bind(genre);
    }
    if let Some(author_id) = filter.author_id {
        qb.push(" AND b.author_id = ").push_bind(author_id);
    }
    if let Some(year_from) = filter.year_from {
        qb.push(" AND b.published_year >= ").push_bind(year_from);
    }
    if let Some(year_to) = filter.year_to {
        qb.push(" AND b.published_year <= ").push_bind(year_to);
    }
    if let Some(exclude_id) = filter.exclude_id {
        qb.push(" AND b.id <> ").push_bind(exclude_id);
    }
}

impl Repository {
    /// Filtered, sorted page of books. Ties and unsorted listings fall back
    /// to id order so pages are stable.
    pub async fn books_list(
        &self,
        conn: &mut PgConnection,
        listing: &BookListing,
    ) -> AppResult<Vec<BookOut>> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_BOOKS);
        push_filter(&mut qb, &listing.filter);

        qb.push(" ORDER BY ");
        if let Some(sort) = listing.sort {
            qb.push(sort.column()).push(", ");
        }
        qb.push("b.id");

        qb.push(" LIMIT ").push_bind(listing.limit);
        qb.push(" OFFSET ").push_bind(listing.skip);

        let books = qb.build_query_as::<BookOut>().fetch_all(&mut *conn).await?;
        Ok(books)
    }

    /// Every book matching the filter, in id order
    pub async fn books_filter(
        &self,
        conn: &mut PgConnection,
        filter: &BookFilter,
    ) -> AppResult<Vec<BookOut>> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_BOOKS);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY b.id");

        let books = qb.build_query_as::<BookOut>().fetch_all(&mut *conn).await?;
        Ok(books)
    }

    /// Get book by ID
    pub async fn books_get(&self, conn: &mut PgConnection, id: i32) -> AppResult<Option<BookOut>> {
        let book = sqlx::query_as::<_, BookOut>(&format!("{} WHERE b.id = $1", SELECT_BOOKS))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(book)
    }

    /// Insert a book and return it joined with its author
    pub async fn books_create(&self, conn: &mut PgConnection, book: &NewBook) -> AppResult<BookOut> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, published_year, genre, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(book.published_year)
        .bind(book.genre)
        .bind(book.author_id)
        .fetch_one(&mut *conn)
        .await?;

        let created = sqlx::query_as::<_, BookOut>(&format!("{} WHERE b.id = $1", SELECT_BOOKS))
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(created)
    }

    /// Apply a partial update. Returns `None` when the book does not exist.
    pub async fn books_update(
        &self,
        conn: &mut PgConnection,
        id: i32,
        patch: &UpdateBook,
    ) -> AppResult<Option<BookOut>> {
        let updated = sqlx::query(
            r#"
            UPDATE books SET
                title = COALESCE($1, title),
                published_year = COALESCE($2, published_year),
                genre = COALESCE($3, genre),
                author_id = COALESCE($4, author_id)
            WHERE id = $5
            "#,
        )
        .bind(&patch.title)
        .bind(patch.published_year)
        .bind(patch.genre)
        .bind(patch.author_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.books_get(conn, id).await
    }

    /// Delete a book. Returns whether a row was removed.
    pub async fn books_delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert a batch of books; returns the number of inserted rows
    pub async fn books_insert_many(&self, conn: &mut PgConnection, books: &[NewBook]) -> AppResult<u64> {
        let mut inserted = 0;

        for chunk in books.chunks(INSERT_CHUNK_SIZE) {
            let mut qb = QueryBuilder::<Postgres>::new(
                "INSERT INTO books (title, published_year, genre, author_id) ",
            );
            qb.push_values(chunk, |mut row, book| {
                row.push_bind(book.title.clone())
                    .push_bind(book.published_year)
                    .push_bind(book.genre)
                    .push_bind(book.author_id);
            });

            let result = qb.build().execute(&mut *conn).await?;
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }
}
