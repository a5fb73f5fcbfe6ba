//! Bulk book import
//!
//! An upload goes through three stages:
//!
//! 1. [`parse_records`] turns the whole payload into raw records. A payload
//!    that cannot be parsed rejects the request.
//! 2. [`convert_record`] turns one raw record into a [`NewBook`]. Failures
//!    here are [`RecordError`]s: the record is skipped and the batch goes on.
//! 3. The surviving books whose author exists are inserted in a single
//!    transaction.

use std::collections::{BTreeSet, HashSet};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{check_published_year, NewBook},
        import_report::{ImportFormat, ImportSummary},
        Genre,
    },
    repository::Repository,
};

/// Why a single import record was dropped
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("record is not an object")]
    NotAnObject,
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("field {0} must be a string")]
    NotAString(&'static str),
    #[error("title is blank")]
    BlankTitle,
    #[error("invalid genre: {0}")]
    InvalidGenre(String),
    #[error("field {0} is not an integer: {1}")]
    NotAnInteger(&'static str, String),
    #[error("{0}")]
    YearOutOfRange(String),
    #[error("author {0} does not exist")]
    UnknownAuthor(i32),
}

fn invalid_format(reason: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("Invalid file format: {}", reason))
}

/// Parse an uploaded payload into raw records
pub fn parse_records(payload: &[u8], format: ImportFormat) -> AppResult<Vec<Value>> {
    let text = std::str::from_utf8(payload).map_err(invalid_format)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    match format {
        ImportFormat::Json => match serde_json::from_str::<Value>(text).map_err(invalid_format)? {
            Value::Array(records) => Ok(records),
            _ => Err(invalid_format("expected a JSON array of records")),
        },
        ImportFormat::Csv => {
            // Short rows leave fields missing, which fails only that record.
            let mut reader = csv::ReaderBuilder::new()
                .flexible(true)
                .from_reader(text.as_bytes());
            let headers = reader.headers().map_err(invalid_format)?.clone();

            let mut records = Vec::new();
            for row in reader.records() {
                let row = row.map_err(invalid_format)?;
                let record: Map<String, Value> = headers
                    .iter()
                    .zip(row.iter())
                    .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                    .collect();
                records.push(Value::Object(record));
            }
            Ok(records)
        }
    }
}

fn string_field<'a>(record: &'a Map<String, Value>, name: &'static str) -> Result<&'a str, RecordError> {
    record
        .get(name)
        .ok_or(RecordError::MissingField(name))?
        .as_str()
        .ok_or(RecordError::NotAString(name))
}

/// Integers are accepted as JSON numbers or as numeric strings (CSV cells)
fn int_field(record: &Map<String, Value>, name: &'static str) -> Result<i32, RecordError> {
    let value = record.get(name).ok_or(RecordError::MissingField(name))?;
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| RecordError::NotAnInteger(name, value.to_string()))
}

/// Convert one raw record into a storable book
pub fn convert_record(record: &Value) -> Result<NewBook, RecordError> {
    let record = record.as_object().ok_or(RecordError::NotAnObject)?;

    let title = string_field(record, "title")?.trim();
    if title.is_empty() {
        return Err(RecordError::BlankTitle);
    }

    let genre_raw = string_field(record, "genre")?;
    let genre = genre_raw
        .parse::<Genre>()
        .map_err(|_| RecordError::InvalidGenre(genre_raw.to_string()))?;

    let published_year = int_field(record, "published_year")?;
    check_published_year(published_year).map_err(RecordError::YearOutOfRange)?;

    let author_id = int_field(record, "author_id")?;

    Ok(NewBook {
        title: title.to_string(),
        published_year,
        genre,
        author_id,
    })
}

/// Convert every record, dropping the malformed ones
pub fn convert_records(records: &[Value]) -> Vec<NewBook> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match convert_record(record) {
            Ok(book) => Some(book),
            Err(error) => {
                tracing::debug!(record = index, %error, "Skipping import record");
                None
            }
        })
        .collect()
}

/// Drop books whose author is not in `known`
fn retain_known_authors(books: &mut Vec<NewBook>, known: &HashSet<i32>) {
    books.retain(|book| {
        let exists = known.contains(&book.author_id);
        if !exists {
            let error = RecordError::UnknownAuthor(book.author_id);
            tracing::debug!(title = %book.title, %error, "Skipping import record");
        }
        exists
    });
}

#[derive(Clone)]
pub struct ImportService {
    repository: Repository,
}

impl ImportService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Import books from an uploaded payload; returns how many were inserted
    pub async fn import_books(&self, payload: &[u8], format: ImportFormat) -> AppResult<ImportSummary> {
        let records = parse_records(payload, format)?;
        let mut books = convert_records(&records);

        let author_ids: Vec<i32> = books
            .iter()
            .map(|b| b.author_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut tx = self.repository.begin().await?;
        let known = self.repository.authors_existing_ids(&mut tx, &author_ids).await?;
        retain_known_authors(&mut books, &known);

        let inserted = self.repository.books_insert_many(&mut tx, &books).await?;
        tx.commit().await?;

        tracing::info!(
            received = records.len(),
            imported = inserted,
            "Book import completed"
        );
        Ok(ImportSummary::new(inserted as usize))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::book::current_year;

    #[test]
    fn test_parse_json_array() {
        let payload = br#"[{"title":"A"},{"title":"B"}]"#;
        let records = parse_records(payload, ImportFormat::Json).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        assert!(matches!(
            parse_records(b"[{\"title\":", ImportFormat::Json),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_records(br#"{"title":"A"}"#, ImportFormat::Json),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_records(&[0xff, 0xfe, 0x00], ImportFormat::Csv),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_parse_csv_rows_keyed_by_header() {
        let payload = b"title,genre,published_year,author_id\nDune,Fiction,1965,1\n\"Cosmos, Revised\",Science,1980,2\n";
        let records = parse_records(payload, ImportFormat::Csv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["title"], "Dune");
        assert_eq!(records[1]["title"], "Cosmos, Revised");
        assert_eq!(records[1]["published_year"], "1980");
    }

    #[test]
    fn test_parse_csv_strips_bom() {
        let payload = "\u{feff}title,genre,published_year,author_id\nDune,Fiction,1965,1\n";
        let records = parse_records(payload.as_bytes(), ImportFormat::Csv).unwrap();
        assert!(convert_record(&records[0]).is_ok());
    }

    #[test]
    fn test_convert_record_from_json_and_csv_values() {
        let from_json = json!({"title": "  A  ", "genre": "Fiction", "published_year": 2000, "author_id": 1});
        let from_csv = json!({"title": "A", "genre": "Fiction", "published_year": " 2000 ", "author_id": "1"});

        let expected = NewBook {
            title: "A".to_string(),
            published_year: 2000,
            genre: Genre::Fiction,
            author_id: 1,
        };
        assert_eq!(convert_record(&from_json), Ok(expected.clone()));
        assert_eq!(convert_record(&from_csv), Ok(expected));
    }

    #[test]
    fn test_convert_record_failures() {
        let cases = [
            (json!("not an object"), RecordError::NotAnObject),
            (
                json!({"genre": "Fiction", "published_year": 2000, "author_id": 1}),
                RecordError::MissingField("title"),
            ),
            (
                json!({"title": 5, "genre": "Fiction", "published_year": 2000, "author_id": 1}),
                RecordError::NotAString("title"),
            ),
            (
                json!({"title": "  ", "genre": "Fiction", "published_year": 2000, "author_id": 1}),
                RecordError::BlankTitle,
            ),
            (
                json!({"title": "A", "genre": "fiction", "published_year": 2000, "author_id": 1}),
                RecordError::InvalidGenre("fiction".to_string()),
            ),
            (
                json!({"title": "A", "genre": "Fiction", "published_year": "soon", "author_id": 1}),
                RecordError::NotAnInteger("published_year", "\"soon\"".to_string()),
            ),
            (
                json!({"title": "A", "genre": "Fiction", "published_year": 2000, "author_id": 1.5}),
                RecordError::NotAnInteger("author_id", "1.5".to_string()),
            ),
        ];

        for (record, expected) in cases {
            assert_eq!(convert_record(&record), Err(expected));
        }

        let too_old = json!({"title": "A", "genre": "Fiction", "published_year": 1500, "author_id": 1});
        assert!(matches!(convert_record(&too_old), Err(RecordError::YearOutOfRange(_))));
        let future = json!({"title": "A", "genre": "Fiction", "published_year": current_year() + 1, "author_id": 1});
        assert!(matches!(convert_record(&future), Err(RecordError::YearOutOfRange(_))));
    }

    #[test]
    fn test_one_good_one_bad_record() {
        let payload = br#"[
            {"title":"A","genre":"Fiction","published_year":2000,"author_id":1},
            {"title":"","genre":"Bogus","published_year":1500,"author_id":1}
        ]"#;
        let records = parse_records(payload, ImportFormat::Json).unwrap();
        let books = convert_records(&records);
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "A");
    }

    #[test]
    fn test_valid_count_independent_of_order() {
        let good = |i: i32| json!({"title": format!("T{}", i), "genre": "History", "published_year": 1950, "author_id": 1});
        let bad = json!({"title": "X", "genre": "Bogus", "published_year": 1950, "author_id": 1});

        let mut records = vec![good(1), bad.clone(), good(2), bad.clone(), good(3), json!(null)];
        assert_eq!(convert_records(&records).len(), 3);
        records.reverse();
        assert_eq!(convert_records(&records).len(), 3);
        records.rotate_left(2);
        assert_eq!(convert_records(&records).len(), 3);
    }

    #[test]
    fn test_csv_short_row_drops_only_that_record() {
        let payload = b"title,genre,published_year,author_id\nDune,Fiction,1965,1\nBroken,Fiction\n";
        let records = parse_records(payload, ImportFormat::Csv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(convert_records(&records).len(), 1);
    }

    #[test]
    fn test_unknown_authors_are_dropped() {
        let book = |title: &str, author_id: i32| NewBook {
            title: title.to_string(),
            published_year: 1990,
            genre: Genre::Science,
            author_id,
        };
        let mut books = vec![book("Kept", 7), book("Orphan", i32::MAX), book("Also kept", 7)];
        let known: HashSet<i32> = [7].into_iter().collect();

        retain_known_authors(&mut books, &known);
        let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Kept", "Also kept"]);

        retain_known_authors(&mut books, &HashSet::new());
        assert!(books.is_empty());
    }
}
