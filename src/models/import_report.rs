//! Bulk import formats and result report

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Declared format of an uploaded import file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

impl ImportFormat {
    /// Resolve the format from a file name's extension, case-insensitively
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(ImportFormat::Json),
            "csv" => Some(ImportFormat::Csv),
            _ => None,
        }
    }
}

/// Report returned by the import endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    /// Number of books actually inserted
    pub imported: usize,
    pub detail: String,
}

impl ImportSummary {
    pub fn new(imported: usize) -> Self {
        Self {
            imported,
            detail: format!("Imported {} books", imported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(ImportFormat::from_filename("books.json"), Some(ImportFormat::Json));
        assert_eq!(ImportFormat::from_filename("Books.CSV"), Some(ImportFormat::Csv));
        assert_eq!(ImportFormat::from_filename("archive.tar.csv"), Some(ImportFormat::Csv));
        assert_eq!(ImportFormat::from_filename("books.xlsx"), None);
        assert_eq!(ImportFormat::from_filename("books"), None);
    }
}
