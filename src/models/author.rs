//! Author model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Author record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub name: String,
}

/// Create or rename author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, message = "Author name cannot be empty"))]
    pub name: String,
}

impl CreateAuthor {
    /// Name with surrounding whitespace removed; blank names are rejected
    pub fn normalized_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_rejected() {
        let data = CreateAuthor { name: "   ".to_string() };
        assert!(data.validate().is_ok());
        assert_eq!(data.normalized_name(), None);
    }

    #[test]
    fn test_name_trimmed() {
        let data = CreateAuthor { name: "  Ursula K. Le Guin ".to_string() };
        assert_eq!(data.normalized_name(), Some("Ursula K. Le Guin"));
    }
}
