//! Data models for Bookshelf

pub mod author;
pub mod book;
pub mod enums;
pub mod import_report;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{BookFilter, BookOut, NewBook};
pub use enums::Genre;
pub use user::{User, UserRead};
