//! libris application library
//!
//! Holds the catalog state manager that presentation layers drive.

pub mod modules;

/// Re-export commonly used types
pub use modules::catalog::{
    Book, BookId, BorrowStatus, Catalog, CatalogSnapshot, SearchMode, UserRecord,
};
