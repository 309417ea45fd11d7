//! Data models for MyReads

pub mod book;
pub mod library;
pub mod search_terms;
pub mod shelf;

// Re-export commonly used types
pub use book::{Book, ImageLinks};
pub use library::{Consistency, LibraryState, Revert, ShelfAssignment, ShelfMove};
pub use search_terms::SEARCH_TERMS;
pub use shelf::ShelfId;
