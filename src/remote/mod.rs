//! Remote books API: the collaborator trait and its response shapes

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{Book, ShelfAssignment, ShelfId},
};

pub use http::BooksApiClient;

/// Answer to a shelf update. The API is not documented to return an error
/// payload here, but it can.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdateResponse {
    Rejected { error: String },
    Shelves(ShelfAssignment),
}

/// Answer to a search. Queries outside the accepted term set come back as
/// an error payload mentioning "empty query".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Books(Vec<Book>),
    Error {
        error: String,
        #[serde(default, skip_serializing)]
        items: Vec<Book>,
    },
}

impl SearchResponse {
    pub fn error(message: impl Into<String>) -> Self {
        SearchResponse::Error {
            error: message.into(),
            items: Vec::new(),
        }
    }

    /// The "no matching term" signal, which is not a failure
    pub fn is_no_match(&self) -> bool {
        matches!(self, SearchResponse::Error { error, .. } if error.contains("empty query"))
    }
}

/// Access to the user's library and the book catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteLibrary: Send + Sync {
    /// Every book on one of the user's shelves
    async fn get_all(&self) -> AppResult<Vec<Book>>;

    /// Move, add or remove a book. On success the full shelf assignment
    /// of the library is returned.
    async fn update_shelf(&self, book_id: &str, shelf: ShelfId) -> AppResult<UpdateResponse>;

    /// Search the catalog. Never called with an empty query.
    async fn search(&self, query: &str) -> AppResult<SearchResponse>;
}
