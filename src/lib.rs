//! MyReads client
//!
//! Keeps a personal book library organized into shelves (currently reading,
//! want to read, read) against a remote books API, and searches the catalog
//! to add books. Shelf moves are applied optimistically and reconciled with
//! the server's answer; searches are debounced and stale answers dropped.
//!
//! [`App`] is the boundary consumed by a presentation layer: read views,
//! actions, and a notification channel.

use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use models::{Book, LibraryState, ShelfId};
use remote::{BooksApiClient, RemoteLibrary};
use services::{LibraryView, Notification, SearchState, Services, Theme};

/// Application state shared with the presentation layer
#[derive(Clone)]
pub struct App {
    pub config: Arc<AppConfig>,
    pub services: Services,
}

impl App {
    /// Build the application around the HTTP books API
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let remote = Arc::new(BooksApiClient::new(&config.api)?);
        Ok(Self::with_remote(config, remote).await)
    }

    pub async fn with_remote(config: AppConfig, remote: Arc<dyn RemoteLibrary>) -> Self {
        let services = Services::new(remote, &config).await;
        Self {
            config: Arc::new(config),
            services,
        }
    }

    /// Initial full fetch of the library
    pub async fn start(&self) {
        self.services.library.fetch_all().await;
    }

    pub fn library(&self) -> LibraryView {
        self.services.library.snapshot()
    }

    pub fn subscribe_library(&self) -> watch::Receiver<LibraryView> {
        self.services.library.subscribe()
    }

    pub fn search(&self) -> SearchState {
        self.services.search.snapshot()
    }

    pub fn subscribe_search(&self) -> watch::Receiver<SearchState> {
        self.services.search.subscribe()
    }

    /// Search results, showing the shelf of books already in the library
    pub fn search_results(&self) -> Vec<Book> {
        self.services
            .library
            .with_view(|view| self.services.search.results_with_shelves(&view.books))
    }

    /// Books grouped by shelf in display order
    pub fn shelves(&self) -> Vec<(ShelfId, Vec<Book>)> {
        self.services.library.with_view(|view| grouped(&view.books))
    }

    /// Transient messages (errors of single actions, resync notices)
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.services.notifier.subscribe()
    }

    /// Fire-and-forget shelf move; local state changes before this returns
    pub fn move_book(&self, book: Book, shelf: ShelfId) -> JoinHandle<()> {
        self.services.library.spawn_move(book, shelf)
    }

    pub async fn fetch_all(&self) {
        self.services.library.fetch_all().await;
    }

    pub fn on_input_change(&self, text: &str) {
        self.services.search.on_input_change(text);
    }

    pub fn set_query_immediate(&self, query: &str) -> Option<JoinHandle<()>> {
        self.services.search.set_query_immediate(query)
    }

    pub fn theme(&self) -> Theme {
        self.services.theme.theme()
    }

    pub async fn set_theme(&self, theme: Theme) -> AppResult<()> {
        self.services.theme.set_theme(theme).await
    }
}

fn grouped(books: &LibraryState) -> Vec<(ShelfId, Vec<Book>)> {
    books
        .by_shelf()
        .into_iter()
        .map(|(shelf, books)| (shelf, books.into_iter().cloned().collect()))
        .collect()
}
