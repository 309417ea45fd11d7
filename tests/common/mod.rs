//! Scripted in-memory books API used by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use myreads::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::{Book, ShelfAssignment, ShelfId},
    remote::{RemoteLibrary, SearchResponse, UpdateResponse},
    App,
};

/// Outcome forced on the next shelf update
pub enum UpdateScript {
    Reject(String),
    Fail(String),
    Delay(Duration),
}

#[derive(Default)]
struct ServerState {
    library: HashMap<String, Book>,
    catalog: Vec<Book>,
    fail_get_all: usize,
    get_all_delays: VecDeque<Duration>,
    update_script: VecDeque<UpdateScript>,
    search_delays: HashMap<String, Duration>,
    get_all_calls: usize,
    search_calls: Vec<String>,
}

/// A books server: updates are applied in arrival order, answers can be
/// delayed to arrive out of order
#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub fn new(library: Vec<Book>, catalog: Vec<Book>) -> Self {
        let server = Self::default();
        {
            let mut state = server.state.lock().unwrap();
            state.library = library.into_iter().map(|b| (b.id.clone(), b)).collect();
            state.catalog = catalog;
        }
        server
    }

    /// An edit made from another device or tab
    pub fn external_move(&self, book: &Book, shelf: ShelfId) {
        let mut state = self.state.lock().unwrap();
        apply(&mut state.library, book, shelf);
    }

    pub fn script_update(&self, script: UpdateScript) {
        self.state.lock().unwrap().update_script.push_back(script);
    }

    pub fn fail_next_get_all(&self) {
        self.state.lock().unwrap().fail_get_all += 1;
    }

    /// The next listing is taken when the request arrives but answered late
    pub fn delay_next_get_all(&self, delay: Duration) {
        self.state.lock().unwrap().get_all_delays.push_back(delay);
    }

    pub fn delay_search(&self, query: &str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .search_delays
            .insert(query.to_string(), delay);
    }

    pub fn shelf_of(&self, id: &str) -> ShelfId {
        self.state
            .lock()
            .unwrap()
            .library
            .get(id)
            .map(Book::shelf)
            .unwrap_or(ShelfId::None)
    }

    pub fn get_all_calls(&self) -> usize {
        self.state.lock().unwrap().get_all_calls
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().search_calls.clone()
    }

    fn assignment(library: &HashMap<String, Book>) -> ShelfAssignment {
        ShelfId::IN_DISPLAY_ORDER
            .iter()
            .map(|shelf| {
                let ids: Vec<String> = library
                    .values()
                    .filter(|b| b.shelf() == *shelf)
                    .map(|b| b.id.clone())
                    .collect();
                (shelf.as_str(), ids)
            })
            .collect()
    }
}

fn apply(library: &mut HashMap<String, Book>, book: &Book, shelf: ShelfId) {
    if shelf.is_none() {
        library.remove(&book.id);
    } else {
        library.insert(book.id.clone(), book.clone().with_shelf(shelf));
    }
}

fn unavailable() -> AppError {
    AppError::UnexpectedStatus {
        status: 503,
        message: "Service Unavailable".to_string(),
    }
}

#[async_trait]
impl RemoteLibrary for FakeServer {
    async fn get_all(&self) -> AppResult<Vec<Book>> {
        let (delay, response) = {
            let mut state = self.state.lock().unwrap();
            state.get_all_calls += 1;
            let delay = state.get_all_delays.pop_front().unwrap_or_default();
            if state.fail_get_all > 0 {
                state.fail_get_all -= 1;
                (delay, Err(unavailable()))
            } else {
                (delay, Ok(state.library.values().cloned().collect()))
            }
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn update_shelf(&self, book_id: &str, shelf: ShelfId) -> AppResult<UpdateResponse> {
        let (delay, response) = {
            let mut state = self.state.lock().unwrap();
            match state.update_script.pop_front() {
                Some(UpdateScript::Reject(error)) => (Duration::ZERO, Ok(UpdateResponse::Rejected { error })),
                Some(UpdateScript::Fail(_)) => (Duration::ZERO, Err(unavailable())),
                script => {
                    let delay = match script {
                        Some(UpdateScript::Delay(delay)) => delay,
                        _ => Duration::ZERO,
                    };
                    let book = state
                        .library
                        .get(book_id)
                        .cloned()
                        .or_else(|| state.catalog.iter().find(|b| b.id == book_id).cloned())
                        .unwrap_or_else(|| Book::new(book_id, ""));
                    apply(&mut state.library, &book, shelf);
                    (delay, Ok(UpdateResponse::Shelves(Self::assignment(&state.library))))
                }
            }
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn search(&self, query: &str) -> AppResult<SearchResponse> {
        let (delay, response) = {
            let mut state = self.state.lock().unwrap();
            state.search_calls.push(query.to_string());
            let needle = query.to_lowercase();
            let found: Vec<Book> = state
                .catalog
                .iter()
                .filter(|b| b.title.to_lowercase().contains(&needle))
                .map(|b| Book {
                    shelf: None,
                    ..b.clone()
                })
                .collect();
            let response = if found.is_empty() {
                SearchResponse::error("empty query")
            } else {
                SearchResponse::Books(found)
            };
            (state.search_delays.get(query).copied().unwrap_or_default(), response)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(response)
    }
}

pub fn book(id: &str, title: &str, shelf: ShelfId) -> Book {
    Book::new(id, title).with_shelf(shelf)
}

pub fn library() -> Vec<Book> {
    vec![
        book("rust", "The Rust Programming Language", ShelfId::Reading),
        book("sicp", "Structure and Interpretation of Computer Programs", ShelfId::Read),
        book("taocp", "The Art of Computer Programming", ShelfId::WantToRead),
    ]
}

pub fn catalog() -> Vec<Book> {
    vec![
        book("taocp", "The Art of Computer Programming", ShelfId::None),
        book("war", "The Art of War", ShelfId::None),
        book("cat", "The Cat in the Hat", ShelfId::None),
        book("catch", "Catch-22", ShelfId::None),
    ]
}

/// App wired to `server`, preferences kept in `dir`
pub async fn app(server: &FakeServer, dir: &tempfile::TempDir) -> App {
    let mut config = AppConfig::default();
    config.preferences.path = dir.path().join("preferences.json");
    App::with_remote(config, Arc::new(server.clone())).await
}
