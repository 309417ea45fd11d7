//! Search controller: debounced query evaluation with out-of-order response
//! suppression.
//!
//! Typing goes through [`SearchController::on_input_change`], which updates
//! the input right away and evaluates it once typing pauses. Picking a
//! suggested term goes through [`SearchController::set_query_immediate`].
//! Both end up in [`SearchController::evaluate`]. Responses are applied only
//! if they answer the query that is in the input when they arrive.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{
    error::{AppError, AppResult},
    models::{Book, LibraryState},
    remote::{RemoteLibrary, SearchResponse},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Text currently in the search field
    pub input_query: String,
    /// Query `results` answer. Always updated together with `results`.
    pub results_query: String,
    pub results: Vec<Book>,
    pub loading: bool,
    pub error: Option<String>,
}

pub fn normalize_query(raw: &str) -> &str {
    raw.trim()
}

struct Inner {
    remote: Arc<dyn RemoteLibrary>,
    state: watch::Sender<SearchState>,
    debounce: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct SearchController {
    inner: Arc<Inner>,
}

impl SearchController {
    pub fn new(remote: Arc<dyn RemoteLibrary>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            inner: Arc::new(Inner {
                remote,
                state,
                debounce,
                timer: Mutex::new(None),
            }),
        }
    }

    pub fn snapshot(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&SearchState) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    /// Drop the pending debounced evaluation, if any
    fn cancel_timer(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        let mut timer = self.inner.timer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = timer.take() {
            handle.abort();
        }
        timer
    }

    /// User typing. The input is updated immediately; evaluation happens
    /// after the debounce delay unless more input arrives first. Must be
    /// called within a tokio runtime.
    pub fn on_input_change(&self, text: &str) {
        self.inner
            .state
            .send_modify(|state| state.input_query = text.to_string());

        let mut timer = self.cancel_timer();
        let controller = self.clone();
        let text = text.to_string();
        let delay = self.inner.debounce;
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.evaluate(&text);
        }));
    }

    /// Clear the search field
    pub fn clear(&self) {
        tracing::debug!("Clear input");
        self.on_input_change("");
    }

    /// Programmatic query selection, evaluated without debounce
    pub fn set_query_immediate(&self, raw_query: &str) -> Option<JoinHandle<()>> {
        drop(self.cancel_timer());
        self.inner
            .state
            .send_modify(|state| state.input_query = raw_query.to_string());
        self.evaluate(raw_query)
    }

    /// Bring the results in line with `raw_query`. Returns the handle of the
    /// search request when one was dispatched.
    pub fn evaluate(&self, raw_query: &str) -> Option<JoinHandle<()>> {
        let query = normalize_query(raw_query).to_string();
        let mut dispatch = false;

        self.inner.state.send_if_modified(|state| {
            if query == state.results_query {
                // The results already answer this query. A request still in
                // flight is for another query and will be discarded, so it
                // must not keep the loading flag up.
                if state.loading {
                    state.loading = false;
                    return true;
                }
                return false;
            }

            if query.is_empty() {
                state.results.clear();
                state.results_query.clear();
                state.loading = false;
            } else {
                state.loading = true;
                dispatch = true;
            }
            true
        });

        if !dispatch {
            return None;
        }

        tracing::debug!("Searching for {:?}", query);
        let controller = self.clone();
        Some(tokio::spawn(async move {
            let response = controller.inner.remote.search(&query).await;
            controller.receive_results(response, &query);
        }))
    }

    /// Apply the answer to `query`, unless the input moved on meanwhile
    pub fn receive_results(&self, response: AppResult<SearchResponse>, query: &str) {
        self.inner.state.send_if_modified(|state| {
            if normalize_query(&state.input_query) != query {
                tracing::debug!("Ignoring results for outdated query {:?}", query);
                return false;
            }

            match response {
                Ok(SearchResponse::Books(books)) => {
                    tracing::debug!("{} results for {:?}", books.len(), query);
                    state.results = books;
                    state.results_query = query.to_string();
                }
                // Queries outside the accepted terms come back as an
                // "empty query" error even though they are not empty
                Ok(response) if response.is_no_match() => {
                    tracing::debug!("No results for {:?}", query);
                    state.results.clear();
                    state.results_query = query.to_string();
                }
                Ok(SearchResponse::Error { error, .. }) => {
                    let error = AppError::Search(error);
                    tracing::error!("{}", error);
                    state.error = Some(error.details());
                }
                Err(e) => {
                    tracing::error!("Search for {:?} failed: {}", query, e);
                    state.error = Some(e.details());
                }
            }
            state.loading = false;
            true
        });
    }

    /// Current results with library books replaced by their library record,
    /// so they show their shelf
    pub fn results_with_shelves(&self, library: &LibraryState) -> Vec<Book> {
        self.with_state(|state| library.merge_results(&state.results))
    }
}
