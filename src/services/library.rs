//! Library store: optimistic shelf moves, reverts, and reconciliation with
//! the server's shelf assignment.
//!
//! Every move is applied locally before the request is sent. The server
//! answers with the shelf assignment of the whole library, which is used to
//! check that the local state did not drift (another tab or device editing
//! the same library). Drift is repaired with a full re-fetch since the API
//! offers neither diffs nor versions.
//!
//! Moves carry sequence numbers. While moves are in flight, confirmations
//! are only recorded; reconciliation runs once no move is pending, against
//! the confirmation of the newest move. A failed move is reverted only if it
//! is the newest move of its book; an older failure instead schedules a full
//! re-fetch for when the store is idle again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{
    error::AppError,
    models::{Book, Consistency, LibraryState, Revert, ShelfAssignment, ShelfId, ShelfMove},
    remote::{RemoteLibrary, UpdateResponse},
    services::notifications::Notifier,
};

const RESYNC_NOTICE: &str = "This page was refreshed because it was detected to be out of sync \
     with the cloud. This happens when you use MyReads from multiple devices or tabs.";
const RESYNC_NOTICE_DURATION: Duration = Duration::from_secs(10);

/// What the presentation layer reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryView {
    pub books: LibraryState,
    pub loading: bool,
    /// Page-level failure of the last full fetch
    pub error: Option<String>,
}

/// A move that has been applied locally but not confirmed yet
#[derive(Debug, Clone)]
pub struct PendingMove {
    book: Book,
    target: ShelfId,
    seq: u64,
    revert: Revert,
}

impl PendingMove {
    pub fn book_id(&self) -> &str {
        &self.book.id
    }

    pub fn target(&self) -> ShelfId {
        self.target
    }
}

#[derive(Default)]
struct MoveTracker {
    issued: u64,
    in_flight: usize,
    latest_for_book: HashMap<String, u64>,
    newest_confirmation: Option<(u64, ShelfAssignment)>,
    needs_resync: bool,
}

/// Work left to do once a move has been settled
enum Followup {
    Nothing,
    Reconcile(ShelfAssignment),
    Refetch,
}

impl MoveTracker {
    fn issue(&mut self, book_id: &str) -> u64 {
        self.issued += 1;
        self.in_flight += 1;
        self.latest_for_book.insert(book_id.to_string(), self.issued);
        self.issued
    }

    /// Returns whether `seq` was the newest move of its book
    fn settle(&mut self, book_id: &str, seq: u64, confirmation: Option<ShelfAssignment>) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);

        if let Some(snapshot) = confirmation {
            let newer = match &self.newest_confirmation {
                Some((newest, _)) => seq > *newest,
                None => true,
            };
            if newer {
                self.newest_confirmation = Some((seq, snapshot));
            }
        }

        let latest = self.latest_for_book.get(book_id) == Some(&seq);
        if latest {
            self.latest_for_book.remove(book_id);
        }
        latest
    }

    fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    fn followup(&mut self) -> Followup {
        if !self.is_idle() {
            return Followup::Nothing;
        }
        let confirmation = self.newest_confirmation.take();
        if std::mem::take(&mut self.needs_resync) {
            return Followup::Refetch;
        }
        match confirmation {
            Some((_, snapshot)) => Followup::Reconcile(snapshot),
            None => Followup::Nothing,
        }
    }
}

struct Inner {
    remote: Arc<dyn RemoteLibrary>,
    notifier: Notifier,
    state: watch::Sender<LibraryView>,
    moves: Mutex<MoveTracker>,
    fetch_generation: Mutex<u64>,
}

#[derive(Clone)]
pub struct LibraryStore {
    inner: Arc<Inner>,
}

impl LibraryStore {
    pub fn new(remote: Arc<dyn RemoteLibrary>, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(LibraryView::default());
        Self {
            inner: Arc::new(Inner {
                remote,
                notifier,
                state,
                moves: Mutex::new(MoveTracker::default()),
                fetch_generation: Mutex::new(0),
            }),
        }
    }

    /// Current view, cloned
    pub fn snapshot(&self) -> LibraryView {
        self.inner.state.borrow().clone()
    }

    /// Read the current view without cloning it
    pub fn with_view<R>(&self, f: impl FnOnce(&LibraryView) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Change notifications for the presentation layer
    pub fn subscribe(&self) -> watch::Receiver<LibraryView> {
        self.inner.state.subscribe()
    }

    fn moves(&self) -> MutexGuard<'_, MoveTracker> {
        self.inner.moves.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply a move locally and register it as pending.
    ///
    /// The book's current shelf is taken from the store; whatever shelf the
    /// caller's `book` carries is ignored. The rest of its fields are used
    /// when the book is added or moved.
    pub fn begin_move(&self, book: &Book, target: ShelfId) -> PendingMove {
        tracing::info!("Moving book \"{}\" to shelf {}", book.title, target);

        let mut moves = self.moves();
        let seq = moves.issue(&book.id);

        // stays the no-op move unless the closure applies a real one
        let mut outcome = ShelfMove::unchanged(book, target);
        self.inner.state.send_if_modified(|view| {
            outcome = view.books.apply_move(book, target);
            outcome.changed
        });
        drop(moves);

        tracing::debug!(
            "Optimistic update completed: book={:?} from={} to={} changed={}",
            book.title,
            outcome.from,
            outcome.to,
            outcome.changed
        );

        PendingMove {
            book: book.clone(),
            target,
            seq,
            revert: outcome.revert,
        }
    }

    /// Send a pending move to the server and settle it
    pub async fn complete_move(&self, pending: PendingMove) {
        let result = self
            .inner
            .remote
            .update_shelf(pending.book_id(), pending.target)
            .await;

        let (confirmation, failure) = match result {
            Ok(UpdateResponse::Shelves(snapshot)) => {
                tracing::info!("Book {} updated server-side", pending.book_id());
                (Some(snapshot), None)
            }
            Ok(UpdateResponse::Rejected { error }) => {
                let e = AppError::Rejected(error);
                tracing::warn!("Move of book {} failed: {}", pending.book_id(), e);
                let message = format!(
                    "Your last operation was rejected by the server. Details: \"{}\"",
                    e.details()
                );
                (None, Some(message))
            }
            Err(e) => {
                tracing::warn!("Move of book {} failed: {}", pending.book_id(), e);
                let message = format!(
                    "Your last operation did not succeed. Error details: \"{}\"",
                    e.details()
                );
                (None, Some(message))
            }
        };

        let followup = {
            let mut moves = self.moves();
            let latest = moves.settle(pending.book_id(), pending.seq, confirmation);

            if failure.is_some() {
                if latest {
                    self.inner
                        .state
                        .send_if_modified(|view| pending.revert.apply(&mut view.books));
                    tracing::debug!(
                        "Reverted book {} to shelf {}",
                        pending.book_id(),
                        pending.revert.shelf()
                    );
                } else {
                    // a newer move of the same book owns the local entry now
                    tracing::debug!("Superseded move of book {} failed", pending.book_id());
                    moves.needs_resync = true;
                }
            }
            moves.followup()
        };

        if let Some(message) = failure {
            self.inner.notifier.error(message);
        }

        match followup {
            Followup::Nothing => {}
            Followup::Reconcile(snapshot) => {
                self.reconcile(&snapshot).await;
            }
            Followup::Refetch => {
                tracing::info!("Library may have drifted while moves were in flight, fetching again");
                self.fetch_all().await;
            }
        }
    }

    /// Optimistically move `book` to `target` and wait for the server
    pub async fn move_book(&self, book: Book, target: ShelfId) {
        let pending = self.begin_move(&book, target);
        self.complete_move(pending).await;
    }

    /// Fire-and-forget variant of [`move_book`](Self::move_book). The local
    /// state is updated before this returns. Must be called within a tokio
    /// runtime.
    pub fn spawn_move(&self, book: Book, target: ShelfId) -> JoinHandle<()> {
        let pending = self.begin_move(&book, target);
        let store = self.clone();
        tokio::spawn(async move { store.complete_move(pending).await })
    }

    /// Compare the local state with the server's shelves and re-fetch
    /// everything when they disagree
    pub async fn reconcile(&self, snapshot: &ShelfAssignment) -> Consistency {
        tracing::debug!("Checking state consistency...");

        let consistency = self.with_view(|view| view.books.check_consistency(snapshot));
        match &consistency {
            Consistency::Consistent => {
                tracing::debug!("Local state is consistent with the server");
            }
            Consistency::CountMismatch { local, server } => {
                tracing::warn!("Inconsistent number of books (local / server): {} / {}", local, server);
            }
            Consistency::ShelfMismatch {
                book_id,
                server_shelf,
                local_shelf,
            } => {
                tracing::warn!(
                    "Book {} is on shelf {} server-side but {:?} locally",
                    book_id,
                    server_shelf,
                    local_shelf
                );
            }
        }

        if !consistency.is_consistent() {
            self.inner.notifier.info(RESYNC_NOTICE, RESYNC_NOTICE_DURATION);
            self.fetch_all().await;
        }
        consistency
    }

    /// Replace the whole library with a fresh listing.
    ///
    /// A failure leaves the current books in place and records the error.
    /// Only the newest fetch may apply its result. A listing is held back
    /// when a move was pending at any point of the fetch, since it may
    /// predate that move.
    pub async fn fetch_all(&self) {
        loop {
            let generation = {
                let mut current = self
                    .inner
                    .fetch_generation
                    .lock()
                    .unwrap_or_else(|e| e.into_inner());
                *current += 1;
                *current
            };
            let (issued_at_start, idle_at_start) = {
                let moves = self.moves();
                (moves.issued, moves.is_idle())
            };

            tracing::info!("Fetching books");
            self.inner.state.send_modify(|view| {
                view.loading = true;
                view.error = None;
            });

            let result = self.inner.remote.get_all().await;

            let latest = *self
                .inner
                .fetch_generation
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if generation != latest {
                tracing::debug!("Ignoring superseded fetch #{}", generation);
                return;
            }

            let books = match result {
                Ok(books) => books,
                Err(e) => {
                    tracing::error!("Failed to fetch books: {}", e);
                    self.inner.state.send_modify(|view| {
                        view.loading = false;
                        view.error = Some(e.details());
                    });
                    return;
                }
            };

            let mut moves = self.moves();
            if !idle_at_start || moves.issued != issued_at_start {
                if moves.is_idle() {
                    drop(moves);
                    tracing::debug!("Library changed while fetching, fetching again");
                    continue;
                }
                moves.needs_resync = true;
                drop(moves);
                tracing::debug!("Library changed while fetching, deferring to pending moves");
                self.inner.state.send_modify(|view| view.loading = false);
                return;
            }

            let library = LibraryState::from_books(books);
            tracing::info!("Fetched {} books", library.len());
            self.inner.state.send_modify(|view| {
                view.books = library;
                view.loading = false;
                view.error = None;
            });
            return;
        }
    }
}
