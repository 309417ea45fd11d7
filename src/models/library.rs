//! Local library state and the pure parts of the shelf synchronization
//! protocol: optimistic moves, their reverts, and consistency checks against
//! the server's shelf assignment.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::book::Book;
use super::shelf::ShelfId;

/// Server view of the shelves: shelf ID to the IDs of the books on it.
/// Covers every book of the library, not only the one that was moved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShelfAssignment(pub BTreeMap<String, Vec<String>>);

impl ShelfAssignment {
    pub fn total_books(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(shelf, ids)| ids.iter().map(move |id| (shelf.as_str(), id.as_str())))
    }
}

impl<S: Into<String>, I: Into<String>> FromIterator<(S, Vec<I>)> for ShelfAssignment {
    fn from_iter<T: IntoIterator<Item = (S, Vec<I>)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(shelf, ids)| (shelf.into(), ids.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }
}

/// Outcome of comparing the local state with a [`ShelfAssignment`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consistency {
    Consistent,
    CountMismatch { local: usize, server: usize },
    ShelfMismatch {
        book_id: String,
        server_shelf: String,
        local_shelf: Option<ShelfId>,
    },
}

impl Consistency {
    pub fn is_consistent(&self) -> bool {
        matches!(self, Consistency::Consistent)
    }
}

/// Restores the entry a [`LibraryState::apply_move`] call replaced.
/// Applying it more than once has no further effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Revert {
    book: Book,
    shelf: ShelfId,
}

impl Revert {
    pub fn shelf(&self) -> ShelfId {
        self.shelf
    }

    /// Returns whether the state changed
    pub fn apply(&self, state: &mut LibraryState) -> bool {
        state.apply_move(&self.book, self.shelf).changed
    }
}

/// Result of an optimistic move
#[derive(Debug, Clone, PartialEq)]
pub struct ShelfMove {
    pub from: ShelfId,
    pub to: ShelfId,
    pub changed: bool,
    pub revert: Revert,
}

impl ShelfMove {
    /// A move of `book` onto the shelf it already sits on
    pub fn unchanged(book: &Book, shelf: ShelfId) -> Self {
        Self {
            from: shelf,
            to: shelf,
            changed: false,
            revert: Revert {
                book: book.clone(),
                shelf,
            },
        }
    }
}

/// Book ID to book. Every entry sits on a real shelf; a book that is not in
/// the map is on no shelf.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryState {
    books: HashMap<String, Book>,
}

impl LibraryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the state from a full listing. Books without a shelf are not
    /// part of the library and are skipped.
    pub fn from_books(books: impl IntoIterator<Item = Book>) -> Self {
        Self {
            books: books
                .into_iter()
                .filter(|book| !book.shelf().is_none())
                .map(|book| (book.id.clone(), book))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Book> {
        self.books.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.books.contains_key(id)
    }

    /// Recorded shelf for `id`, `ShelfId::None` when the book is absent
    pub fn shelf_of(&self, id: &str) -> ShelfId {
        self.books.get(id).map(Book::shelf).unwrap_or(ShelfId::None)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    /// Move `book` to `target` locally.
    ///
    /// The current shelf is read from this state, never from `book.shelf`,
    /// which may lag behind. Moving to the current shelf is a no-op, moving
    /// to `None` removes the entry, anything else upserts the caller's
    /// record with the new shelf.
    pub fn apply_move(&mut self, book: &Book, target: ShelfId) -> ShelfMove {
        let previous = self.books.get(&book.id).cloned();
        let from = previous.as_ref().map(Book::shelf).unwrap_or(ShelfId::None);

        let revert = Revert {
            book: previous.unwrap_or_else(|| book.clone()),
            shelf: from,
        };

        let changed = if from == target {
            false
        } else if target.is_none() {
            self.books.remove(&book.id);
            true
        } else {
            let updated = book.clone().with_shelf(target);
            self.books.insert(book.id.clone(), updated);
            true
        };

        ShelfMove {
            from,
            to: target,
            changed,
            revert,
        }
    }

    /// Compare against the server's shelves: same number of books, and every
    /// book the server lists is recorded locally on the same shelf.
    pub fn check_consistency(&self, snapshot: &ShelfAssignment) -> Consistency {
        let server = snapshot.total_books();
        let local = self.books.len();
        if local != server {
            return Consistency::CountMismatch { local, server };
        }

        for (shelf, id) in snapshot.iter() {
            let local_shelf = self.books.get(id).map(Book::shelf);
            if local_shelf.map(|s| s.as_str()) != Some(shelf) {
                return Consistency::ShelfMismatch {
                    book_id: id.to_string(),
                    server_shelf: shelf.to_string(),
                    local_shelf,
                };
            }
        }

        Consistency::Consistent
    }

    /// Books grouped by shelf in display order, each shelf sorted by title
    pub fn by_shelf(&self) -> Vec<(ShelfId, Vec<&Book>)> {
        ShelfId::IN_DISPLAY_ORDER
            .iter()
            .map(|&shelf| {
                let mut books: Vec<&Book> =
                    self.books.values().filter(|book| book.shelf() == shelf).collect();
                books.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
                (shelf, books)
            })
            .collect()
    }

    /// Replace every result that is part of the library with the library's
    /// record, so it shows its current shelf. Order is preserved.
    pub fn merge_results(&self, results: &[Book]) -> Vec<Book> {
        results
            .iter()
            .map(|book| self.books.get(&book.id).unwrap_or(book).clone())
            .collect()
    }
}
