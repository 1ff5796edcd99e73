//! The catalog state manager.
//!
//! [`Catalog`] owns the book collection and the borrower records and is the
//! only thing that mutates them. Presentation code reads through `&Catalog` or
//! an owned [`CatalogSnapshot`] and turns user input into one operation call.
//!
//! Every operation is total. Unknown ids are no-ops, reported through the
//! returned outcome rather than an error. A book's status and the borrower
//! records are updated together, so a borrowed book always appears in exactly
//! one record and an available one in none.

pub mod ids;
pub mod models;
pub mod search;

use std::{collections::HashSet, fmt};

use libris_kernel::settings::CatalogSettings;
use serde::Serialize;
use thiserror::Error;

pub use ids::{Clock, SystemClock};
pub use models::{Book, BookId, BorrowStatus, UserRecord};
pub use search::SearchMode;

use ids::IdAllocator;
use search::Matcher;

/// Result of [`Catalog::delete_book`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted {
        book: Book,
        /// Borrower whose record the title was removed from.
        released_from: Option<String>,
    },
    Unknown,
}

/// Result of [`Catalog::borrow_book`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorrowOutcome {
    Borrowed { book_id: BookId },
    /// The book was held by someone else and moved to the new borrower.
    Transferred { book_id: BookId, from: String },
    AlreadyHeld,
    Unknown,
}

/// Result of [`Catalog::return_book`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    Returned { book_id: BookId, from: String },
    NotBorrowed,
    Unknown,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("book id {0} is used more than once")]
    DuplicateBookId(BookId),

    #[error("user record '{0}' exists more than once")]
    DuplicateUserName(String),

    #[error("book {book_id} is borrowed by '{user}' but missing from their record")]
    UnrecordedLoan { book_id: BookId, user: String },

    #[error("'{user}' holds '{title}' but the book is not borrowed by them")]
    OrphanLoan { user: String, title: String },
}

/// Owned, read-only copy of the catalog for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub books: Vec<Book>,
    pub user_records: Vec<UserRecord>,
    pub mode: SearchMode,
    /// What the book list shows under `mode`.
    pub displayed: Vec<Book>,
}

pub struct Catalog {
    books: Vec<Book>,
    user_records: Vec<UserRecord>,
    mode: SearchMode,
    ids: IdAllocator,
    clock: Box<dyn Clock>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("books", &self.books)
            .field("user_records", &self.user_records)
            .field("mode", &self.mode)
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// An empty catalog using the system clock for ids.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            books: Vec::new(),
            user_records: Vec::new(),
            mode: SearchMode::Unfiltered,
            ids: IdAllocator::default(),
            clock: Box::new(clock),
        }
    }

    /// A catalog pre-filled with the configured seed books.
    pub fn from_settings(settings: &CatalogSettings) -> Self {
        let mut catalog = Self::new();
        for seed in &settings.seed {
            catalog.add_book(seed.title.clone(), seed.author.clone());
        }
        tracing::info!(
            target: "libris::catalog",
            seeded = settings.seed.len(),
            "catalog ready"
        );
        catalog
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn user_records(&self) -> &[UserRecord] {
        &self.user_records
    }

    pub fn book(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn user_record(&self, name: &str) -> Option<&UserRecord> {
        self.user_records.iter().find(|record| record.name() == name)
    }

    pub fn mode(&self) -> &SearchMode {
        &self.mode
    }

    /// Append a new available book. Title and author are taken as given, empty or not.
    pub fn add_book(&mut self, title: impl Into<String>, author: impl Into<String>) -> BookId {
        let id = self.ids.next(self.clock.as_ref());
        let book = Book::new(id, title, author);
        tracing::info!(
            target: "libris::catalog",
            book_id = %id,
            title = %book.title,
            author = %book.author,
            "book added"
        );
        self.books.push(book);
        id
    }

    /// Remove a book. A borrowed book also leaves its borrower's record.
    pub fn delete_book(&mut self, id: BookId) -> DeleteOutcome {
        let Some(position) = self.books.iter().position(|book| book.id == id) else {
            tracing::debug!(target: "libris::catalog", book_id = %id, "delete ignored: unknown book");
            return DeleteOutcome::Unknown;
        };

        let book = self.books.remove(position);
        let released_from = book.borrowed_by().map(str::to_owned);
        if released_from.is_some() {
            self.release(id);
        }

        tracing::info!(
            target: "libris::catalog",
            book_id = %id,
            released_from = ?released_from,
            "book deleted"
        );
        DeleteOutcome::Deleted {
            book,
            released_from,
        }
    }

    /// Lend a book to `user`, creating their record on first borrow.
    ///
    /// A book held by someone else is taken off their record first, so the
    /// last borrower wins without leaving a stale entry behind.
    pub fn borrow_book(&mut self, id: BookId, user: impl Into<String>) -> BorrowOutcome {
        let user = user.into();
        let Some(book) = self.books.iter_mut().find(|book| book.id == id) else {
            tracing::debug!(target: "libris::catalog", book_id = %id, %user, "borrow ignored: unknown book");
            return BorrowOutcome::Unknown;
        };

        let previous = match &book.status {
            BorrowStatus::Borrowed { by } if *by == user => {
                tracing::debug!(target: "libris::catalog", book_id = %id, %user, "borrow ignored: already held");
                return BorrowOutcome::AlreadyHeld;
            }
            BorrowStatus::Borrowed { by } => Some(by.clone()),
            BorrowStatus::Available => None,
        };
        book.status = BorrowStatus::Borrowed { by: user.clone() };
        let title = book.title.clone();

        if previous.is_some() {
            self.release(id);
        }
        self.record_loan(&user, id, title);

        tracing::info!(
            target: "libris::catalog",
            book_id = %id,
            %user,
            previous = ?previous,
            "book borrowed"
        );
        match previous {
            Some(from) => BorrowOutcome::Transferred { book_id: id, from },
            None => BorrowOutcome::Borrowed { book_id: id },
        }
    }

    /// Put a book back on the shelf and drop it from every borrower record.
    pub fn return_book(&mut self, id: BookId) -> ReturnOutcome {
        let Some(book) = self.books.iter_mut().find(|book| book.id == id) else {
            tracing::debug!(target: "libris::catalog", book_id = %id, "return ignored: unknown book");
            return ReturnOutcome::Unknown;
        };

        let from = match std::mem::take(&mut book.status) {
            BorrowStatus::Available => {
                tracing::debug!(target: "libris::catalog", book_id = %id, "return ignored: not borrowed");
                return ReturnOutcome::NotBorrowed;
            }
            BorrowStatus::Borrowed { by } => by,
        };
        self.release(id);

        tracing::info!(target: "libris::catalog", book_id = %id, user = %from, "book returned");
        ReturnOutcome::Returned { book_id: id, from }
    }

    /// Books whose title or author contains `query`, ignoring case, in catalog order.
    pub fn search_books(&self, query: &str) -> Vec<Book> {
        let matcher = Matcher::new(query);
        matcher.filter(&self.books).cloned().collect()
    }

    /// Switch the book view to results for `query` and return them.
    pub fn apply_search(&mut self, query: impl Into<String>) -> Vec<Book> {
        let query = query.into();
        tracing::info!(target: "libris::catalog", %query, "search applied");
        self.mode = SearchMode::Filtered { query };
        self.displayed()
    }

    /// Switch the book view back to the full catalog.
    pub fn clear_search(&mut self) {
        if self.mode.is_filtered() {
            tracing::info!(target: "libris::catalog", "search cleared");
        }
        self.mode = SearchMode::Unfiltered;
    }

    /// The list the book view renders. Filtered results are recomputed on each
    /// call, so they follow borrows, returns and deletes made while searching.
    pub fn displayed(&self) -> Vec<Book> {
        match &self.mode {
            SearchMode::Unfiltered => self.books.clone(),
            SearchMode::Filtered { query } => self.search_books(query),
        }
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            books: self.books.clone(),
            user_records: self.user_records.clone(),
            mode: self.mode.clone(),
            displayed: self.displayed(),
        }
    }

    /// Verify id and name uniqueness and that book status agrees with the records.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut ids = HashSet::new();
        for book in &self.books {
            if !ids.insert(book.id) {
                return Err(InvariantViolation::DuplicateBookId(book.id));
            }
        }

        let mut names = HashSet::new();
        for record in &self.user_records {
            if !names.insert(record.name()) {
                return Err(InvariantViolation::DuplicateUserName(
                    record.name().to_string(),
                ));
            }
        }

        for book in &self.books {
            if let Some(user) = book.borrowed_by() {
                let holders: Vec<_> = self
                    .user_records
                    .iter()
                    .filter(|record| record.holds(book.id))
                    .collect();
                let recorded = matches!(holders.as_slice(), [only] if only.name() == user);
                if !recorded {
                    return Err(InvariantViolation::UnrecordedLoan {
                        book_id: book.id,
                        user: user.to_string(),
                    });
                }
            }
        }

        for record in &self.user_records {
            for loan in record.loans() {
                let matching = self.book(loan.book_id).filter(|book| {
                    book.borrowed_by() == Some(record.name()) && book.title == loan.title
                });
                let held_once = record
                    .loans()
                    .iter()
                    .filter(|other| other.book_id == loan.book_id)
                    .count()
                    == 1;
                if matching.is_none() || !held_once {
                    return Err(InvariantViolation::OrphanLoan {
                        user: record.name().to_string(),
                        title: loan.title.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    fn record_loan(&mut self, user: &str, id: BookId, title: String) {
        match self
            .user_records
            .iter_mut()
            .find(|record| record.name() == user)
        {
            Some(record) => record.push_loan(id, title),
            None => {
                let mut record = UserRecord::new(user.to_string());
                record.push_loan(id, title);
                self.user_records.push(record);
            }
        }
    }

    fn release(&mut self, id: BookId) {
        for record in &mut self.user_records {
            record.release(id);
        }
    }
}

#[cfg(test)]
mod tests;
