use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

/// Identifier of a book, unique within a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(u64);

impl BookId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Whether a book is on the shelf or held by someone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BorrowStatus {
    #[default]
    Available,
    Borrowed { by: String },
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier for the book
    pub id: BookId,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Current borrow status
    #[serde(flatten)]
    pub status: BorrowStatus,
}

impl Book {
    pub fn new(id: BookId, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            status: BorrowStatus::Available,
        }
    }

    /// Name of the current borrower, if any.
    pub fn borrowed_by(&self) -> Option<&str> {
        match &self.status {
            BorrowStatus::Available => None,
            BorrowStatus::Borrowed { by } => Some(by),
        }
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self.status, BorrowStatus::Borrowed { .. })
    }
}

/// One title held by a user, tied to the copy it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Loan {
    pub(crate) book_id: BookId,
    pub(crate) title: String,
}

/// A borrower and the titles they currently hold, in borrow order.
///
/// Records are created on a user's first borrow and are never removed; after
/// everything is returned the record stays with an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    name: String,
    loans: Vec<Loan>,
}

impl UserRecord {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            loans: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Titles currently held, oldest borrow first.
    pub fn borrowed_books(&self) -> impl Iterator<Item = &str> + '_ {
        self.loans.iter().map(|loan| loan.title.as_str())
    }

    pub fn borrowed_count(&self) -> usize {
        self.loans.len()
    }

    pub fn holds(&self, id: BookId) -> bool {
        self.loans.iter().any(|loan| loan.book_id == id)
    }

    pub(crate) fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub(crate) fn push_loan(&mut self, book_id: BookId, title: String) {
        self.loans.push(Loan { book_id, title });
    }

    /// Drops every entry tied to `id`. Returns how many were removed.
    pub(crate) fn release(&mut self, id: BookId) -> usize {
        let before = self.loans.len();
        self.loans.retain(|loan| loan.book_id != id);
        before - self.loans.len()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserRecordRepr<'a> {
    name: &'a str,
    borrowed_books: Vec<&'a str>,
}

impl Serialize for UserRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        UserRecordRepr {
            name: &self.name,
            borrowed_books: self.borrowed_books().collect(),
        }
        .serialize(serializer)
    }
}
