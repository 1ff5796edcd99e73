use serde::Serialize;

use super::models::Book;

/// Which list the book view shows.
///
/// Kept explicit so that a query with no matches still reads as "searching".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Unfiltered,
    Filtered { query: String },
}

impl SearchMode {
    pub fn query(&self) -> Option<&str> {
        match self {
            SearchMode::Unfiltered => None,
            SearchMode::Filtered { query } => Some(query),
        }
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self, SearchMode::Filtered { .. })
    }
}

/// Lower-cased query, so it is folded once per search rather than once per book.
#[derive(Debug, Clone)]
pub(crate) struct Matcher {
    folded: String,
}

impl Matcher {
    pub(crate) fn new(query: &str) -> Self {
        Self {
            folded: query.to_lowercase(),
        }
    }

    /// Case-insensitive substring match on title or author. The empty query matches everything.
    pub(crate) fn matches(&self, book: &Book) -> bool {
        book.title.to_lowercase().contains(&self.folded)
            || book.author.to_lowercase().contains(&self.folded)
    }

    pub(crate) fn filter<'a>(&'a self, books: &'a [Book]) -> impl Iterator<Item = &'a Book> + 'a {
        books.iter().filter(move |book| self.matches(book))
    }
}
