//! Text and JSON views of catalog state.

use std::{fmt, io::Write};

use libris_app::{
    modules::catalog::{BorrowOutcome, DeleteOutcome, ReturnOutcome},
    Book, BookId, BorrowStatus, CatalogSnapshot, SearchMode, UserRecord,
};
use libris_kernel::settings::OutputFormat;
use serde::Serialize;
use serde_json::json;

use crate::error::ShellError;

/// What a state-changing command did, as told to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notice {
    Added {
        id: BookId,
        title: String,
        author: String,
    },
    Deleted {
        id: BookId,
        released_from: Option<String>,
    },
    Borrowed {
        id: BookId,
        user: String,
        taken_from: Option<String>,
    },
    Returned {
        id: BookId,
        user: String,
    },
    Ignored {
        id: BookId,
        reason: IgnoreReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    UnknownBook,
    AlreadyHeld,
    NotBorrowed,
}

impl Notice {
    pub fn deleted(id: BookId, outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted { released_from, .. } => Notice::Deleted { id, released_from },
            DeleteOutcome::Unknown => Notice::Ignored {
                id,
                reason: IgnoreReason::UnknownBook,
            },
        }
    }

    pub fn borrowed(id: BookId, user: &str, outcome: BorrowOutcome) -> Self {
        let (user, taken_from) = match outcome {
            BorrowOutcome::Borrowed { .. } => (user.to_string(), None),
            BorrowOutcome::Transferred { from, .. } => (user.to_string(), Some(from)),
            BorrowOutcome::AlreadyHeld => {
                return Notice::Ignored {
                    id,
                    reason: IgnoreReason::AlreadyHeld,
                }
            }
            BorrowOutcome::Unknown => {
                return Notice::Ignored {
                    id,
                    reason: IgnoreReason::UnknownBook,
                }
            }
        };
        Notice::Borrowed {
            id,
            user,
            taken_from,
        }
    }

    pub fn returned(id: BookId, outcome: ReturnOutcome) -> Self {
        match outcome {
            ReturnOutcome::Returned { from, .. } => Notice::Returned { id, user: from },
            ReturnOutcome::NotBorrowed => Notice::Ignored {
                id,
                reason: IgnoreReason::NotBorrowed,
            },
            ReturnOutcome::Unknown => Notice::Ignored {
                id,
                reason: IgnoreReason::UnknownBook,
            },
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Added { id, title, author } => {
                write!(f, "added book {id}: {title} by {author}")
            }
            Notice::Deleted {
                id,
                released_from: None,
            } => write!(f, "deleted book {id}"),
            Notice::Deleted {
                id,
                released_from: Some(user),
            } => write!(f, "deleted book {id} (released from {user})"),
            Notice::Borrowed {
                id,
                user,
                taken_from: None,
            } => write!(f, "{user} borrowed book {id}"),
            Notice::Borrowed {
                id,
                user,
                taken_from: Some(from),
            } => write!(f, "{user} borrowed book {id} (taken from {from})"),
            Notice::Returned { id, user } => write!(f, "{user} returned book {id}"),
            Notice::Ignored { id, reason } => match reason {
                IgnoreReason::UnknownBook => write!(f, "ignored: no book with id {id}"),
                IgnoreReason::AlreadyHeld => write!(f, "ignored: book {id} is already held by that user"),
                IgnoreReason::NotBorrowed => write!(f, "ignored: book {id} is not borrowed"),
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    format: OutputFormat,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn notice(&self, out: &mut dyn Write, notice: &Notice) -> Result<(), ShellError> {
        match self.format {
            OutputFormat::Table => writeln!(out, "{notice}")?,
            OutputFormat::Json => write_json(out, notice)?,
        }
        Ok(())
    }

    /// The book list, headed by what it shows so an empty result set is never
    /// confused with an empty catalog.
    pub fn books(
        &self,
        out: &mut dyn Write,
        books: &[Book],
        mode: &SearchMode,
        total: usize,
    ) -> Result<(), ShellError> {
        if self.format == OutputFormat::Json {
            return write_json(out, &json!({ "view": "books", "mode": mode, "books": books }));
        }

        match mode.query() {
            None if books.is_empty() => writeln!(out, "no books in the catalog")?,
            None => writeln!(out, "catalog ({} of {} books)", books.len(), total)?,
            Some(query) if books.is_empty() => writeln!(out, "no matches for \"{query}\"")?,
            Some(query) => writeln!(
                out,
                "results for \"{query}\" ({} of {} books)",
                books.len(),
                total
            )?,
        }
        if books.is_empty() {
            return Ok(());
        }

        let rows: Vec<[String; 4]> = books
            .iter()
            .map(|book| {
                [
                    book.id.to_string(),
                    book.title.clone(),
                    book.author.clone(),
                    status_label(&book.status),
                ]
            })
            .collect();
        write_table(out, ["ID", "TITLE", "AUTHOR", "STATUS"], &rows)
    }

    pub fn users(&self, out: &mut dyn Write, records: &[UserRecord]) -> Result<(), ShellError> {
        if self.format == OutputFormat::Json {
            return write_json(out, &json!({ "view": "users", "userRecords": records }));
        }

        if records.is_empty() {
            writeln!(out, "no borrower records")?;
            return Ok(());
        }

        let rows: Vec<[String; 2]> = records
            .iter()
            .map(|record| {
                let titles: Vec<&str> = record.borrowed_books().collect();
                let held = if titles.is_empty() {
                    "-".to_string()
                } else {
                    titles.join(", ")
                };
                [record.name().to_string(), held]
            })
            .collect();
        write_table(out, ["NAME", "BORROWED"], &rows)
    }

    pub fn snapshot(
        &self,
        out: &mut dyn Write,
        snapshot: &CatalogSnapshot,
    ) -> Result<(), ShellError> {
        match self.format {
            OutputFormat::Json => write_json(out, snapshot),
            OutputFormat::Table => {
                let total = snapshot.books.len();
                self.books(out, &snapshot.books, &SearchMode::Unfiltered, total)?;
                if let Some(query) = snapshot.mode.query() {
                    writeln!(out, "search active: \"{query}\" ({} shown)", snapshot.displayed.len())?;
                }
                self.users(out, &snapshot.user_records)
            }
        }
    }

    pub fn help(&self, out: &mut dyn Write, text: &str) -> Result<(), ShellError> {
        match self.format {
            OutputFormat::Table => write!(out, "{text}")?,
            OutputFormat::Json => write_json(out, &json!({ "help": text }))?,
        }
        Ok(())
    }

    pub fn error(&self, out: &mut dyn Write, error: &ShellError) -> Result<(), ShellError> {
        match self.format {
            OutputFormat::Table => writeln!(out, "error: {}", error.summary())?,
            OutputFormat::Json => write_json(out, &json!({ "error": error.body() }))?,
        }
        Ok(())
    }
}

fn status_label(status: &BorrowStatus) -> String {
    match status {
        BorrowStatus::Available => "available".to_string(),
        BorrowStatus::Borrowed { by } => format!("borrowed by {by}"),
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<(), ShellError> {
    let line = serde_json::to_string(value).map_err(std::io::Error::from)?;
    writeln!(out, "{line}")?;
    Ok(())
}

fn write_table<const N: usize>(
    out: &mut dyn Write,
    header: [&str; N],
    rows: &[[String; N]],
) -> Result<(), ShellError> {
    let mut widths = header.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = header.map(str::to_string);
    for row in std::iter::once(&header).chain(rows) {
        let mut line = String::new();
        for (i, (cell, width)) in row.iter().zip(widths).enumerate() {
            if i + 1 == N {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{cell:<width$}  "));
            }
        }
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_app::Catalog;

    fn render(f: impl FnOnce(&Renderer, &mut Vec<u8>) -> Result<(), ShellError>, format: OutputFormat) -> String {
        let mut out = Vec::new();
        f(&Renderer::new(format), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn sample() -> Catalog {
        let mut catalog = Catalog::new();
        let dune = catalog.add_book("Dune", "Herbert");
        catalog.add_book("1984", "Orwell");
        catalog.borrow_book(dune, "Bob");
        catalog
    }

    #[test]
    fn table_lists_books_with_status() {
        let catalog = sample();
        let text = render(
            |r, out| r.books(out, catalog.books(), catalog.mode(), catalog.books().len()),
            OutputFormat::Table,
        );
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "catalog (2 of 2 books)");
        assert!(lines[1].starts_with("ID"));
        assert!(lines[1].ends_with("STATUS"));
        assert!(lines[2].contains("Dune") && lines[2].ends_with("borrowed by Bob"));
        assert!(lines[3].contains("1984") && lines[3].ends_with("available"));
    }

    #[test]
    fn empty_results_name_the_query() {
        let mode = SearchMode::Filtered {
            query: "tolkien".to_string(),
        };
        let text = render(|r, out| r.books(out, &[], &mode, 2), OutputFormat::Table);
        assert_eq!(text, "no matches for \"tolkien\"\n");

        let text = render(
            |r, out| r.books(out, &[], &SearchMode::Unfiltered, 0),
            OutputFormat::Table,
        );
        assert_eq!(text, "no books in the catalog\n");
    }

    #[test]
    fn users_table_marks_empty_records() {
        let mut catalog = sample();
        let dune = catalog.books()[0].id;
        catalog.return_book(dune);
        let text = render(|r, out| r.users(out, catalog.user_records()), OutputFormat::Table);
        assert_eq!(text, "NAME  BORROWED\nBob   -\n");
    }

    #[test]
    fn json_books_view_carries_mode() {
        let catalog = sample();
        let mode = SearchMode::Filtered {
            query: "orw".to_string(),
        };
        let shown = catalog.search_books("orw");
        let text = render(|r, out| r.books(out, &shown, &mode, 2), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["mode"], json!({"mode": "filtered", "query": "orw"}));
        assert_eq!(value["books"][0]["title"], "1984");
    }

    #[test]
    fn notices_read_naturally() {
        let id = BookId::new(5);
        assert_eq!(
            Notice::borrowed(
                id,
                "Ann",
                BorrowOutcome::Transferred {
                    book_id: id,
                    from: "Bob".to_string()
                }
            )
            .to_string(),
            "Ann borrowed book 5 (taken from Bob)"
        );
        assert_eq!(
            Notice::returned(id, ReturnOutcome::Unknown).to_string(),
            "ignored: no book with id 5"
        );
        assert_eq!(
            serde_json::to_value(Notice::returned(id, ReturnOutcome::NotBorrowed)).unwrap(),
            json!({"event": "ignored", "id": 5, "reason": "not_borrowed"})
        );
    }

    #[test]
    fn errors_render_per_format() {
        let text = render(|r, out| r.error(out, &ShellError::UnterminatedQuote), OutputFormat::Table);
        assert_eq!(text, "error: unterminated quote\n");

        let text = render(|r, out| r.error(out, &ShellError::UnterminatedQuote), OutputFormat::Json);
        assert_eq!(
            text,
            "{\"error\":{\"code\":\"unterminated_quote\",\"message\":\"unterminated quote\"}}\n"
        );
    }
}
