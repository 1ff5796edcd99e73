//! Turning one line of input into one catalog command.

use clap::{error::ErrorKind, Parser, Subcommand};
use libris_app::BookId;

use crate::error::ShellError;

#[derive(Debug, Parser)]
#[command(name = "libris", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ShellCommand {
    /// Add a book to the catalog
    Add { title: String, author: String },
    /// Delete a book by id
    Delete { id: BookId },
    /// Lend a book to a user
    Borrow { id: BookId, user: String },
    /// Return a borrowed book
    Return { id: BookId },
    /// Show books whose title or author contains QUERY
    Search {
        #[arg(default_value = "")]
        query: String,
    },
    /// Leave search results and show the whole catalog
    Clear,
    /// Show the current book list
    List,
    /// Show borrower records
    Users,
    /// Dump the whole catalog state
    State,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

impl ShellCommand {
    /// Whether the command changes books or borrower records.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            ShellCommand::Add { .. }
                | ShellCommand::Delete { .. }
                | ShellCommand::Borrow { .. }
                | ShellCommand::Return { .. }
        )
    }
}

/// A parsed input line.
#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    Blank,
    Help(String),
    Command(ShellCommand),
}

pub fn parse_line(line: &str) -> Result<Line, ShellError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(Line::Blank);
    }

    let mut words = split_words(trimmed)?;
    // Arguments are plain values: titles, names and queries may start with '-'.
    // `help` keeps its own arguments so `help add` still works.
    if words.len() > 1 && words[0] != "help" {
        words.insert(1, "--".to_string());
    }

    match ShellLine::try_parse_from(words) {
        Ok(parsed) => Ok(Line::Command(parsed.command)),
        Err(e) if e.kind() == ErrorKind::DisplayHelp => Ok(Line::Help(e.to_string())),
        Err(e) if e.kind() == ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            Ok(Line::Help(e.to_string()))
        }
        Err(e) => Err(ShellError::Parse(e)),
    }
}

/// Split on whitespace; double quotes group words and `\` escapes inside them.
pub fn split_words(line: &str) -> Result<Vec<String>, ShellError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => return Err(ShellError::UnterminatedQuote),
                        },
                        Some(other) => current.push(other),
                        None => return Err(ShellError::UnterminatedQuote),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }

    if in_word {
        words.push(current);
    }

    Ok(words)
}
