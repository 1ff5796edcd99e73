//! Errors surfaced by the shell

use serde::Serialize;
use thiserror::Error;

/// Machine-readable error as printed in JSON output.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("{0}")]
    Parse(#[from] clap::Error),

    #[error("unterminated quote")]
    UnterminatedQuote,

    #[error("line {line}: {source}")]
    Script {
        line: usize,
        #[source]
        source: Box<ShellError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ShellError {
    /// Stable code for scripts consuming JSON output
    pub fn code(&self) -> &'static str {
        match self {
            ShellError::Parse(_) => "parse_error",
            ShellError::UnterminatedQuote => "unterminated_quote",
            ShellError::Script { source, .. } => source.code(),
            ShellError::Io(_) => "io_error",
        }
    }

    /// Single-line description without clap's usage footer.
    pub fn summary(&self) -> String {
        match self {
            ShellError::Parse(e) => {
                let rendered = e.to_string();
                let first = rendered.lines().next().unwrap_or_default();
                first.trim_start_matches("error: ").to_string()
            }
            ShellError::Script { line, source } => format!("line {}: {}", line, source.summary()),
            other => other.to_string(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.summary(),
        }
    }
}
