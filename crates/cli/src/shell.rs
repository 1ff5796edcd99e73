//! The interactive front end: one input line, one catalog operation, one re-render.

use std::io::{BufRead, Write};

use libris_app::Catalog;
use libris_kernel::settings::{OutputFormat, ShellSettings};

use crate::{
    command::{parse_line, Line, ShellCommand},
    error::ShellError,
    render::{Notice, Renderer},
};

/// Whether the loop should keep reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// How the loop treats input and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    /// Prompt before each line, report errors and carry on.
    Interactive,
    /// Read silently, report errors and carry on.
    Piped,
    /// Stop at the first bad line.
    Script,
}

/// Builder for a [`Shell`]
pub struct ShellBuilder {
    catalog: Catalog,
    prompt: String,
    output: OutputFormat,
    auto_render: bool,
}

impl ShellBuilder {
    pub fn from_settings(catalog: Catalog, settings: &ShellSettings) -> Self {
        Self {
            catalog,
            prompt: settings.prompt.clone(),
            output: settings.output,
            auto_render: settings.auto_render,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    /// Re-render the book list after every change to the catalog
    pub fn with_auto_render(mut self, enabled: bool) -> Self {
        self.auto_render = enabled;
        self
    }

    pub fn build(self) -> Shell {
        Shell {
            catalog: self.catalog,
            renderer: Renderer::new(self.output),
            prompt: self.prompt,
            auto_render: self.auto_render,
        }
    }
}

pub struct Shell {
    catalog: Catalog,
    renderer: Renderer,
    prompt: String,
    auto_render: bool,
}

impl Shell {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run one command against the catalog and render its result to `out`.
    pub fn execute(
        &mut self,
        command: ShellCommand,
        out: &mut dyn Write,
    ) -> Result<Flow, ShellError> {
        let mutates = command.mutates();

        match command {
            ShellCommand::Add { title, author } => {
                let id = self.catalog.add_book(title.clone(), author.clone());
                self.renderer
                    .notice(out, &Notice::Added { id, title, author })?;
            }
            ShellCommand::Delete { id } => {
                let outcome = self.catalog.delete_book(id);
                self.renderer.notice(out, &Notice::deleted(id, outcome))?;
            }
            ShellCommand::Borrow { id, user } => {
                let outcome = self.catalog.borrow_book(id, user.clone());
                self.renderer
                    .notice(out, &Notice::borrowed(id, &user, outcome))?;
            }
            ShellCommand::Return { id } => {
                let outcome = self.catalog.return_book(id);
                self.renderer.notice(out, &Notice::returned(id, outcome))?;
            }
            ShellCommand::Search { query } => {
                self.catalog.apply_search(query);
                self.render_books(out)?;
            }
            ShellCommand::Clear => {
                self.catalog.clear_search();
                self.render_books(out)?;
            }
            ShellCommand::List => self.render_books(out)?,
            ShellCommand::Users => self.renderer.users(out, self.catalog.user_records())?,
            ShellCommand::State => self.renderer.snapshot(out, &self.catalog.snapshot())?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }

        if mutates {
            if let Err(violation) = self.catalog.check_invariants() {
                tracing::error!(target: "libris::shell", %violation, "catalog invariant broken");
            }
            if self.auto_render {
                self.render_books(out)?;
            }
        }

        Ok(Flow::Continue)
    }

    /// Parse and execute one raw input line.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> Result<Flow, ShellError> {
        match parse_line(line)? {
            Line::Blank => Ok(Flow::Continue),
            Line::Help(text) => {
                self.renderer.help(out, &text)?;
                Ok(Flow::Continue)
            }
            Line::Command(command) => {
                tracing::debug!(target: "libris::shell", ?command, "executing");
                self.execute(command, out)
            }
        }
    }

    /// Read lines until end of input or `quit`.
    ///
    /// Errors in a line go to `err` unless the session is a script, in which
    /// case the first one ends the run with its line number attached.
    pub fn run(
        &mut self,
        input: impl BufRead,
        out: &mut dyn Write,
        err: &mut dyn Write,
        session: Session,
    ) -> Result<usize, ShellError> {
        let mut executed = 0;
        let mut lines = input.lines();

        loop {
            if session == Session::Interactive {
                write!(out, "{}", self.prompt)?;
                out.flush()?;
            }

            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;
            executed += 1;

            match self.execute_line(&line, out) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(error) if session == Session::Script => {
                    return Err(ShellError::Script {
                        line: executed,
                        source: Box::new(error),
                    });
                }
                Err(error) => {
                    tracing::warn!(target: "libris::shell", code = error.code(), "rejected input line");
                    self.report(err, &error)?;
                }
            }
        }

        if session == Session::Interactive {
            writeln!(out)?;
        }
        tracing::info!(target: "libris::shell", lines = executed, "session finished");
        Ok(executed)
    }

    /// Render an error in the session's output format.
    pub fn report(&self, err: &mut dyn Write, error: &ShellError) -> Result<(), ShellError> {
        self.renderer.error(err, error)
    }

    fn render_books(&self, out: &mut dyn Write) -> Result<(), ShellError> {
        let shown = self.catalog.displayed();
        self.renderer
            .books(out, &shown, self.catalog.mode(), self.catalog.books().len())
    }
}
