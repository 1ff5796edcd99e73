mod command;
mod error;
mod render;
mod shell;

use std::{
    fs::File,
    io::{self, BufReader, IsTerminal},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use libris_app::Catalog;
use libris_kernel::settings::{OutputFormat, Settings};

use error::ShellError;
use shell::{Session, ShellBuilder};

/// In-memory library catalog shell
#[derive(Debug, Parser)]
#[command(name = "libris", version, about)]
struct Cli {
    /// Output format for rendered views
    #[arg(long, value_enum, global = true)]
    format: Option<Format>,

    /// Start with an empty catalog even if seed books are configured
    #[arg(long, global = true)]
    no_seed: bool,

    /// Prompt shown before each line in interactive sessions
    #[arg(long, global = true)]
    prompt: Option<String>,

    /// Do not re-render the book list after each change
    #[arg(long, global = true)]
    no_render: bool,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Read commands from stdin (default)
    Shell,
    /// Execute a file of shell commands, stopping at the first bad line
    Run { script: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Table => OutputFormat::Table,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load libris settings")?;
    libris_telemetry::init(&settings.telemetry).with_context(|| "failed to initialise logging")?;

    if cli.no_seed {
        settings.catalog.seed.clear();
    }

    tracing::info!(
        env = ?settings.environment,
        seed = settings.catalog.seed.len(),
        "libris starting"
    );

    let catalog = Catalog::from_settings(&settings.catalog);
    let mut builder = ShellBuilder::from_settings(catalog, &settings.shell);
    if let Some(format) = cli.format {
        builder = builder.with_output(format.into());
    }
    if let Some(prompt) = cli.prompt {
        builder = builder.with_prompt(prompt);
    }
    if cli.no_render {
        builder = builder.with_auto_render(false);
    }
    let mut shell = builder.build();

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    match cli.mode.unwrap_or(Mode::Shell) {
        Mode::Shell => {
            let stdin = io::stdin();
            let session = if stdin.is_terminal() {
                Session::Interactive
            } else {
                Session::Piped
            };
            shell
                .run(stdin.lock(), &mut out, &mut err, session)
                .with_context(|| "shell session failed")?;
        }
        Mode::Run { script } => {
            let file = File::open(&script)
                .with_context(|| format!("failed to open script {}", script.display()))?;
            match shell.run(BufReader::new(file), &mut out, &mut err, Session::Script) {
                Ok(_) => {}
                Err(error @ ShellError::Script { .. }) => {
                    tracing::info!(script = %script.display(), code = error.code(), "script aborted");
                    shell.report(&mut err, &error)?;
                    return Ok(ExitCode::FAILURE);
                }
                Err(error) => {
                    return Err(error)
                        .with_context(|| format!("script {} failed", script.display()));
                }
            }
        }
    }

    tracing::info!(
        books = shell.catalog().books().len(),
        borrowers = shell.catalog().user_records().len(),
        "libris finished"
    );
    Ok(ExitCode::SUCCESS)
}
