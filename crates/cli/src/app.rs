//! Wiring: config → storage → session → action.

use std::io::{BufRead, Write};

use anyhow::Context;

use invoice_builder_core::{ClockIdGenerator, Percentage};
use invoice_builder_infra::{
    AppConfig, ConfigError, FileStorage, InvoiceSession, LineItemRepository, SessionError,
    StorageError,
};
use invoice_builder_invoicing::Catalog;

use crate::action::{self, Action};
use crate::args::{Cli, Command};
use crate::repl;

pub type FileSession = InvoiceSession<FileStorage, ClockIdGenerator>;

/// Exit status for a successful run.
pub const EXIT_OK: u8 = 0;
/// Bad usage or a rejected command.
pub const EXIT_USAGE: u8 = 1;
/// Config could not be loaded or storage could not be read or written.
pub const EXIT_ENVIRONMENT: u8 = 2;

/// Config file, then `INVOICE_BUILDER_*` variables, then `--data-dir`.
pub fn load_config<F>(cli: &Cli, env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = AppConfig::load_with_env(cli.config.as_deref(), env)?;
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = Some(dir.clone());
        config.validate()?;
    }
    Ok(config)
}

/// Open the file-backed session described by `config`, with `--tax-rate` and
/// `--discount-rate` applied on top (clamped like any other rate input).
pub fn open_session(cli: &Cli, config: &AppConfig) -> anyhow::Result<FileSession> {
    let data_dir = config.data_dir();
    let repository =
        LineItemRepository::new(FileStorage::new(&data_dir), config.storage.key.as_str())?;

    let mut options = config.session_options();
    if let Some(raw) = &cli.tax_rate {
        options.tax_rate = Percentage::from_input(raw);
    }
    if let Some(raw) = &cli.discount_rate {
        options.discount_rate = Percentage::from_input(raw);
    }

    tracing::info!(data_dir = %data_dir.display(), key = %config.storage.key, "opening invoice");

    let session = InvoiceSession::open(
        repository,
        Catalog::standard(),
        ClockIdGenerator::new(),
        options,
    )
    .with_context(|| format!("failed to open invoice in {}", data_dir.display()))?;
    Ok(session)
}

/// Run the parsed command line against an already loaded config.
pub fn execute<R, W>(cli: &Cli, config: &AppConfig, input: R, out: &mut W) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let command = cli.resolved_command();

    // The catalog never touches storage.
    if *command == Command::Catalog {
        write!(out, "{}", crate::render::catalog(&Catalog::standard()))?;
        return Ok(());
    }

    let mut session = open_session(cli, config)?;
    match Action::try_from(command) {
        Ok(requested) => action::perform(&mut session, requested, out),
        Err(()) => repl::run(&mut session, input, out),
    }
}

/// Process entry point behind `main`: real environment, stdin and stdout.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli, |name| std::env::var(name).ok())?;
    invoice_builder_observability::init(config.logging.format);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(cli, &config, stdin.lock(), &mut out)?;
    out.flush()?;
    Ok(())
}

/// Map a failure to the process exit status.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if cause.is::<ConfigError>() || cause.is::<StorageError>() {
            return EXIT_ENVIRONMENT;
        }
        if let Some(SessionError::Storage(_)) = cause.downcast_ref::<SessionError>() {
            return EXIT_ENVIRONMENT;
        }
        if cause.is::<std::io::Error>() {
            return EXIT_ENVIRONMENT;
        }
    }
    EXIT_USAGE
}
