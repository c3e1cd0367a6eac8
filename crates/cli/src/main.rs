use std::process::ExitCode;

use clap::Parser;

use invoice_builder_cli::{Cli, EXIT_OK, EXIT_USAGE, exit_code, run};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here too, on stdout.
            let code = if err.use_stderr() { EXIT_USAGE } else { EXIT_OK };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "invoice-builder failed");
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
