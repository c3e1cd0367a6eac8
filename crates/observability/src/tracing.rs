//! Tracing/logging initialization.
//!
//! Logs go to stderr so they never interleave with the invoice table on stdout.

use tracing_subscriber::EnvFilter;

use crate::LogFormat;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Initialize tracing/logging for the process.
///
/// `RUST_LOG` wins over `default_directive` when set. Safe to call multiple
/// times (subsequent calls are no-ops).
pub fn init(format: LogFormat, default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = match format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Compact => builder.compact().without_time().try_init(),
    };
}
