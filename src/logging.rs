//! Logging setup
//!
//! Console output goes to stderr so listings and `--json` output on stdout stay
//! clean. A full trace is kept in `starplot.log.<date>` under the log directory.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_PREFIX: &str = "starplot.log";

/// Filter used when RUST_LOG is unset
pub const DEFAULT_FILTER: &str = "info,starplot=debug";

pub fn init_logging(log_dir: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // Lives as long as the process
    std::mem::forget(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::debug!("Logging to {}/{}", log_dir, LOG_FILE_PREFIX);
    Ok(())
}

/// Log a refused command with its error
#[macro_export]
macro_rules! log_refused {
    ($command:expr, $err:expr) => {
        tracing::warn!(command = %$command, error = %$err, "Command refused");
    };
}
