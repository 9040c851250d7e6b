use std::ffi::OsStr;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::AppError;

fn filter(verbose: u8, quiet: &str) -> EnvFilter {
    let level = match verbose {
        0 => quiet,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keylight={level}")))
}

/// One-shot commands log to stderr so stdout stays machine readable.
pub fn init_stderr(verbose: u8) {
    let _ = tracing_subscriber::registry()
        .with(filter(verbose, "error"))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// The interactive view owns the terminal, so logs go to a file. The guard
/// must live as long as the session to flush buffered lines.
pub fn init_file(verbose: u8, path: &Path) -> Result<WorkerGuard, AppError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path.file_name().unwrap_or(OsStr::new("keylight.log"));
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(filter(verbose, "warn"))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init();
    Ok(guard)
}
