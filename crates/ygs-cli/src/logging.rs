//! Log setup.
//!
//! Stdout belongs to the i3bar protocol, so logs go to stderr or to the file
//! given with `--log-file`.

use std::io;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Env var holding the log filter (`tracing_subscriber` directive syntax).
pub const LOG_ENV: &str = "YAGOSTATUS_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber.
///
/// Keep the returned guard alive until exit so buffered file logs are
/// flushed.
pub fn init(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let Some(path) = log_file else {
        return builder
            .with_writer(io::stderr)
            .try_init()
            .map(|()| None)
            .map_err(|e| anyhow!("failed to install logger: {e}"));
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("invalid log file path {}", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    builder
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))?;
    Ok(Some(guard))
}
