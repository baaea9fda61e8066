use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `fundview=debug`.
pub const LOG_ENV: &str = "FUNDVIEW_LOG";

/// Directory the daily log files are written to.
pub fn log_dir() -> Option<PathBuf> {
  dirs::data_dir().map(|d| d.join("fundview").join("logs"))
}

/// Install the global subscriber writing to a daily rolling file.
///
/// Stdout is left to command output. The returned guard flushes pending
/// lines when dropped, so keep it alive for the life of `main`.
pub fn init(dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(dir, "fundview.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
