//! File-based tracing setup shared by the CLI binaries.
//!
//! Each tool writes a timestamped log to its own fixed file name in the
//! working directory (`retag.log`, `runscript.log`, `setprofile.log`),
//! at DEBUG level when `--debug` is set and INFO otherwise. Terminal
//! output stays on stdout/stderr; the log file is for after-the-fact
//! troubleshooting of API interactions.

use std::sync::Arc;
use tracing::Level;

use crate::error::{FalconError, Result};

/// Installs a global tracing subscriber appending to `path`.
///
/// Must be called at most once per process, before any API call.
pub fn init_file_logging(path: &str, debug: bool) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| FalconError::Config(format!("cannot open log file {path}: {e}")))?;

    let level = if debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .init();

    Ok(())
}
