//! Diagnostic logging.
//!
//! The terminal belongs to the dashboard, so log output goes to a file or
//! nowhere. `RUST_LOG` overrides the configured level, e.g.
//! `RUST_LOG=brickwatch=debug`.

use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Error type for logging initialization
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to open log file: {0}")]
    FileOpen(#[from] io::Error),

    #[error("failed to set global subscriber: {0}")]
    SetSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber writing to `file`.
///
/// Without a file nothing is installed and events are discarded.
pub fn init_logging(level: &str, file: Option<&Path>) -> Result<(), LogError> {
    let Some(path) = file else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_target(true)
            .with_ansi(false),
    );
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
