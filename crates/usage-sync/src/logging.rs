//! Logging initialization.
//!
//! Filter directives come from the `USAGE_SYNC_LOG` environment variable and
//! fall back to the configured level when it is unset or invalid.
//!
//! ```bash
//! USAGE_SYNC_LOG=debug usage-sync watch
//! USAGE_SYNC_LOG=usage_sync=trace,claude_usage=debug usage-sync once
//! ```

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingSection;

/// Environment variable holding filter directives.
pub const LOG_ENV_VAR: &str = "USAGE_SYNC_LOG";

/// Error type returned by subscriber installation.
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Builds the filter: `USAGE_SYNC_LOG` when valid, else `fallback`.
pub fn filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global tracing subscriber.
///
/// Writes to stderr, or appends to `logging.file` when set. Fails if the log
/// file cannot be opened or a subscriber is already installed.
pub fn init(logging: &LoggingSection) -> Result<(), InitError> {
    let filter = filter(logging.level.as_directive());

    match logging.file_path() {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
    }
}
