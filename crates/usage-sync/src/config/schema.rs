//! TOML configuration schema.
//!
//! Every struct uses `#[serde(default)]`, so an empty file is a valid config.
//! Duration fields are human-readable strings (`"60s"`, `"2m"`) parsed with
//! `humantime` by the accessors below.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::config::xdg;

/// Root configuration.
///
/// ```toml
/// [engine]
/// [logging]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Synchronization engine settings.
    pub engine: EngineSection,
    /// Log output settings.
    pub logging: LoggingSection,
}

impl Config {
    /// Checks every field that is only interpreted lazily.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.refresh_interval()?;
        self.engine.request_timeout()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The `[engine]` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EngineSection {
    /// Time between periodic refresh cycles.
    pub refresh_interval: String,
    /// Upper bound on one usage request.
    pub request_timeout: String,
    /// Location of the Claude Code stats cache. `~` is expanded.
    pub stats_path: String,
    /// Secure-storage service name the credential is stored under.
    pub credential_service: String,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            refresh_interval: "60s".to_string(),
            request_timeout: "10s".to_string(),
            stats_path: "~/.claude/stats-cache.json".to_string(),
            credential_service: claude_usage::KEYCHAIN_SERVICE.to_string(),
        }
    }
}

impl EngineSection {
    /// Parsed `refresh_interval`.
    pub fn refresh_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration("engine.refresh_interval", &self.refresh_interval)
    }

    /// Parsed `request_timeout`.
    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration("engine.request_timeout", &self.request_timeout)
    }

    /// `stats_path` with `~` expanded.
    pub fn stats_path(&self) -> PathBuf {
        xdg::expand_tilde(&self.stats_path)
    }
}

fn parse_duration(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
        reason,
    };
    let duration = humantime::parse_duration(value.trim()).map_err(|e| invalid(e.to_string()))?;
    if duration.is_zero() {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(duration)
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// The `[logging]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingSection {
    /// Verbosity used when `USAGE_SYNC_LOG` is not set.
    pub level: LogLevel,
    /// Log file path. Empty means stderr.
    pub file: String,
}

impl LoggingSection {
    /// The log file with `~` expanded, or `None` for stderr.
    pub fn file_path(&self) -> Option<PathBuf> {
        let trimmed = self.file.trim();
        (!trimmed.is_empty()).then(|| xdg::expand_tilde(trimmed))
    }
}

/// Log verbosity levels (kebab-case in TOML).
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    Warn,
    /// Informational messages.
    #[default]
    Info,
    /// Debug-level detail.
    Debug,
    /// Full trace output.
    Trace,
}

impl LogLevel {
    /// The equivalent `EnvFilter` directive.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
