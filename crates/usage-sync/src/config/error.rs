//! Errors raised while locating, reading, validating or writing the config file.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or type mismatch. `line` and `column` are 1-based, 0 when
    /// the parser reported no span.
    #[error("Invalid configuration at {path}:{line}:{column}: {message}")]
    ParseError {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// Only raised for a path passed on the command line; a missing file at
    /// the default location means defaults.
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// `field` is the dotted key, e.g. `engine.refresh_interval`.
    #[error("Invalid duration for `{field}`: {value:?} ({reason})")]
    InvalidDuration {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Configuration file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("Failed to write configuration file: {path}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the configuration directory")]
    NoConfigDir,
}
