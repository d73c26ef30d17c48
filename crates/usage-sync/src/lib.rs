//! Usage sync library
//!
//! Keeps a live picture of a Claude subscription's rate-limit consumption.
//! The [`engine`] polls the usage endpoint on a timer or on demand, folds in
//! the local stats cache, and publishes immutable [`SyncState`] snapshots to
//! any number of observers.
//!
//! # Platform Support
//!
//! Credentials come from the macOS Keychain when available and from
//! `~/.claude/.credentials.json` otherwise. Signal handling in the binary
//! (SIGINT, SIGTERM, SIGUSR1) is Unix-only.

/// Configuration loading, schema and XDG path resolution.
pub mod config;

/// The synchronization engine and its published state.
pub mod engine;

/// Tracing subscriber setup.
pub mod logging;

/// Plain-text rendering of engine snapshots.
pub mod render;

pub use engine::{
    Command, EngineConfig, EngineHandle, Phase, SyncEngine, SyncState, DEFAULT_REFRESH_INTERVAL,
    NOT_AUTHENTICATED_MESSAGE,
};
