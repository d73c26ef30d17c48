//! # claude-usage
//!
//! Building blocks for reading Claude subscription usage.
//!
//! - Credential lookup from the platform secure store (macOS Keychain, or
//!   `~/.claude/.credentials.json` elsewhere)
//! - An async client for the OAuth usage endpoint
//! - Typed rate-limit windows with reset countdown labels
//! - The local Claude Code stats cache and metrics derived from it
//!
//! ## Example
//!
//! ```rust,ignore
//! use claude_usage::{fetch_credential, platform_store, UsageApi, UsageClient, DEFAULT_TIMEOUT, KEYCHAIN_SERVICE};
//!
//! let store = platform_store();
//! if let Some(credential) = fetch_credential(store.as_ref(), KEYCHAIN_SERVICE) {
//!     let client = UsageClient::new(DEFAULT_TIMEOUT)?;
//!     let usage = client.fetch_usage(&credential.access_token).await?;
//!     if let Some(session) = usage.five_hour {
//!         println!("5h: {:.0}%", session.utilization);
//!     }
//! }
//! ```

pub mod client;
pub mod credentials;
pub mod error;
pub mod metrics;
pub mod stats;
pub mod types;

pub use client::{decode_usage, UsageApi, UsageClient, DEFAULT_TIMEOUT, USAGE_API_URL};
#[cfg(target_os = "macos")]
pub use credentials::KeychainStore;
pub use credentials::{
    decode_credential, fetch_credential, platform_store, Credential, CredentialStore, FileStore,
    MemoryStore, DEFAULT_SUBSCRIPTION_LABEL, KEYCHAIN_SERVICE,
};
pub use error::{ApiError, CredentialError, Error, StatsError};
pub use metrics::{
    active_days, days_since_first_session, most_active_hour, total_cache_tokens, total_messages,
    total_sessions, total_tokens, total_tool_calls, StatsSummary, NO_PEAK_HOUR,
};
pub use stats::{default_stats_path, load_historical_stats, HistoricalStats};
pub use types::{ExtraUsage, RateLimitWindow, UsageData};
