//! Credential retrieval for Claude Code OAuth tokens.
//!
//! Credentials are written by Claude Code itself (`claude login`); this crate
//! only ever reads them. Storage is abstracted behind [`CredentialStore`] so
//! the backend can be swapped per platform:
//! - macOS: Keychain generic password ([`KeychainStore`])
//! - elsewhere: `~/.claude/.credentials.json` ([`FileStore`])
//! - tests and embedders: [`MemoryStore`]
//!
//! # Security
//!
//! Tokens are read fresh for every poll and never logged. The `Debug`
//! implementation of [`Credential`] redacts both tokens.

#[cfg(target_os = "macos")]
mod macos;

mod file;

#[cfg(target_os = "macos")]
pub use macos::KeychainStore;

pub use file::FileStore;

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::CredentialError;

/// Service name Claude Code uses for its secure-storage entry.
pub const KEYCHAIN_SERVICE: &str = "Claude Code-credentials";

/// Path to the credentials file, relative to the home directory.
pub const CREDENTIALS_FILE_PATH: &str = ".claude/.credentials.json";

/// Label shown when the credential carries no subscription type.
pub const DEFAULT_SUBSCRIPTION_LABEL: &str = "Pro";

/// Keyed lookup into a secure-storage facility.
///
/// Implementations return the raw stored bytes; decoding is done by
/// [`decode_credential`] so every backend shares one payload format.
pub trait CredentialStore: Send + Sync {
    /// Returns the bytes stored under `service`.
    ///
    /// # Errors
    ///
    /// [`CredentialError::NotFound`] when there is no entry, or
    /// [`CredentialError::Io`] when the backend could not be read.
    fn lookup(&self, service: &str) -> Result<Vec<u8>, CredentialError>;
}

/// Decoded Claude Code OAuth credential.
#[derive(Clone, PartialEq)]
pub struct Credential {
    /// Bearer token for the usage API.
    pub access_token: String,
    /// Refresh token. Never used by this crate; the login tool owns rotation.
    pub refresh_token: String,
    /// Expiry instant of `access_token`.
    pub expires_at: DateTime<Utc>,
    /// Raw subscription type (e.g. `"max"`), if present.
    pub subscription_type: Option<String>,
    /// Raw rate limit tier, if present.
    pub rate_limit_tier: Option<String>,
}

impl Credential {
    /// Human-facing subscription label: each word capitalised, or `"Pro"`
    /// when the payload has no subscription type.
    pub fn subscription_label(&self) -> String {
        match self.subscription_type.as_deref() {
            Some(kind) if !kind.trim().is_empty() => capitalize_words(kind),
            _ => DEFAULT_SUBSCRIPTION_LABEL.to_string(),
        }
    }

    /// Whether `expires_at` is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("subscription_type", &self.subscription_type)
            .field("rate_limit_tier", &self.rate_limit_tier)
            .finish()
    }
}

/// Wire shape of the stored payload.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCredentials {
    claude_ai_oauth: Option<StoredOauth>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredOauth {
    access_token: String,
    refresh_token: String,
    /// Epoch milliseconds.
    expires_at: i64,
    #[serde(default)]
    subscription_type: Option<String>,
    #[serde(default)]
    rate_limit_tier: Option<String>,
}

/// Decode the stored credential payload.
///
/// # Errors
///
/// [`CredentialError::Decode`] when the bytes are not UTF-8 JSON of the
/// expected shape, and [`CredentialError::NotFound`] when the payload is
/// well-formed but carries no `claudeAiOauth` section.
pub fn decode_credential(bytes: &[u8]) -> Result<Credential, CredentialError> {
    // Generic message so credential bytes never end up in an error string.
    let content = std::str::from_utf8(bytes)
        .map_err(|_| CredentialError::Decode("Invalid UTF-8 in credentials".to_string()))?;

    let stored: StoredCredentials = serde_json::from_str(content.trim())
        .map_err(|e| CredentialError::Decode(e.to_string()))?;

    let oauth = stored.claude_ai_oauth.ok_or(CredentialError::NotFound)?;

    let expires_at = DateTime::<Utc>::from_timestamp_millis(oauth.expires_at)
        .ok_or_else(|| CredentialError::Decode("expiresAt out of range".to_string()))?;

    Ok(Credential {
        access_token: oauth.access_token,
        refresh_token: oauth.refresh_token,
        expires_at,
        subscription_type: oauth.subscription_type,
        rate_limit_tier: oauth.rate_limit_tier,
    })
}

/// Read and decode the credential stored under `service`.
///
/// Returns `None` when the entry is missing *or* cannot be decoded: a
/// corrupted entry means "not logged in" just as much as a missing one.
/// Never panics on malformed bytes.
pub fn fetch_credential(store: &dyn CredentialStore, service: &str) -> Option<Credential> {
    let result = store.lookup(service).and_then(|bytes| decode_credential(&bytes));
    match result {
        Ok(credential) => Some(credential),
        Err(CredentialError::NotFound) => {
            debug!(service, "no stored credentials");
            None
        }
        Err(e) => {
            debug!(service, error = %e, "stored credentials unusable, treating as absent");
            None
        }
    }
}

/// The store Claude Code writes to on the current platform.
pub fn platform_store() -> Box<dyn CredentialStore> {
    #[cfg(target_os = "macos")]
    {
        Box::new(KeychainStore)
    }

    #[cfg(not(target_os = "macos"))]
    {
        match FileStore::in_home() {
            Some(store) => Box::new(store),
            None => Box::new(MemoryStore::new()),
        }
    }
}

/// In-memory [`CredentialStore`].
///
/// Entries can be replaced at any time, which lets tests simulate a token
/// being rotated or removed by the login tool between polls.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `bytes` under `service`.
    pub fn with_entry(service: &str, bytes: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.insert(service, bytes);
        store
    }

    /// Sets the entry for `service`.
    pub fn insert(&self, service: &str, bytes: impl Into<Vec<u8>>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(service.to_string(), bytes.into());
    }

    /// Removes the entry for `service`.
    pub fn remove(&self, service: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(service);
    }
}

impl CredentialStore for MemoryStore {
    fn lookup(&self, service: &str) -> Result<Vec<u8>, CredentialError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(service).cloned().ok_or(CredentialError::NotFound)
    }
}

fn capitalize_words(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
