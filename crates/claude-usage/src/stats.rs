//! Local historical statistics written by Claude Code.
//!
//! Claude Code periodically aggregates its transcripts into
//! `~/.claude/stats-cache.json`. That file is produced by an independent
//! process and may be stale or partially populated, so every field here is
//! optional. "Missing" and "zero" are kept distinct; aggregation in
//! [`crate::metrics`] is where missing becomes zero.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::StatsError;

/// Path to the stats cache, relative to the home directory.
pub const STATS_CACHE_PATH: &str = ".claude/stats-cache.json";

/// Snapshot of the local stats cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalStats {
    /// Total sessions ever recorded.
    #[serde(default)]
    pub total_sessions: Option<u64>,

    /// Total messages ever recorded.
    #[serde(default)]
    pub total_messages: Option<u64>,

    /// The longest single session.
    #[serde(default)]
    pub longest_session: Option<LongestSession>,

    /// Token counts keyed by model name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub model_usage: BTreeMap<String, ModelTokens>,

    /// ISO-8601 timestamp of the first recorded session.
    #[serde(default)]
    pub first_session_date: Option<String>,

    /// Message counts keyed by hour of day (`"0"` to `"23"`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub hour_counts: BTreeMap<String, u64>,

    /// Per-day activity in the order the file lists it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub daily_activity: Vec<DailyActivity>,
}

/// Longest-session record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LongestSession {
    /// Session duration in milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
    /// Messages exchanged in the session.
    #[serde(default)]
    pub message_count: Option<u64>,
}

/// Token counts for one model.
///
/// Claude Code writes the cache fields as `cacheReadInputTokens` /
/// `cacheCreationInputTokens`; the shorter names are accepted as well.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelTokens {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
    #[serde(default, alias = "cacheReadInputTokens")]
    pub cache_read_tokens: Option<u64>,
    #[serde(default, alias = "cacheCreationInputTokens")]
    pub cache_creation_tokens: Option<u64>,
}

/// Activity for one calendar day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    /// Day as `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub message_count: Option<u64>,
    #[serde(default)]
    pub session_count: Option<u64>,
    #[serde(default)]
    pub tool_call_count: Option<u64>,
}

/// Treats an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `~/.claude/stats-cache.json`, or `None` when the home directory cannot be
/// determined.
pub fn default_stats_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(STATS_CACHE_PATH))
}

/// Load the stats cache at `path`.
///
/// Returns `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// [`StatsError::Io`] when the file exists but cannot be read, and
/// [`StatsError::Decode`] when it is not valid stats JSON. Callers are
/// expected to keep their previous snapshot in both cases.
pub fn load_historical_stats(path: &Path) -> Result<Option<HistoricalStats>, StatsError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "stats cache not present");
            return Ok(None);
        }
        Err(source) => {
            return Err(StatsError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StatsError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
