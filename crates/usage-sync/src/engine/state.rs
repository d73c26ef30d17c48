//! The engine's published state.

use chrono::{DateTime, Utc};
use claude_usage::{
    ExtraUsage, HistoricalStats, RateLimitWindow, StatsSummary, DEFAULT_SUBSCRIPTION_LABEL,
};
use serde::Serialize;

/// Guidance shown when no usable credential is stored.
pub const NOT_AUTHENTICATED_MESSAGE: &str = "Run 'claude login' in terminal";

/// Where the refresh state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The last cycle found no credential.
    Unauthenticated,
    /// No fetch in flight.
    Idle,
    /// A usage request is in flight.
    Refreshing,
    /// The server rejected the stored token.
    AuthExpiredRecently,
}

/// Immutable snapshot of everything the engine knows.
///
/// Window fields keep their last fetched value across failed cycles; only a
/// successful fetch replaces them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncState {
    /// 5-hour session window.
    pub session_limit: Option<RateLimitWindow>,
    /// 7-day window across all models.
    pub weekly_limit: Option<RateLimitWindow>,
    /// 7-day Sonnet window.
    pub sonnet_limit: Option<RateLimitWindow>,
    /// 7-day Opus window.
    pub opus_limit: Option<RateLimitWindow>,
    pub extra_usage: Option<ExtraUsage>,
    /// Last successfully decoded local stats.
    pub historical_stats: Option<HistoricalStats>,
    pub subscription_label: String,
    /// True only while a usage request is in flight.
    pub is_loading: bool,
    /// Time of the last successful fetch.
    pub last_updated: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub needs_auth: bool,
    pub phase: Phase,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            session_limit: None,
            weekly_limit: None,
            sonnet_limit: None,
            opus_limit: None,
            extra_usage: None,
            historical_stats: None,
            subscription_label: DEFAULT_SUBSCRIPTION_LABEL.to_string(),
            is_loading: false,
            last_updated: None,
            error_message: None,
            needs_auth: false,
            phase: Phase::Idle,
        }
    }
}

impl SyncState {
    /// `"Updated just now"` within a minute of the last success, else
    /// `"Updated Nm ago"`. `None` before the first success.
    pub fn last_updated_label(&self, now: DateTime<Utc>) -> Option<String> {
        self.last_updated.map(|at| {
            let minutes = (now - at).num_minutes();
            if minutes < 1 {
                "Updated just now".to_string()
            } else {
                format!("Updated {minutes}m ago")
            }
        })
    }

    /// Derived all-time metrics, when local stats have been loaded.
    pub fn stats_summary(&self, now: DateTime<Utc>) -> Option<StatsSummary> {
        self.historical_stats
            .as_ref()
            .map(|stats| StatsSummary::from_stats(stats, now))
    }
}
