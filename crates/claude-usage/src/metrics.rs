//! Derived metrics over [`HistoricalStats`].
//!
//! Pure functions; every missing count is treated as zero here and nowhere
//! else. Sums saturate at `u64::MAX`. Functions that depend on the current time take `now` explicitly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::stats::HistoricalStats;

/// Returned by [`most_active_hour`] when no hour can be determined.
pub const NO_PEAK_HOUR: &str = "N/A";

/// Sum of tool calls across all days.
pub fn total_tool_calls(stats: &HistoricalStats) -> u64 {
    stats
        .daily_activity
        .iter()
        .map(|day| day.tool_call_count.unwrap_or(0))
        .fold(0, u64::saturating_add)
}

/// Sum of input and output tokens across all models.
pub fn total_tokens(stats: &HistoricalStats) -> u64 {
    stats
        .model_usage
        .values()
        .map(|m| {
            m.input_tokens
                .unwrap_or(0)
                .saturating_add(m.output_tokens.unwrap_or(0))
        })
        .fold(0, u64::saturating_add)
}

/// Sum of cache read and cache creation tokens across all models.
pub fn total_cache_tokens(stats: &HistoricalStats) -> u64 {
    stats
        .model_usage
        .values()
        .map(|m| {
            m.cache_read_tokens
                .unwrap_or(0)
                .saturating_add(m.cache_creation_tokens.unwrap_or(0))
        })
        .fold(0, u64::saturating_add)
}

/// Recorded message total, zero when missing.
pub fn total_messages(stats: &HistoricalStats) -> u64 {
    stats.total_messages.unwrap_or(0)
}

/// Recorded session total, zero when missing.
pub fn total_sessions(stats: &HistoricalStats) -> u64 {
    stats.total_sessions.unwrap_or(0)
}

/// The busiest hour of day as a 12-hour label such as `"2pm"`.
///
/// When several hours share the maximum count, any one of them may be
/// returned. Returns [`NO_PEAK_HOUR`] when there are no hour counts or the
/// winning key is not an hour in `0..=23`.
pub fn most_active_hour(stats: &HistoricalStats) -> String {
    let winner = stats
        .hour_counts
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(hour, _)| hour);

    winner
        .and_then(|hour| hour.trim().parse::<u32>().ok())
        .and_then(hour_label)
        .unwrap_or_else(|| NO_PEAK_HOUR.to_string())
}

fn hour_label(hour: u32) -> Option<String> {
    let suffix = match hour {
        0..=11 => "am",
        12..=23 => "pm",
        _ => return None,
    };
    let clock = match hour % 12 {
        0 => 12,
        h => h,
    };
    Some(format!("{clock}{suffix}"))
}

/// Whole days between the first recorded session and `now`.
///
/// Zero when the date is missing, unparseable, or in the future.
pub fn days_since_first_session(stats: &HistoricalStats, now: DateTime<Utc>) -> i64 {
    stats
        .first_session_date
        .as_deref()
        .and_then(parse_session_date)
        .map(|first| (now - first).num_days().max(0))
        .unwrap_or(0)
}

/// Accepts a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
fn parse_session_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Days in the activity list with any messages, sessions or tool calls.
pub fn active_days(stats: &HistoricalStats) -> usize {
    stats
        .daily_activity
        .iter()
        .filter(|day| {
            day.message_count.unwrap_or(0) > 0
                || day.session_count.unwrap_or(0) > 0
                || day.tool_call_count.unwrap_or(0) > 0
        })
        .count()
}

/// All-time figures bundled for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub messages: u64,
    pub sessions: u64,
    pub tool_calls: u64,
    pub tokens: u64,
    pub cache_tokens: u64,
    pub days_since_first_session: i64,
    pub active_days: usize,
    pub peak_hour: String,
}

impl StatsSummary {
    /// Computes every metric from one snapshot.
    pub fn from_stats(stats: &HistoricalStats, now: DateTime<Utc>) -> Self {
        Self {
            messages: total_messages(stats),
            sessions: total_sessions(stats),
            tool_calls: total_tool_calls(stats),
            tokens: total_tokens(stats),
            cache_tokens: total_cache_tokens(stats),
            days_since_first_session: days_since_first_session(stats, now),
            active_days: active_days(stats),
            peak_hour: most_active_hour(stats),
        }
    }
}
