//! Type definitions for Anthropic usage API responses.
//!
//! This module defines the structures that map to the JSON response
//! from the Anthropic OAuth usage API, plus the relative-time labels derived
//! from a window's reset instant.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Remote rate-limit snapshot returned by the usage endpoint.
///
/// Every window is optional: the server omits windows that do not apply to
/// the account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UsageData {
    /// 5-hour rolling session window.
    #[serde(default)]
    pub five_hour: Option<RateLimitWindow>,

    /// 7-day rolling window across all models.
    #[serde(default)]
    pub seven_day: Option<RateLimitWindow>,

    /// 7-day window for OAuth applications.
    #[serde(default)]
    pub seven_day_oauth_apps: Option<RateLimitWindow>,

    /// 7-day Opus-specific window.
    #[serde(default)]
    pub seven_day_opus: Option<RateLimitWindow>,

    /// 7-day Sonnet-specific window.
    #[serde(default)]
    pub seven_day_sonnet: Option<RateLimitWindow>,

    /// 7-day Cowork window.
    #[serde(default)]
    pub seven_day_cowork: Option<RateLimitWindow>,

    /// Undocumented window the server reports under this key.
    #[serde(default)]
    pub iguana_necktie: Option<RateLimitWindow>,

    /// Extra usage billing information (if present).
    #[serde(default)]
    pub extra_usage: Option<ExtraUsage>,
}

/// Utilisation of one rolling rate-limit window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitWindow {
    /// Percentage of quota used (0.0 - 100.0+).
    ///
    /// Values over 100.0 indicate quota exceeded.
    pub utilization: f64,

    /// When this window's quota resets.
    ///
    /// `None` when the server sent no reset time or one that is not a valid
    /// RFC 3339 timestamp.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub resets_at: Option<DateTime<Utc>>,
}

/// Extra usage (pay-as-you-go credits) information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtraUsage {
    /// Whether extra usage billing is enabled.
    pub is_enabled: bool,

    /// Monthly spending limit, if set.
    #[serde(default)]
    pub monthly_limit: Option<f64>,

    /// Credits consumed this month, if reported.
    #[serde(default)]
    pub used_credits: Option<f64>,

    /// Percentage of the monthly limit consumed, if reported.
    #[serde(default)]
    pub utilization: Option<f64>,
}

/// Parses an optional RFC 3339 string, mapping anything unparseable to `None`
/// so one odd timestamp cannot fail the whole response.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }))
}

impl RateLimitWindow {
    /// Time remaining until this window resets, relative to `now`.
    ///
    /// Returns `None` if reset time is not available. Negative when the reset
    /// instant has passed.
    pub fn time_until_reset_at(&self, now: DateTime<Utc>) -> Option<chrono::TimeDelta> {
        self.resets_at.map(|reset| reset - now)
    }

    /// Compact countdown label relative to `now`.
    ///
    /// `"now"` when the reset instant is not strictly in the future, else the
    /// two coarsest units: `"1d 2h"` past 24 hours, `"3h 15m"` past one hour,
    /// otherwise `"42m"`. `None` when no reset time is known.
    pub fn reset_countdown_at(&self, now: DateTime<Utc>) -> Option<String> {
        self.time_until_reset_at(now)
            .map(|remaining| format_countdown(remaining.num_seconds()))
    }

    /// [`reset_countdown_at`](Self::reset_countdown_at) against the wall clock.
    pub fn reset_countdown(&self) -> Option<String> {
        self.reset_countdown_at(Utc::now())
    }

    /// Reset instant rendered in `tz` as weekday and 12-hour clock time,
    /// e.g. `"Mon 2:05 PM"`.
    pub fn reset_clock_label_in<Tz>(&self, tz: &Tz) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.resets_at
            .map(|reset| reset.with_timezone(tz).format("%a %-I:%M %p").to_string())
    }

    /// [`reset_clock_label_in`](Self::reset_clock_label_in) in local time.
    pub fn reset_clock_label(&self) -> Option<String> {
        self.reset_clock_label_in(&Local)
    }
}

fn format_countdown(seconds: i64) -> String {
    if seconds <= 0 {
        return "now".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 24 {
        format!("{}d {}h", hours / 24, hours % 24)
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn window_resetting_in(now: DateTime<Utc>, delta: Duration) -> RateLimitWindow {
        RateLimitWindow {
            utilization: 10.0,
            resets_at: Some(now + delta),
        }
    }

    #[test]
    fn test_parse_full_response() {
        let json = r#"{
            "five_hour": {
                "utilization": 8.0,
                "resets_at": "2026-01-22T09:00:00.123456+00:00"
            },
            "seven_day": {
                "utilization": 77.0,
                "resets_at": "2026-01-22T19:00:00Z"
            },
            "seven_day_oauth_apps": null,
            "seven_day_opus": {
                "utilization": 12.5,
                "resets_at": null
            },
            "seven_day_sonnet": {
                "utilization": 0.0,
                "resets_at": "2026-01-25T00:00:00Z"
            },
            "seven_day_cowork": null,
            "iguana_necktie": null,
            "extra_usage": {
                "is_enabled": true,
                "monthly_limit": 100.0,
                "used_credits": 5.5,
                "utilization": 5.5
            }
        }"#;

        let usage: UsageData = serde_json::from_str(json).expect("should parse");
        let five_hour = usage.five_hour.expect("five_hour present");
        assert!((five_hour.utilization - 8.0).abs() < f64::EPSILON);
        assert_eq!(
            five_hour.resets_at.map(|t| t.timestamp_subsec_micros()),
            Some(123_456)
        );
        assert!(usage.seven_day.is_some());
        assert!(usage.seven_day_oauth_apps.is_none());
        assert!(usage.seven_day_opus.expect("opus").resets_at.is_none());
        let extra = usage.extra_usage.expect("extra_usage present");
        assert!(extra.is_enabled);
        assert_eq!(extra.monthly_limit, Some(100.0));
        assert_eq!(extra.used_credits, Some(5.5));
    }

    #[test]
    fn test_parse_minimal_response() {
        let usage: UsageData = serde_json::from_str("{}").expect("should parse");
        assert_eq!(usage, UsageData::default());
    }

    #[test]
    fn test_parse_tolerates_unknown_windows() {
        let json = r#"{"five_hour": {"utilization": 1.0}, "brand_new_window": {"utilization": 3.0}}"#;
        let usage: UsageData = serde_json::from_str(json).expect("should parse");
        assert!(usage.five_hour.expect("five_hour").resets_at.is_none());
    }

    #[test]
    fn test_unparseable_reset_time_is_absent() {
        let json = r#"{"utilization": 50.0, "resets_at": "next tuesday"}"#;
        let window: RateLimitWindow = serde_json::from_str(json).expect("should parse");
        assert!(window.resets_at.is_none());
        assert!(window.reset_countdown().is_none());
    }

    #[test]
    fn test_utilization_above_100_is_kept() {
        let json = r#"{"utilization": 104.2}"#;
        let window: RateLimitWindow = serde_json::from_str(json).expect("should parse");
        assert!((window.utilization - 104.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_extra_usage_disabled_without_amounts() {
        let json = r#"{"is_enabled": false}"#;
        let extra: ExtraUsage = serde_json::from_str(json).expect("should parse");
        assert!(!extra.is_enabled);
        assert!(extra.monthly_limit.is_none());
        assert!(extra.used_credits.is_none());
        assert!(extra.utilization.is_none());
    }

    #[test]
    fn test_countdown_minutes_only() {
        let now = Utc::now();
        let window = window_resetting_in(now, Duration::minutes(30));
        assert_eq!(window.reset_countdown_at(now).as_deref(), Some("30m"));
    }

    #[test]
    fn test_countdown_days_and_hours() {
        let now = Utc::now();
        let window = window_resetting_in(now, Duration::hours(26));
        assert_eq!(window.reset_countdown_at(now).as_deref(), Some("1d 2h"));
    }

    #[test]
    fn test_countdown_hours_and_minutes() {
        let now = Utc::now();
        let window = window_resetting_in(now, Duration::minutes(3 * 60 + 15));
        assert_eq!(window.reset_countdown_at(now).as_deref(), Some("3h 15m"));
    }

    #[test]
    fn test_countdown_exactly_24_hours_stays_in_hours() {
        let now = Utc::now();
        let window = window_resetting_in(now, Duration::hours(24));
        assert_eq!(window.reset_countdown_at(now).as_deref(), Some("24h 0m"));
    }

    #[test]
    fn test_countdown_past_is_now() {
        let now = Utc::now();
        let window = window_resetting_in(now, Duration::minutes(-5));
        assert_eq!(window.reset_countdown_at(now).as_deref(), Some("now"));
    }

    #[test]
    fn test_countdown_at_reset_instant_is_now() {
        let now = Utc::now();
        let window = window_resetting_in(now, Duration::zero());
        assert_eq!(window.reset_countdown_at(now).as_deref(), Some("now"));
    }

    #[test]
    fn test_countdown_recomputed_against_now() {
        let now = Utc::now();
        let window = window_resetting_in(now, Duration::hours(2));
        let later = now + Duration::minutes(90);
        assert_eq!(window.reset_countdown_at(now).as_deref(), Some("2h 0m"));
        assert_eq!(window.reset_countdown_at(later).as_deref(), Some("30m"));
    }

    #[test]
    fn test_reset_clock_label_format() {
        let window = RateLimitWindow {
            utilization: 0.0,
            resets_at: Some(
                DateTime::parse_from_rfc3339("2026-01-19T14:05:00Z")
                    .expect("valid timestamp")
                    .with_timezone(&Utc),
            ),
        };
        assert_eq!(
            window.reset_clock_label_in(&Utc).as_deref(),
            Some("Mon 2:05 PM")
        );
    }

    #[test]
    fn test_reset_clock_label_absent_without_reset() {
        let window = RateLimitWindow {
            utilization: 0.0,
            resets_at: None,
        };
        assert!(window.reset_clock_label().is_none());
    }
}
