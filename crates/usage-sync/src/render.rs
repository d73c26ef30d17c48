//! Plain-text rendering of a [`SyncState`] for the terminal.

use chrono::{DateTime, Utc};
use claude_usage::{ExtraUsage, RateLimitWindow};

use crate::engine::SyncState;

/// Multi-line summary of `state` with countdowns relative to `now`.
pub fn render_summary(state: &SyncState, now: DateTime<Utc>) -> String {
    let mut lines = Vec::new();

    let mut header = format!("Claude {}", state.subscription_label);
    if state.is_loading {
        header.push_str(" | Refreshing...");
    } else if let Some(updated) = state.last_updated_label(now) {
        header.push_str(" | ");
        header.push_str(&updated);
    }
    lines.push(header);

    for (name, window) in [
        ("Session", &state.session_limit),
        ("Weekly", &state.weekly_limit),
        ("Sonnet", &state.sonnet_limit),
        ("Opus", &state.opus_limit),
    ] {
        if let Some(window) = window {
            lines.push(window_line(name, window, now));
        }
    }

    if let Some(extra) = state.extra_usage.as_ref().filter(|e| e.is_enabled) {
        lines.push(extra_usage_line(extra));
    }

    if let Some(message) = &state.error_message {
        lines.push(format!("! {message}"));
    }

    if let Some(summary) = state.stats_summary(now) {
        lines.push(format!(
            "Messages {} | Sessions {} | Tool calls {} | Days active {} | Peak hour {}",
            summary.messages,
            summary.sessions,
            summary.tool_calls,
            summary.days_since_first_session,
            summary.peak_hour
        ));
    }

    lines.join("\n")
}

fn window_line(name: &str, window: &RateLimitWindow, now: DateTime<Utc>) -> String {
    let pct = format!("{:.0}%", window.utilization);
    match window.reset_countdown_at(now) {
        Some(countdown) => {
            let clock = window
                .reset_clock_label()
                .map(|label| format!(" ({label})"))
                .unwrap_or_default();
            format!("{name:<8}{pct:>5}  resets in {countdown}{clock}")
        }
        None => format!("{name:<8}{pct:>5}"),
    }
}

fn extra_usage_line(extra: &ExtraUsage) -> String {
    match (extra.used_credits, extra.monthly_limit) {
        (Some(used), Some(limit)) => format!("Extra usage ${used:.2} of ${limit:.2}"),
        (Some(used), None) => format!("Extra usage ${used:.2}"),
        _ => "Extra usage enabled".to_string(),
    }
}
