//! Display priority and urgency.
//!
//! `priority = severity score + parameter weight + recency bonus`. The
//! ordering produced by [`sort_by_priority`] (priority descending, then
//! reading time descending) is part of the public contract consumed by
//! display layers.

use std::cmp::Ordering;

use chrono::Duration;

use crate::alert::{Alert, Severity, Urgency};
use crate::types::Timestamp;

/// Bonus for alerts whose reading is younger than one hour.
pub const RECENT_BONUS: i32 = 20;

/// Bonus for alerts whose reading is younger than six hours.
pub const FRESH_BONUS: i32 = 10;

pub fn severity_score(severity: Severity) -> i32 {
    match severity {
        Severity::High => 100,
        Severity::Medium => 50,
        Severity::Low => 10,
    }
}

fn recency_bonus(timestamp: Timestamp, now: Timestamp) -> i32 {
    let age = now.signed_duration_since(timestamp);
    if age < Duration::hours(1) {
        RECENT_BONUS
    } else if age < Duration::hours(6) {
        FRESH_BONUS
    } else {
        0
    }
}

/// Urgency derived from severity.
pub fn urgency_for(severity: Severity) -> Urgency {
    match severity {
        Severity::High => Urgency::Immediate,
        Severity::Medium => Urgency::Soon,
        Severity::Low => Urgency::Monitor,
    }
}

/// Priority score for an alert at time `now`.
pub fn priority_score(alert: &Alert, now: Timestamp) -> i32 {
    let weight = alert.kind().map(|p| p.weight()).unwrap_or(0);
    severity_score(alert.severity) + weight + recency_bonus(alert.timestamp, now)
}

/// Fill in priority and urgency on an enriched alert.
pub fn prioritize(mut alert: Alert, now: Timestamp) -> Alert {
    alert.priority = priority_score(&alert, now);
    alert.urgency = urgency_for(alert.severity);
    alert
}

/// Priority descending, then reading time descending.
pub fn compare_priority(a: &Alert, b: &Alert) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.timestamp.cmp(&a.timestamp))
}

/// Sort in display order.
pub fn sort_by_priority(alerts: &mut [Alert]) {
    alerts.sort_by(compare_priority);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
