//! Spark connectivity classification.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::duration::{age_since, format_age};
use crate::client::Heartbeat;

/// Heartbeat age limits for Spark connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparkThresholds {
    /// Ages up to and including this are `Connected`.
    pub fresh_max: Duration,
    /// Ages up to and including this are `Stale`; beyond is `Disconnected`.
    pub stale_max: Duration,
}

impl Default for SparkThresholds {
    fn default() -> Self {
        Self {
            fresh_max: Duration::from_secs(60),
            stale_max: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SparkStatus {
    Connected,
    Stale,
    Disconnected,
    Unknown,
}

impl SparkStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SparkStatus::Connected => "CONNECTED",
            SparkStatus::Stale => "STALE",
            SparkStatus::Disconnected => "DISCONNECTED",
            SparkStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Classify a heartbeat age. Ties go to the fresher bucket.
pub fn classify_age(age: Duration, thresholds: &SparkThresholds) -> SparkStatus {
    if age <= thresholds.fresh_max {
        SparkStatus::Connected
    } else if age <= thresholds.stale_max {
        SparkStatus::Stale
    } else {
        SparkStatus::Disconnected
    }
}

/// Classify the heartbeat probe payload.
///
/// `None` means the probe produced no heartbeat data at all.
pub fn classify(
    heartbeat: Option<&Heartbeat>,
    now: DateTime<Utc>,
    thresholds: &SparkThresholds,
) -> SparkStatus {
    match heartbeat {
        None => SparkStatus::Unknown,
        Some(Heartbeat::Never) => SparkStatus::Disconnected,
        Some(Heartbeat::Seen { at }) => classify_age(age_since(*at, now), thresholds),
    }
}

/// Human-readable Spark line, e.g. "Connected (heartbeat 12s ago)".
pub fn describe(status: SparkStatus, heartbeat: Option<&Heartbeat>, now: DateTime<Utc>) -> String {
    let age = match heartbeat {
        Some(Heartbeat::Seen { at }) => Some(format_age(age_since(*at, now))),
        _ => None,
    };
    match (status, age) {
        (SparkStatus::Connected, Some(age)) => format!("Connected (heartbeat {} ago)", age),
        (SparkStatus::Stale, Some(age)) => format!("Stale (heartbeat {} ago)", age),
        (SparkStatus::Disconnected, Some(age)) => {
            format!("Disconnected (last heartbeat {} ago)", age)
        }
        (SparkStatus::Disconnected, None) => "Disconnected (no heartbeat)".to_string(),
        (SparkStatus::Unknown, _) if heartbeat.is_none() => "Unknown".to_string(),
        (status, _) => status.label().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_boundaries() {
        let t = SparkThresholds::default();
        assert_eq!(classify_age(secs(0), &t), SparkStatus::Connected);
        assert_eq!(classify_age(secs(60), &t), SparkStatus::Connected);
        assert_eq!(classify_age(secs(61), &t), SparkStatus::Stale);
        assert_eq!(classify_age(secs(300), &t), SparkStatus::Stale);
        assert_eq!(classify_age(secs(301), &t), SparkStatus::Disconnected);
    }

    #[test]
    fn test_no_heartbeat_data_is_unknown() {
        let t = SparkThresholds::default();
        assert_eq!(classify(None, Utc::now(), &t), SparkStatus::Unknown);
    }

    #[test]
    fn test_never_seen_is_disconnected() {
        let t = SparkThresholds::default();
        assert_eq!(
            classify(Some(&Heartbeat::Never), Utc::now(), &t),
            SparkStatus::Disconnected
        );
    }

    #[test]
    fn test_classify_from_timestamp() {
        let t = SparkThresholds::default();
        let now = Utc::now();
        let hb = Heartbeat::Seen {
            at: now - chrono::Duration::seconds(120),
        };
        assert_eq!(classify(Some(&hb), now, &t), SparkStatus::Stale);
        assert_eq!(
            describe(SparkStatus::Stale, Some(&hb), now),
            "Stale (heartbeat 2m ago)"
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let t = SparkThresholds {
            fresh_max: secs(5),
            stale_max: secs(10),
        };
        assert_eq!(classify_age(secs(6), &t), SparkStatus::Stale);
        assert_eq!(classify_age(secs(11), &t), SparkStatus::Disconnected);
    }

    #[test]
    fn test_describe_without_heartbeat() {
        let now = Utc::now();
        assert_eq!(describe(SparkStatus::Unknown, None, now), "Unknown");
        assert_eq!(
            describe(SparkStatus::Disconnected, Some(&Heartbeat::Never), now),
            "Disconnected (no heartbeat)"
        );
    }
}
