//! Number, date and row formatting for alert display.
//!
//! Everything here is a pure function of its inputs (the local timezone aside),
//! so the display tree and the terminal painter share one source of text.

#![allow(missing_docs)]

use chrono::{Local, TimeZone};

use crate::store::AlertRecord;

/// Scores strictly above this render in the danger tone.
pub const DANGER_THRESHOLD: f64 = 0.8;

/// Fixed badge shown in the status column of every alert row.
pub const ALERT_BADGE: &str = "ALERT";

/// Text used when a timestamp cannot be represented in local time.
const INVALID_TIME: &str = "-";

/// Visual emphasis for a score cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreTone {
    Warning,
    Danger,
}

impl ScoreTone {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// Tone for a score: danger only when strictly greater than 0.8.
#[must_use]
pub fn score_tone(score: f64) -> ScoreTone {
    if score > DANGER_THRESHOLD {
        ScoreTone::Danger
    } else {
        ScoreTone::Warning
    }
}

/// Fixed four-decimal score text; an absent score renders as zero.
#[must_use]
pub fn format_score(score: Option<f64>) -> String {
    format!("{:.4}", score.unwrap_or(0.0))
}

/// Epoch seconds rendered as `YYYY-MM-DD HH:MM:SS` in the viewer's timezone.
#[must_use]
pub fn format_local_timestamp(timestamp: i64) -> String {
    let Some(millis) = timestamp.checked_mul(1000) else {
        return INVALID_TIME.to_string();
    };
    Local
        .timestamp_millis_opt(millis)
        .earliest()
        .map_or_else(
            || INVALID_TIME.to_string(),
            |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        )
}

/// `src -> dst` address pair used by the compact preview row.
#[must_use]
pub fn format_route(src_ip: &str, dst_ip: &str) -> String {
    format!("{src_ip} -> {dst_ip}")
}

/// `ip:port` endpoint used by the detailed history row.
#[must_use]
pub fn format_endpoint(ip: &str, port: u16) -> String {
    format!("{ip}:{port}")
}

/// Preview table row: time, route, score, badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactRow {
    pub time: String,
    pub route: String,
    pub score: String,
    pub tone: ScoreTone,
    pub badge: &'static str,
}

impl CompactRow {
    #[must_use]
    pub fn from_record(record: &AlertRecord) -> Self {
        Self {
            time: format_local_timestamp(record.timestamp),
            route: format_route(&record.src_ip, &record.dst_ip),
            score: format_score(Some(record.score)),
            tone: score_tone(record.score),
            badge: ALERT_BADGE,
        }
    }
}

/// History table row: time, both endpoints, protocol, score, badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedRow {
    pub time: String,
    pub source: String,
    pub destination: String,
    pub proto: String,
    pub score: String,
    pub tone: ScoreTone,
    pub badge: &'static str,
}

impl DetailedRow {
    #[must_use]
    pub fn from_record(record: &AlertRecord) -> Self {
        Self {
            time: format_local_timestamp(record.timestamp),
            source: format_endpoint(&record.src_ip, record.src_port),
            destination: format_endpoint(&record.dst_ip, record.dst_port),
            proto: record.proto.clone(),
            score: format_score(Some(record.score)),
            tone: score_tone(record.score),
            badge: ALERT_BADGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sample_record() -> AlertRecord {
        AlertRecord {
            id: 1,
            src_ip: "10.0.0.1".into(),
            dst_ip: "10.0.0.2".into(),
            src_port: 1234,
            dst_port: 443,
            proto: "TCP".into(),
            score: 0.95,
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn threshold_is_strict() {
        assert_eq!(score_tone(0.80), ScoreTone::Warning);
        assert_eq!(score_tone(0.8001), ScoreTone::Danger);
        assert_eq!(score_tone(0.0), ScoreTone::Warning);
    }

    #[test]
    fn absent_score_renders_zero() {
        assert_eq!(format_score(None), "0.0000");
        assert_eq!(format_score(Some(0.95)), "0.9500");
        assert_eq!(format_score(Some(0.123_456)), "0.1235");
    }

    #[test]
    fn local_timestamp_matches_chrono_local() {
        let expected = Local
            .timestamp_opt(1_700_000_000, 0)
            .earliest()
            .unwrap()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(format_local_timestamp(1_700_000_000), expected);
        assert_eq!(expected.len(), 19);
    }

    #[test]
    fn overflowing_timestamp_renders_placeholder() {
        assert_eq!(format_local_timestamp(i64::MAX), "-");
    }

    #[test]
    fn compact_row_for_sample_alert() {
        let row = CompactRow::from_record(&sample_record());
        assert_eq!(row.route, "10.0.0.1 -> 10.0.0.2");
        assert_eq!(row.score, "0.9500");
        assert_eq!(row.tone, ScoreTone::Danger);
        assert_eq!(row.badge, "ALERT");
    }

    #[test]
    fn detailed_row_for_sample_alert() {
        let row = DetailedRow::from_record(&sample_record());
        assert_eq!(row.source, "10.0.0.1:1234");
        assert_eq!(row.destination, "10.0.0.2:443");
        assert_eq!(row.proto, "TCP");
        assert_eq!(row.score, "0.9500");
        assert_eq!(row.time, format_local_timestamp(1_700_000_000));
    }

    proptest! {
        #[test]
        fn tone_is_danger_iff_above_threshold(score in -1.0f64..2.0) {
            let tone = score_tone(score);
            prop_assert_eq!(tone == ScoreTone::Danger, score > DANGER_THRESHOLD);
        }

        #[test]
        fn score_text_always_has_four_decimals(score in 0.0f64..1.0) {
            let text = format_score(Some(score));
            let decimals = text.split('.').nth(1).map_or(0, str::len);
            prop_assert_eq!(decimals, 4);
        }
    }
}
