//! Timestamp normalization for the two feed dialects.
//!
//! Every date that leaves this module is a [`Timestamp`], a UTC instant whose
//! display form is the canonical `YYYY-MM-DDTHH:MM:SSZ` string used across the
//! merged output.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use regex::Regex;

use crate::errors::{AggregatorError, AggregatorResult};

/// A canonical UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current instant, truncated to whole seconds.
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(0))
    }

}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

fn offset_suffix() -> &'static Regex {
    static OFFSET: OnceLock<Regex> = OnceLock::new();
    OFFSET.get_or_init(|| Regex::new(r"[+-]\d{2}:\d{2}$").expect("offset pattern is valid"))
}

/// Drop a leading `Ddd,` day name.
fn without_weekday(text: &str) -> Option<&str> {
    let (day, rest) = text.split_once(',')?;
    let day = day.trim();
    (day.len() == 3 && day.chars().all(|c| c.is_ascii_alphabetic())).then(|| rest.trim_start())
}

/// Normalize an RSS (RFC 822 / RFC 2822) date such as
/// `Wed, 02 Oct 2024 15:00:00 GMT`.
///
/// The day name is advisory: feeds that get it wrong are parsed again
/// without it.
pub fn normalize_rfc2822(text: &str) -> AggregatorResult<Timestamp> {
    let trimmed = text.trim();

    DateTime::parse_from_rfc2822(trimmed)
        .or_else(|e| match without_weekday(trimmed) {
            Some(rest) => DateTime::parse_from_rfc2822(rest),
            None => Err(e),
        })
        .map(|dt| Timestamp(dt.with_timezone(&Utc)))
        .map_err(|_| AggregatorError::InvalidTimestamp(text.to_string()))
}

/// Normalize an Atom (ISO 8601 / RFC 3339) date.
///
/// A trailing `+HH:MM` / `-HH:MM` offset is replaced by `Z` while the
/// wall-clock digits are kept as written. This rewrites the suffix only; it
/// does not shift the instant, so non-UTC inputs come out with their local
/// time labelled as UTC.
pub fn normalize_iso8601(text: &str) -> AggregatorResult<Timestamp> {
    let mut canonical = offset_suffix().replace(text.trim(), "").into_owned();
    if !canonical.ends_with('Z') {
        canonical.push('Z');
    }

    DateTime::parse_from_rfc3339(&canonical)
        .map(|dt| Timestamp(dt.with_timezone(&Utc)))
        .map_err(|_| AggregatorError::InvalidTimestamp(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc2822_gmt() {
        let ts = normalize_rfc2822("Wed, 02 Oct 2024 15:00:00 GMT").unwrap();
        assert_eq!(ts.to_string(), "2024-10-02T15:00:00Z");
    }

    #[test]
    fn test_rfc2822_numeric_offset_is_converted() {
        let ts = normalize_rfc2822("Wed, 02 Oct 2024 17:00:00 +0200").unwrap();
        assert_eq!(ts.to_string(), "2024-10-02T15:00:00Z");
    }

    #[test]
    fn test_rfc2822_surrounding_whitespace() {
        let ts = normalize_rfc2822("\n   Thu, 28 Dec 2023 00:00:00 +0000\n").unwrap();
        assert_eq!(ts.to_string(), "2023-12-28T00:00:00Z");
    }

    #[test]
    fn test_rfc2822_wrong_weekday_is_ignored() {
        // 2 Oct 2024 was a Wednesday
        let ts = normalize_rfc2822("Thu, 02 Oct 2024 15:00:00 GMT").unwrap();
        assert_eq!(ts.to_string(), "2024-10-02T15:00:00Z");

        let ts = normalize_rfc2822("Mon, 02 Oct 2024 17:00:00 +0200").unwrap();
        assert_eq!(ts.to_string(), "2024-10-02T15:00:00Z");
    }

    #[test]
    fn test_rfc2822_without_weekday() {
        let ts = normalize_rfc2822("02 Oct 2024 15:00:00 GMT").unwrap();
        assert_eq!(ts.to_string(), "2024-10-02T15:00:00Z");
    }

    #[test]
    fn test_rfc2822_wrong_weekday_still_needs_valid_date() {
        let err = normalize_rfc2822("Thu, 31 Feb 2024 15:00:00 GMT").unwrap_err();
        assert!(matches!(err, AggregatorError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_rfc2822_rejects_garbage() {
        let err = normalize_rfc2822("yesterday-ish").unwrap_err();
        assert!(matches!(err, AggregatorError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_iso_zero_offset() {
        let ts = normalize_iso8601("2024-10-02T15:00:00+00:00").unwrap();
        assert_eq!(ts.to_string(), "2024-10-02T15:00:00Z");
    }

    #[test]
    fn test_iso_canonical_round_trip() {
        for canonical in ["2024-10-02T15:00:00Z", "2023-01-31T23:59:59.250Z"] {
            let ts = normalize_iso8601(canonical).unwrap();
            assert_eq!(ts.to_string(), canonical);
        }
    }

    #[test]
    fn test_iso_offset_is_stripped_not_converted() {
        // The wall-clock digits survive unchanged; only the suffix is rewritten.
        let plus = normalize_iso8601("2024-10-02T15:00:00+02:00").unwrap();
        let minus = normalize_iso8601("2024-10-02T15:00:00-05:00").unwrap();
        assert_eq!(plus.to_string(), "2024-10-02T15:00:00Z");
        assert_eq!(minus.to_string(), "2024-10-02T15:00:00Z");
    }

    #[test]
    fn test_iso_without_zone_gets_utc_marker() {
        let ts = normalize_iso8601("2024-10-02T15:00:00").unwrap();
        assert_eq!(ts.to_string(), "2024-10-02T15:00:00Z");
    }

    #[test]
    fn test_iso_rejects_other_shapes() {
        for bad in ["2024-10-02", "Wed, 02 Oct 2024 15:00:00 GMT", "2024-10-02T15:00:00+0000", ""] {
            let err = normalize_iso8601(bad).unwrap_err();
            assert!(
                matches!(err, AggregatorError::InvalidTimestamp(_)),
                "expected InvalidTimestamp for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_timestamps_order_chronologically() {
        let earlier = normalize_iso8601("2024-10-02T15:00:00Z").unwrap();
        let later = normalize_rfc2822("Wed, 02 Oct 2024 15:00:01 GMT").unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn test_now_has_whole_seconds() {
        let now = Timestamp::now().to_string();
        assert!(now.ends_with('Z'));
        assert!(!now.contains('.'));
    }
}
