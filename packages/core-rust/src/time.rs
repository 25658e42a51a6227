//! Timestamp layout shared by every encoded payload.

use chrono::{DateTime, NaiveDateTime};

/// `yyyy-MM-dd HH:mm:ss.SSS`, always UTC.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Formats epoch milliseconds in [`DATE_FORMAT`]. `None` if out of range.
#[must_use]
pub fn format_timestamp(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.format(DATE_FORMAT).to_string())
}

/// Parses text in [`DATE_FORMAT`] back into epoch milliseconds.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(text, DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_formats_with_millis() {
        assert_eq!(format_timestamp(0).unwrap(), "1970-01-01 00:00:00.000");
        assert_eq!(
            format_timestamp(1_700_000_000_123).unwrap(),
            "2023-11-14 22:13:20.123"
        );
    }

    #[test]
    fn parse_inverts_format() {
        let text = format_timestamp(1_700_000_000_123).unwrap();
        assert_eq!(parse_timestamp(&text), Some(1_700_000_000_123));
    }

    #[test]
    fn parse_rejects_other_layouts() {
        assert_eq!(parse_timestamp("2023-11-14T22:13:20Z"), None);
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn out_of_range_millis() {
        assert!(format_timestamp(i64::MAX).is_none());
    }
}
