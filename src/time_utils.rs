// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_utc_rfc3339(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_and_parse_agree() {
        let date = DateTime::from_timestamp(1_750_000_000, 0).unwrap();
        let formatted = format_utc_rfc3339(date);
        assert_eq!(formatted, "2025-06-15T15:06:40Z");
        assert_eq!(parse_utc_rfc3339(&formatted).unwrap(), date);
    }

    #[test]
    fn test_parse_normalizes_offset() {
        let parsed = parse_utc_rfc3339("2025-06-15T17:06:40+02:00").unwrap();
        assert_eq!(format_utc_rfc3339(parsed), "2025-06-15T15:06:40Z");
    }
}
