//! Store records built from API items.

pub mod document;
pub mod group;
pub mod toll;

pub use document::DocumentRecord;
pub use group::TollGroup;
pub use toll::{global_identifier, TollFields, TollGenre, TollRecord};

use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse an ISO 8601 timestamp as sent by the API.
///
/// Accepts `T` or space separators, optional fractional seconds, an optional
/// UTC offset (the wall-clock time in that offset is kept), and plain dates
/// (midnight).
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.naive_local());
    }
    if let Ok(ts) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(ts.naive_local());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }
    bail!("invalid timestamp: {:?}", text)
}

/// Parse an optional timestamp, treating blank text as absent.
pub fn parse_optional_timestamp(text: Option<&str>) -> Result<Option<NaiveDateTime>> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_timestamp(text).map(Some),
    }
}

/// Parse a calendar date (`YYYY-MM-DD`).
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => Ok(date),
        Err(_) => parse_timestamp(text)
            .map(|ts| ts.date())
            .map_err(|_| anyhow::anyhow!("invalid date: {:?}", text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_timestamp_variants() -> Result<()> {
        let expected = ts(2024, 5, 10, 14, 3, 7);
        assert_eq!(parse_timestamp("2024-05-10T14:03:07")?, expected);
        assert_eq!(parse_timestamp("2024-05-10 14:03:07")?, expected);
        assert_eq!(parse_timestamp("2024-05-10T14:03:07.250")?.and_utc().timestamp(), expected.and_utc().timestamp());
        assert_eq!(parse_timestamp("2024-05-10T14:03:07+02:00")?, expected);
        assert_eq!(parse_timestamp("2024-05-10T14:03:07Z")?, expected);
        assert_eq!(parse_timestamp("2024-05-10")?, ts(2024, 5, 10, 0, 0, 0));
        assert!(parse_timestamp("10/05/2024").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_optional_timestamp() -> Result<()> {
        assert_eq!(parse_optional_timestamp(None)?, None);
        assert_eq!(parse_optional_timestamp(Some("  "))?, None);
        assert!(parse_optional_timestamp(Some("2024-05-10T00:00:00"))?.is_some());
        Ok(())
    }

    #[test]
    fn test_parse_date() -> Result<()> {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        assert_eq!(parse_date("2024-05-31")?, expected);
        assert_eq!(parse_date("2024-05-31T00:00:00")?, expected);
        assert!(parse_date("31-05-2024").is_err());
        Ok(())
    }
}
