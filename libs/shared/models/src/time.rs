//! Wall-clock parsing and serde helpers.
//!
//! Times of day travel as `HH:MM` strings and appointment instants as ISO-8601
//! local datetimes. Upstream rows sometimes carry an offset
//! (`2026-02-26T10:00:00-05:00`); the offset is dropped and the wall-clock part
//! kept, because every grid computation works in the calendar's own timezone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Invalid time '{0}': expected HH:MM")]
    Time(String),

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    Date(String),

    #[error("Invalid datetime '{0}': expected ISO-8601")]
    DateTime(String),
}

/// Parse `HH:MM` (or `HH:MM:SS`, as stored by the upstream database).
pub fn parse_hhmm(value: &str) -> Result<NaiveTime, TimeParseError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| TimeParseError::Time(value.to_string()))
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, TimeParseError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| TimeParseError::Date(value.to_string()))
}

/// Parse an ISO datetime, keeping the local wall-clock part of offset-carrying values.
pub fn parse_local_datetime(value: &str) -> Result<NaiveDateTime, TimeParseError> {
    let trimmed = value.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(with_offset.naive_local());
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| TimeParseError::DateTime(value.to_string()))
}

pub fn format_local_datetime(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// `#[serde(with = "hhmm")]` for `NaiveTime` fields.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hhmm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_hhmm(&raw).map_err(D::Error::custom)
    }
}

/// `#[serde(with = "hhmm_option", default)]` for optional `NaiveTime` fields.
pub mod hhmm_option {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_str(&super::format_hhmm(*t)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_hhmm(&raw).map(Some).map_err(D::Error::custom),
            _ => Ok(None),
        }
    }
}

/// `#[serde(with = "local_datetime")]` for appointment instants.
pub mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_local_datetime(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_local_datetime(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_times() {
        assert_eq!(parse_hhmm("08:30").unwrap(), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(parse_hhmm("17:00:00").unwrap(), NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert!(parse_hhmm("8h30").is_err());
        assert!(parse_hhmm("25:00").is_err());
    }

    #[test]
    fn offset_datetimes_keep_wall_clock() {
        let parsed = parse_local_datetime("2026-02-26T10:15:00-05:00").unwrap();
        assert_eq!(format_local_datetime(parsed), "2026-02-26T10:15:00");

        let naive = parse_local_datetime("2026-02-26 14:00:00").unwrap();
        assert_eq!(format_local_datetime(naive), "2026-02-26T14:00:00");
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(parse_date("2026-02-30"), Err(TimeParseError::Date("2026-02-30".to_string())));
        assert!(parse_local_datetime("tomorrow").is_err());
    }
}
