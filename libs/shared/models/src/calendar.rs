use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{hhmm, hhmm_option};

/// Weekday names indexed 0=Sunday..6=Saturday, matching the provider schedule keys.
pub const DAY_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Buffer lengths a booking gap may take, in minutes.
pub const BUFFER_MINUTES: [u32; 3] = [0, 15, 30];

/// 0=Sunday..6=Saturday
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn weekday_name(index: u8) -> &'static str {
    DAY_NAMES[(index % 7) as usize]
}

pub fn is_weekend(index: u8) -> bool {
    index == 0 || index == 6
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarValueError {
    #[error("Invalid first day of week '{0}': must be one of sunday, monday, saturday")]
    FirstDayOfWeek(String),

    #[error("Unsupported resolution {0} minutes: must be 15, 30 or 60")]
    Resolution(u32),

    #[error("Invalid time window {start}-{end}: start must be before end")]
    TimeWindow { start: String, end: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FirstDayOfWeek {
    Sunday,
    #[default]
    Monday,
    Saturday,
}

impl FirstDayOfWeek {
    /// Weekday integer in the 0=Sunday numbering.
    pub fn index(&self) -> u8 {
        match self {
            FirstDayOfWeek::Sunday => 0,
            FirstDayOfWeek::Monday => 1,
            FirstDayOfWeek::Saturday => 6,
        }
    }
}

impl FromStr for FirstDayOfWeek {
    type Err = CalendarValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "sunday" => Ok(FirstDayOfWeek::Sunday),
            "monday" => Ok(FirstDayOfWeek::Monday),
            "saturday" => Ok(FirstDayOfWeek::Saturday),
            _ => Err(CalendarValueError::FirstDayOfWeek(value.to_string())),
        }
    }
}

/// Time-grid step. Only 15, 30 and 60 minute grids are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Resolution(u32);

impl Resolution {
    pub const ALLOWED: [u32; 3] = [15, 30, 60];

    pub fn minutes(&self) -> u32 {
        self.0
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution(30)
    }
}

impl TryFrom<u32> for Resolution {
    type Error = CalendarValueError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        if Self::ALLOWED.contains(&minutes) {
            Ok(Resolution(minutes))
        } else {
            Err(CalendarValueError::Resolution(minutes))
        }
    }
}

impl From<Resolution> for u32 {
    fn from(value: Resolution) -> Self {
        value.0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.0)
    }
}

/// Open/close pair for one day, end-exclusive. Deserialization goes through
/// [`TimeWindow::new`], so an empty or inverted window never loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTimeWindow")]
pub struct TimeWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTimeWindow {
    #[serde(with = "hhmm", alias = "startTime")]
    start: NaiveTime,
    #[serde(with = "hhmm", alias = "endTime")]
    end: NaiveTime,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = CalendarValueError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        TimeWindow::new(raw.start, raw.end)
    }
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, CalendarValueError> {
        if start >= end {
            return Err(CalendarValueError::TimeWindow {
                start: start.format("%H:%M").to_string(),
                end: end.format("%H:%M").to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn hours(start_hour: u32, end_hour: u32) -> Option<Self> {
        let start = NaiveTime::from_hms_opt(start_hour, 0, 0)?;
        let end = NaiveTime::from_hms_opt(end_hour, 0, 0)?;
        Self::new(start, end).ok()
    }

    /// True when `[from, to)` lies entirely inside the window.
    pub fn covers(&self, from: NaiveTime, to: NaiveTime) -> bool {
        from >= self.start && to <= self.end && from < to
    }

    pub fn union(&self, other: &TimeWindow) -> TimeWindow {
        TimeWindow {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Location opening hours keyed by weekday integer (0=Sunday). A missing key is a closed day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessHours(BTreeMap<u8, TimeWindow>);

impl BusinessHours {
    pub fn new(days: BTreeMap<u8, TimeWindow>) -> Self {
        Self(days.into_iter().filter(|(day, _)| *day < 7).collect())
    }

    pub fn closed() -> Self {
        Self(BTreeMap::new())
    }

    pub fn for_weekday(&self, index: u8) -> Option<&TimeWindow> {
        self.0.get(&index)
    }

    pub fn set(&mut self, index: u8, window: Option<TimeWindow>) {
        match window {
            Some(w) if index < 7 => {
                self.0.insert(index, w);
            }
            _ => {
                self.0.remove(&index);
            }
        }
    }

    pub fn open_days(&self) -> impl Iterator<Item = (u8, &TimeWindow)> {
        self.0.iter().map(|(day, window)| (*day, window))
    }

    /// First open day whose window is empty or inverted. Only reachable when a
    /// window was built field by field instead of through [`TimeWindow::new`].
    pub fn first_invalid(&self) -> Option<(u8, &TimeWindow)> {
        self.open_days().find(|(_, window)| window.start >= window.end)
    }
}

impl Default for BusinessHours {
    /// Monday to Friday, 09:00-17:00.
    fn default() -> Self {
        let mut days = BTreeMap::new();
        if let Some(window) = TimeWindow::hours(9, 17) {
            for day in 1..=5 {
                days.insert(day, window);
            }
        }
        Self(days)
    }
}

/// One weekday of a provider schedule. An enabled day must have `start < end`,
/// and a break must have both ends in order; disabled days are not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawScheduleDay")]
pub struct ProviderScheduleDay {
    pub enabled: bool,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    #[serde(with = "hhmm_option", skip_serializing_if = "Option::is_none")]
    pub break_start: Option<NaiveTime>,
    #[serde(with = "hhmm_option", skip_serializing_if = "Option::is_none")]
    pub break_end: Option<NaiveTime>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScheduleDay {
    enabled: bool,
    #[serde(with = "hhmm")]
    start: NaiveTime,
    #[serde(with = "hhmm")]
    end: NaiveTime,
    #[serde(with = "hhmm_option", default)]
    break_start: Option<NaiveTime>,
    #[serde(with = "hhmm_option", default)]
    break_end: Option<NaiveTime>,
}

impl TryFrom<RawScheduleDay> for ProviderScheduleDay {
    type Error = CalendarValueError;

    fn try_from(raw: RawScheduleDay) -> Result<Self, Self::Error> {
        let day = ProviderScheduleDay {
            enabled: raw.enabled,
            start: raw.start,
            end: raw.end,
            break_start: raw.break_start,
            break_end: raw.break_end,
        };
        day.check()?;
        Ok(day)
    }
}

impl ProviderScheduleDay {
    /// Reject an inverted working window or a half-specified or inverted break.
    pub fn check(&self) -> Result<(), CalendarValueError> {
        if !self.enabled {
            return Ok(());
        }
        TimeWindow::new(self.start, self.end)?;
        match (self.break_start, self.break_end) {
            (Some(start), Some(end)) => TimeWindow::new(start, end).map(|_| ()),
            (None, None) => Ok(()),
            (start, end) => Err(CalendarValueError::TimeWindow {
                start: start.map(|t| t.format("%H:%M").to_string()).unwrap_or_default(),
                end: end.map(|t| t.format("%H:%M").to_string()).unwrap_or_default(),
            }),
        }
    }

    pub fn window(&self) -> Option<TimeWindow> {
        if !self.enabled {
            return None;
        }
        TimeWindow::new(self.start, self.end).ok()
    }

    pub fn break_window(&self) -> Option<TimeWindow> {
        match (self.break_start, self.break_end) {
            (Some(start), Some(end)) => TimeWindow::new(start, end).ok(),
            _ => None,
        }
    }
}

/// Per-provider override of business hours, keyed by weekday name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderSchedule {
    #[serde(default)]
    pub sunday: Option<ProviderScheduleDay>,
    #[serde(default)]
    pub monday: Option<ProviderScheduleDay>,
    #[serde(default)]
    pub tuesday: Option<ProviderScheduleDay>,
    #[serde(default)]
    pub wednesday: Option<ProviderScheduleDay>,
    #[serde(default)]
    pub thursday: Option<ProviderScheduleDay>,
    #[serde(default)]
    pub friday: Option<ProviderScheduleDay>,
    #[serde(default)]
    pub saturday: Option<ProviderScheduleDay>,
}

impl ProviderSchedule {
    pub fn day(&self, index: u8) -> Option<&ProviderScheduleDay> {
        match index {
            0 => self.sunday.as_ref(),
            1 => self.monday.as_ref(),
            2 => self.tuesday.as_ref(),
            3 => self.wednesday.as_ref(),
            4 => self.thursday.as_ref(),
            5 => self.friday.as_ref(),
            6 => self.saturday.as_ref(),
            _ => None,
        }
    }

    pub fn day_mut(&mut self, index: u8) -> Option<&mut Option<ProviderScheduleDay>> {
        match index {
            0 => Some(&mut self.sunday),
            1 => Some(&mut self.monday),
            2 => Some(&mut self.tuesday),
            3 => Some(&mut self.wednesday),
            4 => Some(&mut self.thursday),
            5 => Some(&mut self.friday),
            6 => Some(&mut self.saturday),
            _ => None,
        }
    }
}

/// Whole-day closure, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl BlockedPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

pub fn is_date_blocked(date: NaiveDate, periods: &[BlockedPeriod]) -> bool {
    periods.iter().any(|period| period.contains(date))
}

pub type ProviderId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Provider {
    pub fn new(id: ProviderId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn first_day_parses_the_three_supported_values() {
        assert_eq!("Monday".parse::<FirstDayOfWeek>().unwrap().index(), 1);
        assert_eq!("sunday".parse::<FirstDayOfWeek>().unwrap().index(), 0);
        assert_eq!("saturday".parse::<FirstDayOfWeek>().unwrap().index(), 6);
        assert!("friday".parse::<FirstDayOfWeek>().is_err());
    }

    #[test]
    fn resolution_rejects_unsupported_steps() {
        assert!(Resolution::try_from(30).is_ok());
        assert_eq!(Resolution::try_from(20), Err(CalendarValueError::Resolution(20)));
        assert!(serde_json::from_str::<Resolution>("45").is_err());
    }

    #[test]
    fn blocked_period_is_inclusive() {
        let period = BlockedPeriod {
            start: NaiveDate::from_ymd_opt(2026, 12, 24).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 12, 26).unwrap(),
            notes: Some("Holidays".into()),
        };
        assert!(period.contains(NaiveDate::from_ymd_opt(2026, 12, 24).unwrap()));
        assert!(period.contains(NaiveDate::from_ymd_opt(2026, 12, 26).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2026, 12, 27).unwrap()));
    }

    #[test]
    fn business_hours_round_trip_through_weekday_keys() {
        let hours: BusinessHours =
            serde_json::from_str(r#"{"1": {"start": "09:00", "end": "17:00"}, "6": {"startTime": "10:00", "endTime": "14:00"}}"#)
                .unwrap();
        assert_eq!(hours.for_weekday(1), Some(&TimeWindow { start: t(9, 0), end: t(17, 0) }));
        assert_eq!(hours.for_weekday(6).map(|w| w.end), Some(t(14, 0)));
        assert!(hours.for_weekday(0).is_none());
    }

    #[test]
    fn inverted_windows_do_not_deserialize() {
        let err = serde_json::from_str::<BusinessHours>(r#"{"4": {"start": "17:00", "end": "09:00"}}"#).unwrap_err();
        assert!(err.to_string().contains("17:00-09:00"));
        assert!(serde_json::from_str::<TimeWindow>(r#"{"start": "09:00", "end": "09:00"}"#).is_err());

        let mut hours = BusinessHours::default();
        assert!(hours.first_invalid().is_none());
        hours.set(4, Some(TimeWindow { start: t(17, 0), end: t(9, 0) }));
        assert_eq!(hours.first_invalid().map(|(day, _)| day), Some(4));
    }

    #[test]
    fn schedule_days_are_checked_when_enabled() {
        let inverted = r#"{"enabled": true, "start": "17:00", "end": "09:00"}"#;
        assert!(serde_json::from_str::<ProviderScheduleDay>(inverted).is_err());

        let backwards_break =
            r#"{"enabled": true, "start": "09:00", "end": "17:00", "breakStart": "13:00", "breakEnd": "12:00"}"#;
        assert!(serde_json::from_str::<ProviderScheduleDay>(backwards_break).is_err());

        let half_break = r#"{"enabled": true, "start": "09:00", "end": "17:00", "breakStart": "12:00"}"#;
        assert!(serde_json::from_str::<ProviderScheduleDay>(half_break).is_err());

        // a disabled day may carry placeholder times
        let off = r#"{"enabled": false, "start": "00:00", "end": "00:00"}"#;
        assert!(serde_json::from_str::<ProviderScheduleDay>(off).is_ok());
    }

    #[test]
    fn schedule_day_exposes_window_only_when_enabled() {
        let day = ProviderScheduleDay {
            enabled: false,
            start: t(9, 0),
            end: t(17, 0),
            break_start: None,
            break_end: None,
        };
        assert!(day.window().is_none());

        let schedule: ProviderSchedule = serde_json::from_str(
            r#"{"monday": {"enabled": true, "start": "08:00", "end": "12:00", "breakStart": "10:00", "breakEnd": "10:30"}}"#,
        )
        .unwrap();
        let monday = schedule.day(1).unwrap();
        assert_eq!(monday.window(), Some(TimeWindow { start: t(8, 0), end: t(12, 0) }));
        assert_eq!(monday.break_window().map(|w| w.start), Some(t(10, 0)));
        assert!(schedule.day(2).is_none());
    }
}
