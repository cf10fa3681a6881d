use std::env;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::warn;

use shared_models::calendar::{
    BlockedPeriod, BusinessHours, FirstDayOfWeek, Resolution, TimeWindow, BUFFER_MINUTES,
};
use shared_models::time::parse_hhmm;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Calendar day window {start}-{end} is empty or inverted")]
    InvertedDayWindow { start: String, end: String },

    #[error("Slot duration must be between 1 and 1440 minutes, got {0}")]
    SlotDuration(u32),

    #[error("Pixels per minute must be positive")]
    PixelDensity,

    #[error("Blocked period {start}..{end} ends before it starts")]
    BlockedPeriod { start: NaiveDate, end: NaiveDate },

    #[error("Business hours for weekday {weekday} ({start}-{end}) are empty or inverted")]
    BusinessHours { weekday: u8, start: String, end: String },

    #[error("Buffer must be one of 0, 15 or 30 minutes, got {0}")]
    BufferMinutes(u32),

    #[error("{key} could not be loaded: {message}")]
    InvalidSetting { key: String, message: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upstream_url: String,
    pub upstream_api_key: String,
    pub port: u16,
    pub calendar: CalendarConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            upstream_url: env::var("UPSTREAM_URL")
                .unwrap_or_else(|_| {
                    warn!("UPSTREAM_URL not set, using empty value");
                    String::new()
                }),
            upstream_api_key: env::var("UPSTREAM_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("UPSTREAM_API_KEY not set, using empty value");
                    String::new()
                }),
            port: env_or("PORT", 3000),
            calendar: CalendarConfig::from_env()?,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        Ok(config)
    }

    pub fn is_configured(&self) -> bool {
        !self.upstream_url.is_empty()
    }
}

/// Every calendar setting the grid, slot and layout code reads. Passed explicitly;
/// nothing in the engine consults a global.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarConfig {
    pub timezone: Tz,
    pub first_day_of_week: FirstDayOfWeek,
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
    pub resolution: Resolution,
    pub slot_duration_minutes: u32,
    /// Gap kept free after every booking; also widens the step between slots.
    pub buffer_minutes: u32,
    pub pixels_per_minute: u32,
    pub max_per_cell: usize,
    /// Display-only floor for short appointments; never an availability rule.
    pub min_display_minutes: u32,
    pub weekends_closed: bool,
    pub business_hours: BusinessHours,
    pub blocked_periods: Vec<BlockedPeriod>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            first_day_of_week: FirstDayOfWeek::Monday,
            day_start: hm(8, 0),
            day_end: hm(18, 0),
            resolution: Resolution::default(),
            slot_duration_minutes: 30,
            buffer_minutes: 0,
            pixels_per_minute: 2,
            max_per_cell: 3,
            min_display_minutes: 15,
            weekends_closed: true,
            business_hours: BusinessHours::default(),
            blocked_periods: Vec::new(),
        }
    }
}

impl CalendarConfig {
    /// Scalar settings fall back to their defaults with a warning. The structured
    /// business rules (hours and blocked periods) must parse, or loading fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let timezone = match env::var("CALENDAR_TIMEZONE") {
            Ok(raw) => raw.parse::<Tz>().unwrap_or_else(|_| {
                warn!("CALENDAR_TIMEZONE '{}' is not a known timezone, using UTC", raw);
                Tz::UTC
            }),
            Err(_) => defaults.timezone,
        };

        let resolution = match env::var("BOOKING_TIME_RESOLUTION") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .and_then(|minutes| Resolution::try_from(minutes).ok())
                .unwrap_or_else(|| {
                    warn!("BOOKING_TIME_RESOLUTION '{}' unsupported, using {}", raw, defaults.resolution);
                    defaults.resolution
                }),
            Err(_) => defaults.resolution,
        };

        Ok(Self {
            timezone,
            first_day_of_week: env_or("CALENDAR_FIRST_DAY", defaults.first_day_of_week),
            day_start: env_time_or("CALENDAR_DAY_START", defaults.day_start),
            day_end: env_time_or("CALENDAR_DAY_END", defaults.day_end),
            resolution,
            slot_duration_minutes: env_or("BOOKING_SLOT_DURATION", defaults.slot_duration_minutes),
            buffer_minutes: env_or("BOOKING_BUFFER_MINUTES", defaults.buffer_minutes),
            pixels_per_minute: env_or("CALENDAR_PIXELS_PER_MINUTE", defaults.pixels_per_minute),
            max_per_cell: env_or("CALENDAR_MAX_PER_CELL", defaults.max_per_cell),
            min_display_minutes: defaults.min_display_minutes,
            weekends_closed: env_or("CALENDAR_WEEKENDS_CLOSED", defaults.weekends_closed),
            business_hours: env_json_or("BUSINESS_HOURS", defaults.business_hours)?,
            blocked_periods: env_json_or("BUSINESS_BLOCKED_PERIODS", defaults.blocked_periods)?,
        })
    }

    /// Reject combinations that would make grid or slot generation meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.day_start >= self.day_end {
            return Err(ConfigError::InvertedDayWindow {
                start: self.day_start.format("%H:%M").to_string(),
                end: self.day_end.format("%H:%M").to_string(),
            });
        }
        if self.slot_duration_minutes == 0 || self.slot_duration_minutes > 24 * 60 {
            return Err(ConfigError::SlotDuration(self.slot_duration_minutes));
        }
        if !BUFFER_MINUTES.contains(&self.buffer_minutes) {
            return Err(ConfigError::BufferMinutes(self.buffer_minutes));
        }
        if self.pixels_per_minute == 0 {
            return Err(ConfigError::PixelDensity);
        }
        if let Some((weekday, window)) = self.business_hours.first_invalid() {
            return Err(ConfigError::BusinessHours {
                weekday,
                start: window.start.format("%H:%M").to_string(),
                end: window.end.format("%H:%M").to_string(),
            });
        }
        if let Some(period) = self.blocked_periods.iter().find(|p| p.end < p.start) {
            return Err(ConfigError::BlockedPeriod {
                start: period.start,
                end: period.end,
            });
        }
        Ok(())
    }

    /// The calendar's visible day, `day_start..day_end`.
    pub fn day_window(&self) -> Result<TimeWindow, ConfigError> {
        TimeWindow::new(self.day_start, self.day_end).map_err(|_| ConfigError::InvertedDayWindow {
            start: self.day_start.format("%H:%M").to_string(),
            end: self.day_end.format("%H:%M").to_string(),
        })
    }

    /// Current wall-clock instant in the calendar timezone, truncated to the minute.
    pub fn now(&self) -> NaiveDateTime {
        let local = Utc::now().with_timezone(&self.timezone).naive_local();
        local
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(local)
    }

    /// "Today" resolved in the calendar timezone.
    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("{} '{}' could not be parsed, using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn env_time_or(key: &str, default: NaiveTime) -> NaiveTime {
    match env::var(key) {
        Ok(raw) => parse_hhmm(&raw).unwrap_or_else(|_| {
            warn!("{} '{}' is not HH:MM, using default {}", key, raw, default.format("%H:%M"));
            default
        }),
        Err(_) => default,
    }
}

fn env_json_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => parse_json_setting(key, &raw),
        _ => Ok(default),
    }
}

fn parse_json_setting<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(raw).map_err(|e| ConfigError::InvalidSetting {
        key: key.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CalendarConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.day_window().unwrap().start, hm(8, 0));
    }

    #[test]
    fn validate_rejects_inverted_day() {
        let config = CalendarConfig {
            day_start: hm(18, 0),
            day_end: hm(8, 0),
            ..CalendarConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedDayWindow {
                start: "18:00".into(),
                end: "08:00".into()
            })
        );
    }

    #[test]
    fn validate_rejects_zero_duration_and_backwards_blocks() {
        let config = CalendarConfig {
            slot_duration_minutes: 0,
            ..CalendarConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::SlotDuration(0)));

        let start = NaiveDate::from_ymd_opt(2026, 5, 3).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let config = CalendarConfig {
            blocked_periods: vec![BlockedPeriod { start, end, notes: None }],
            ..CalendarConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BlockedPeriod { start, end }));
    }

    #[test]
    fn inverted_business_hours_fail_to_load() {
        let result = parse_json_setting::<BusinessHours>("BUSINESS_HOURS", r#"{"4":{"start":"17:00","end":"09:00"}}"#);
        match result {
            Err(ConfigError::InvalidSetting { key, message }) => {
                assert_eq!(key, "BUSINESS_HOURS");
                assert!(message.contains("17:00-09:00"));
            }
            other => panic!("expected InvalidSetting, got {:?}", other),
        }

        let hours: BusinessHours =
            parse_json_setting("BUSINESS_HOURS", r#"{"4":{"start":"09:00","end":"17:00"}}"#).unwrap();
        assert!(hours.for_weekday(4).is_some());
    }

    #[test]
    fn validate_rejects_hand_built_inverted_hours() {
        let mut business_hours = BusinessHours::default();
        business_hours.set(4, Some(TimeWindow { start: hm(17, 0), end: hm(9, 0) }));
        let config = CalendarConfig {
            business_hours,
            ..CalendarConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::BusinessHours {
                weekday: 4,
                start: "17:00".into(),
                end: "09:00".into()
            })
        );
    }

    #[test]
    fn validate_accepts_only_supported_buffers() {
        for buffer_minutes in BUFFER_MINUTES {
            let config = CalendarConfig {
                buffer_minutes,
                ..CalendarConfig::default()
            };
            assert!(config.validate().is_ok());
        }
        let config = CalendarConfig {
            buffer_minutes: 10,
            ..CalendarConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BufferMinutes(10)));
    }

    #[test]
    fn now_is_minute_aligned() {
        let config = CalendarConfig::default();
        let now = config.now();
        assert_eq!(now.second(), 0);
        assert_eq!(now.nanosecond(), 0);
    }
}
