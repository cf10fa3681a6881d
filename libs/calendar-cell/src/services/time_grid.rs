use chrono::{NaiveDate, NaiveTime};

use shared_config::CalendarConfig;
use shared_models::calendar::Resolution;
use shared_models::time::format_hhmm;
use shared_utils::minutes_of_day;

use crate::models::{BusinessHoursWindow, CalendarError, DaySlotModel};
use crate::services::range::build_day_slots;

/// Day-start, day-end and resolution for every rendered day grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeGrid {
    day_start: NaiveTime,
    day_end: NaiveTime,
    resolution: Resolution,
    pixels_per_minute: u32,
}

impl TimeGrid {
    pub fn new(
        day_start: NaiveTime,
        day_end: NaiveTime,
        resolution: Resolution,
        pixels_per_minute: u32,
    ) -> Result<Self, CalendarError> {
        if day_start >= day_end {
            return Err(CalendarError::DayWindow {
                start: format_hhmm(day_start),
                end: format_hhmm(day_end),
            });
        }
        if pixels_per_minute == 0 {
            return Err(CalendarError::PixelDensity);
        }
        Ok(Self {
            day_start,
            day_end,
            resolution,
            pixels_per_minute,
        })
    }

    pub fn from_config(config: &CalendarConfig) -> Result<Self, CalendarError> {
        Self::new(config.day_start, config.day_end, config.resolution, config.pixels_per_minute)
    }

    pub fn day_grid(&self, date: NaiveDate) -> Result<DaySlotModel, CalendarError> {
        build_day_slots(date, self.day_start, self.day_end, self.resolution, self.pixels_per_minute)
    }

    pub fn resolution(&self) -> u32 {
        self.resolution.minutes()
    }

    pub fn day_start_minutes(&self) -> u32 {
        minutes_of_day(self.day_start)
    }

    pub fn pixels_per_minute(&self) -> u32 {
        self.pixels_per_minute
    }

    pub fn business_hours(&self) -> BusinessHoursWindow {
        BusinessHoursWindow {
            start_time: format_hhmm(self.day_start),
            end_time: format_hhmm(self.day_end),
        }
    }
}
