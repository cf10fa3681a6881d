use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use availability_cell::AvailabilityError;
use shared_models::appointment::FormattedAppointment;
use shared_models::calendar::{CalendarValueError, ProviderId};
use shared_models::error::AppError;
use shared_models::time::TimeParseError;

/// One day of a month grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub day_number: u32,
    pub weekday: u8,
    pub weekday_name: &'static str,
    /// ISO-8601 week number.
    pub week_of_year: u32,
    pub is_current_month: bool,
    pub is_today: bool,
    pub is_past: bool,
    pub is_future: bool,
    pub appointments: Vec<FormattedAppointment>,
    pub appointment_count: usize,
    pub has_more: bool,
    pub more_count: usize,
    pub has_availability: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGridModel {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Always 6 rows of 7 cells.
    pub weeks: Vec<Vec<CalendarCell>>,
}

impl MonthGridModel {
    pub fn cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.weeks.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekDay {
    pub date: NaiveDate,
    pub day_number: u32,
    pub month_name: String,
    pub full_date: String,
    pub weekday: u8,
    pub weekday_name: &'static str,
    pub is_today: bool,
    pub is_past: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekRangeModel {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<WeekDay>,
}

/// A row of the rendered day grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub time: String,
    /// Offset from the grid's day start, not the time of day.
    pub minutes: u32,
    pub label: String,
    pub is_hour: bool,
    pub is_half: bool,
    pub top_px: u32,
    pub appointments: Vec<PositionedAppointment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySlotModel {
    pub date: NaiveDate,
    pub day_start: String,
    pub day_end: String,
    pub total_minutes: u32,
    pub pixels_per_minute: u32,
    pub container_height: u32,
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayOfWeek {
    pub index: u8,
    pub name: &'static str,
}

/// An appointment placed on a day grid for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedAppointment {
    #[serde(flatten)]
    pub appointment: FormattedAppointment,
    /// Negative when the appointment starts before the visible day.
    pub top_px: i64,
    pub height_px: i64,
    /// Minutes after midnight.
    pub start_min: u32,
    pub end_min: u32,
    pub col_index: usize,
    pub col_count: usize,
    pub width_pct: f64,
    pub left_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnProvider {
    pub id: ProviderId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderColumn {
    pub provider: ColumnProvider,
    pub grid: DaySlotModel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHoursWindow {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayViewModel {
    pub date: NaiveDate,
    pub day_name: String,
    pub day_label: String,
    pub weekday_name: &'static str,
    pub weekday: u8,
    pub is_today: bool,
    pub is_past: bool,
    pub business_hours: BusinessHoursWindow,
    pub grid: DaySlotModel,
    pub provider_columns: Vec<ProviderColumn>,
    pub appointments: Vec<FormattedAppointment>,
    pub total_appointments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekViewDay {
    #[serde(flatten)]
    pub day: WeekDay,
    pub appointments: Vec<FormattedAppointment>,
    pub appointment_count: usize,
    pub day_grid: DaySlotModel,
    pub provider_columns: Vec<ProviderColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekViewModel {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub week_label: String,
    pub business_hours: BusinessHoursWindow,
    pub slot_duration: u32,
    pub days: Vec<WeekViewDay>,
    pub appointments: Vec<FormattedAppointment>,
    pub total_appointments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthViewModel {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub month_label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weeks: Vec<Vec<CalendarCell>>,
    pub appointments: Vec<FormattedAppointment>,
    pub total_appointments: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error(transparent)]
    InvalidInput(#[from] TimeParseError),

    #[error(transparent)]
    InvalidValue(#[from] CalendarValueError),

    #[error("Day window {start}-{end} is empty or inverted")]
    DayWindow { start: String, end: String },

    #[error("Pixels per minute must be positive")]
    PixelDensity,

    #[error("Date {0} is outside the supported calendar range")]
    DateOutOfRange(NaiveDate),

    #[error("Appointment source unavailable: {0}")]
    Upstream(String),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),
}

impl From<CalendarError> for AppError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::Upstream(_) => AppError::ExternalService(err.to_string()),
            CalendarError::Availability(inner) => inner.into(),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}
