use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::appointment::{AppointmentFilters, AppointmentId};
use shared_models::calendar::{Provider, ProviderId};
use shared_models::error::AppError;
use shared_models::time::local_datetime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// No on-schedule provider has a conflict.
    Open,
    /// Some providers are booked, some are free.
    Partial,
    /// Every on-schedule provider is booked.
    FullyBooked,
}

/// One bookable interval of the availability engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub time: String,
    #[serde(with = "local_datetime")]
    pub start: NaiveDateTime,
    #[serde(with = "local_datetime")]
    pub end: NaiveDateTime,
    pub available_providers: Vec<ProviderId>,
    pub booked_providers: Vec<ProviderId>,
    /// Providers not working during this interval (off schedule or on break).
    pub unavailable_providers: Vec<ProviderId>,
    pub is_blocked: bool,
    pub status: SlotStatus,
}

impl Slot {
    pub fn is_open(&self) -> bool {
        self.status == SlotStatus::Open
    }

    pub fn is_fully_booked(&self) -> bool {
        self.status == SlotStatus::FullyBooked
    }

    pub fn is_available_for(&self, provider_id: ProviderId) -> bool {
        self.available_providers.contains(&provider_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    Blocked,
    NotWorking,
    OutsideWorkingHours,
    OnBreak,
    Conflict,
}

impl UnavailableReason {
    pub fn message(&self) -> &'static str {
        match self {
            UnavailableReason::Blocked => "Date is blocked (holiday or closure)",
            UnavailableReason::NotWorking => "Provider not working on this date",
            UnavailableReason::OutsideWorkingHours => "Outside provider working hours",
            UnavailableReason::OnBreak => "Overlaps with provider break time",
            UnavailableReason::Conflict => "Conflicts with existing appointment(s)",
        }
    }
}

/// Answer for a single provider and interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotCheck {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnavailableReason>,
    pub conflicts: Vec<AppointmentId>,
}

impl SlotCheck {
    pub fn available() -> Self {
        Self {
            available: true,
            reason: None,
            conflicts: Vec::new(),
        }
    }

    pub fn unavailable(reason: UnavailableReason) -> Self {
        Self {
            available: false,
            reason: Some(reason),
            conflicts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub has_appointments: bool,
    pub has_open_slots: bool,
    pub is_fully_booked: bool,
    pub appointment_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityCalendar {
    pub provider_id: ProviderId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available_dates: Vec<NaiveDate>,
    pub slots_by_date: BTreeMap<NaiveDate, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsRequest {
    pub date: NaiveDate,
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub slot_duration: Option<u32>,
    #[serde(default)]
    pub buffer_minutes: Option<u32>,
    #[serde(default)]
    pub filter_past: bool,
    #[serde(default)]
    pub filters: AppointmentFilters,
    /// Opaque token echoed back so callers can drop stale responses.
    #[serde(default)]
    pub generation: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub dates: Vec<NaiveDate>,
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub slot_duration: Option<u32>,
    #[serde(default)]
    pub buffer_minutes: Option<u32>,
    #[serde(default)]
    pub filters: AppointmentFilters,
    #[serde(default)]
    pub generation: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarQuery {
    pub provider_id: ProviderId,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub days: Option<i64>,
    #[serde(default)]
    pub slot_duration: Option<u32>,
    #[serde(default)]
    pub buffer_minutes: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotCheckQuery {
    pub provider_id: ProviderId,
    #[serde(with = "local_datetime")]
    pub start: NaiveDateTime,
    #[serde(with = "local_datetime")]
    pub end: NaiveDateTime,
    #[serde(default)]
    pub exclude_id: Option<AppointmentId>,
    #[serde(default)]
    pub buffer_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateRequest {
    /// Empty means every cached provider.
    #[serde(default)]
    pub provider_ids: Vec<ProviderId>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("Slot duration must be between 1 and 1440 minutes, got {0}")]
    InvalidSlotDuration(u32),

    #[error("Buffer must be one of 0, 15 or 30 minutes, got {0}")]
    InvalidBuffer(u32),

    #[error("Business hours for weekday {weekday} ({start}-{end}) are empty or inverted")]
    InvalidBusinessHours { weekday: u8, start: String, end: String },

    #[error("Interval {start} - {end} is empty or inverted")]
    InvalidInterval { start: NaiveDateTime, end: NaiveDateTime },

    #[error("Date range starting {0} runs past the supported calendar")]
    DateOutOfRange(NaiveDate),

    #[error("Schedule for provider {provider_id} could not be loaded: {message}")]
    ScheduleFetch { provider_id: ProviderId, message: String },

    #[error("Schedule for provider {0} previously failed to load; invalidate it to retry")]
    ScheduleFailed(ProviderId),

    #[error("Appointment source unavailable: {0}")]
    Upstream(String),
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::InvalidSlotDuration(_)
            | AvailabilityError::InvalidBuffer(_)
            | AvailabilityError::InvalidInterval { .. }
            | AvailabilityError::DateOutOfRange(_) => AppError::BadRequest(err.to_string()),
            AvailabilityError::InvalidBusinessHours { .. } => AppError::Internal(err.to_string()),
            AvailabilityError::ScheduleFetch { .. }
            | AvailabilityError::ScheduleFailed(_)
            | AvailabilityError::Upstream(_) => AppError::ExternalService(err.to_string()),
        }
    }
}
