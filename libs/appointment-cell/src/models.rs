use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::appointment::{AppointmentId, AppointmentStatus, FormattedAppointment};
use shared_models::calendar::ProviderId;
use shared_models::error::AppError;
use shared_models::time::{hhmm_option, local_datetime};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Where an appointment was dropped. A drop without a time (a month cell)
/// keeps the appointment's original time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTarget {
    pub date: NaiveDate,
    #[serde(default, with = "hhmm_option")]
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleRequest {
    #[serde(flatten)]
    pub target: DropTarget,
    #[serde(default)]
    pub generation: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChangeRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// RESULT MODELS
// ==============================================================================

/// A validated move: the old interval, the new one, duration preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleProposal {
    pub appointment_id: AppointmentId,
    pub provider_id: ProviderId,
    #[serde(with = "local_datetime")]
    pub original_start: NaiveDateTime,
    #[serde(with = "local_datetime")]
    pub original_end: NaiveDateTime,
    #[serde(with = "local_datetime")]
    pub new_start: NaiveDateTime,
    #[serde(with = "local_datetime")]
    pub new_end: NaiveDateTime,
}

impl RescheduleProposal {
    pub fn duration_minutes(&self) -> i64 {
        (self.new_end - self.new_start).num_minutes()
    }
}

/// A committed move plus the appointment as the upstream now reports it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleOutcome {
    pub proposal: RescheduleProposal,
    pub appointment: Option<FormattedAppointment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub has_conflict: bool,
    pub conflicts: Vec<FormattedAppointment>,
    pub message: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RescheduleError {
    #[error("Cannot schedule appointments in the past")]
    PastTime,

    #[error("Appointments must be within business hours ({start} - {end})")]
    OutsideBusinessHours { start: String, end: String },

    #[error("{message}")]
    Conflict {
        message: String,
        conflicts: Vec<AppointmentId>,
    },

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("Cannot change status from {from:?} to {to:?}")]
    InvalidStatusChange {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment {0} not found")]
    NotFound(AppointmentId),

    #[error("Change was not saved: {message}")]
    CommitFailed {
        message: String,
        /// Authoritative state reloaded after the failed commit.
        current: Option<Box<FormattedAppointment>>,
    },

    #[error("Cannot move an appointment to {0}")]
    OutOfRange(NaiveDate),

    #[error("Appointment source unavailable: {0}")]
    Upstream(String),
}

impl RescheduleError {
    /// Short machine-readable reason so clients can tell rejections apart.
    pub fn reason(&self) -> &'static str {
        match self {
            RescheduleError::PastTime => "past_time",
            RescheduleError::OutsideBusinessHours { .. } => "outside_business_hours",
            RescheduleError::Conflict { .. } => "conflict",
            RescheduleError::InvalidTransition { .. } => "invalid_transition",
            RescheduleError::InvalidStatusChange { .. } => "invalid_status_change",
            RescheduleError::NotFound(_) => "not_found",
            RescheduleError::CommitFailed { .. } => "commit_failed",
            RescheduleError::OutOfRange(_) => "out_of_range",
            RescheduleError::Upstream(_) => "upstream",
        }
    }
}

impl From<RescheduleError> for AppError {
    fn from(err: RescheduleError) -> Self {
        let reason = err.reason();
        match err {
            RescheduleError::PastTime
            | RescheduleError::OutsideBusinessHours { .. }
            | RescheduleError::OutOfRange(_) => AppError::Rejected {
                reason,
                message: err.to_string(),
            },
            RescheduleError::Conflict { .. } | RescheduleError::InvalidTransition { .. } => {
                AppError::Conflict(err.to_string())
            }
            RescheduleError::InvalidStatusChange { .. } => AppError::ValidationError(err.to_string()),
            RescheduleError::NotFound(_) => AppError::NotFound(err.to_string()),
            RescheduleError::CommitFailed { .. } | RescheduleError::Upstream(_) => {
                AppError::ExternalService(err.to_string())
            }
        }
    }
}
