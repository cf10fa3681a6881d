use chrono::{NaiveDateTime, NaiveTime, Timelike};
use tracing::{debug, warn};

use shared_config::CalendarConfig;
use shared_models::appointment::FormattedAppointment;
use shared_models::time::format_hhmm;

use crate::models::{DropTarget, RescheduleError, RescheduleProposal};
use crate::services::conflict::check_for_conflicts;

/// Validates drag-and-drop moves against the clock, the calendar's business
/// hours and the provider's other bookings, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescheduleValidator {
    day_start: NaiveTime,
    day_end: NaiveTime,
}

impl RescheduleValidator {
    pub fn new(day_start: NaiveTime, day_end: NaiveTime) -> Self {
        Self { day_start, day_end }
    }

    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::new(config.day_start, config.day_end)
    }

    /// New interval for `appointment` dropped on `target`, keeping its duration.
    pub fn propose(
        &self,
        appointment: &FormattedAppointment,
        target: &DropTarget,
    ) -> Result<RescheduleProposal, RescheduleError> {
        let time = target.time.unwrap_or_else(|| appointment.start.time());
        let new_start = target.date.and_time(time);
        let new_end = new_start
            .checked_add_signed(appointment.end - appointment.start)
            .ok_or(RescheduleError::OutOfRange(target.date))?;

        Ok(RescheduleProposal {
            appointment_id: appointment.id,
            provider_id: appointment.provider_id,
            original_start: appointment.start,
            original_end: appointment.end,
            new_start,
            new_end,
        })
    }

    pub fn validate(
        &self,
        proposal: &RescheduleProposal,
        now: NaiveDateTime,
        appointments: &[FormattedAppointment],
    ) -> Result<(), RescheduleError> {
        debug!(
            "Validating move of appointment {} to {} ({} min)",
            proposal.appointment_id,
            proposal.new_start,
            proposal.duration_minutes()
        );

        if proposal.new_start < now {
            warn!("Rejected move of appointment {} into the past", proposal.appointment_id);
            return Err(RescheduleError::PastTime);
        }

        if !self.within_business_hours(proposal.new_start, proposal.new_end) {
            warn!(
                "Rejected move of appointment {} outside business hours",
                proposal.appointment_id
            );
            return Err(RescheduleError::OutsideBusinessHours {
                start: format_hhmm(self.day_start),
                end: format_hhmm(self.day_end),
            });
        }

        let report = check_for_conflicts(
            proposal.new_start,
            proposal.new_end,
            proposal.provider_id,
            Some(proposal.appointment_id),
            appointments,
        );
        if report.has_conflict {
            return Err(RescheduleError::Conflict {
                message: report.message.unwrap_or_default(),
                conflicts: report.conflicts.iter().map(|apt| apt.id).collect(),
            });
        }

        Ok(())
    }

    /// Hour-level check: the start hour may not precede the opening hour and
    /// the end hour may not pass the closing hour.
    fn within_business_hours(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        if end.date() != start.date() {
            return false;
        }
        start.hour() >= self.day_start.hour() && end.hour() <= self.day_end.hour()
    }
}
