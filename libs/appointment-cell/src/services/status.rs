use tracing::{debug, warn};

use shared_models::appointment::AppointmentStatus;

use crate::models::RescheduleError;

/// Statuses reachable from `current`. Terminal statuses allow nothing; an
/// unrecognised upstream status may be settled into any known one.
pub fn valid_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    use AppointmentStatus::*;

    match current {
        Pending => &[Confirmed, Cancelled, NoShow],
        Confirmed => &[Completed, Cancelled, NoShow],
        Unknown => &[Pending, Confirmed, Completed, Cancelled, NoShow],
        Completed | Cancelled | NoShow => &[],
    }
}

pub fn validate_status_transition(
    current: AppointmentStatus,
    next: AppointmentStatus,
) -> Result<(), RescheduleError> {
    debug!("Validating status transition from {:?} to {:?}", current, next);

    if !valid_transitions(current).contains(&next) {
        warn!("Invalid status transition attempted: {:?} -> {:?}", current, next);
        return Err(RescheduleError::InvalidStatusChange { from: current, to: next });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn confirmed_can_be_cancelled() {
        assert!(validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::Cancelled).is_ok());
        assert!(validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Confirmed).is_ok());
    }

    #[test]
    fn terminal_statuses_are_final() {
        for terminal in [AppointmentStatus::Completed, AppointmentStatus::Cancelled, AppointmentStatus::NoShow] {
            assert!(valid_transitions(terminal).is_empty());
        }
        assert_matches!(
            validate_status_transition(AppointmentStatus::Cancelled, AppointmentStatus::Confirmed),
            Err(RescheduleError::InvalidStatusChange {
                from: AppointmentStatus::Cancelled,
                to: AppointmentStatus::Confirmed
            })
        );
    }
}
