use chrono::NaiveDateTime;
use tracing::{debug, warn};

use shared_models::appointment::{AppointmentId, FormattedAppointment};
use shared_models::calendar::ProviderId;
use shared_utils::overlaps;

use crate::models::ConflictReport;

/// Blocking appointments of `provider_id` whose interval overlaps `start..end`.
/// Touching intervals do not conflict; `exclude` skips the appointment being moved.
pub fn find_conflicts<'a>(
    start: NaiveDateTime,
    end: NaiveDateTime,
    provider_id: ProviderId,
    exclude: Option<AppointmentId>,
    appointments: &'a [FormattedAppointment],
) -> Vec<&'a FormattedAppointment> {
    appointments
        .iter()
        .filter(|apt| apt.provider_id == provider_id)
        .filter(|apt| Some(apt.id) != exclude)
        .filter(|apt| apt.status.is_blocking())
        .filter(|apt| overlaps(start, end, apt.start, apt.end))
        .collect()
}

/// Same as [`find_conflicts`] but packaged with a message naming the clashing times.
pub fn check_for_conflicts(
    start: NaiveDateTime,
    end: NaiveDateTime,
    provider_id: ProviderId,
    exclude: Option<AppointmentId>,
    appointments: &[FormattedAppointment],
) -> ConflictReport {
    debug!("Checking conflicts for provider {} from {} to {}", provider_id, start, end);

    let conflicts: Vec<FormattedAppointment> = find_conflicts(start, end, provider_id, exclude, appointments)
        .into_iter()
        .cloned()
        .collect();

    if conflicts.is_empty() {
        return ConflictReport {
            has_conflict: false,
            conflicts,
            message: None,
        };
    }

    warn!(
        "Conflict detected for provider {} - {} conflicting appointments",
        provider_id,
        conflicts.len()
    );

    let times: Vec<String> = conflicts
        .iter()
        .map(|apt| format!("{} - {}", apt.start.format("%H:%M"), apt.end.format("%H:%M")))
        .collect();

    ConflictReport {
        has_conflict: true,
        message: Some(format!("Conflicts with existing appointment(s): {}", times.join(", "))),
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::appointment::AppointmentStatus;
    use shared_utils::test_utils::{appointment, at};

    fn day() -> Vec<FormattedAppointment> {
        let mut cancelled = appointment(3, 1, "2026-03-02 15:00", "2026-03-02 15:30");
        cancelled.status = AppointmentStatus::Cancelled;

        vec![
            appointment(1, 1, "2026-03-02 14:00", "2026-03-02 14:30"),
            appointment(2, 2, "2026-03-02 14:00", "2026-03-02 14:30"),
            cancelled,
            appointment(4, 1, "2026-03-02 16:00", "2026-03-02 17:00"),
        ]
    }

    #[test]
    fn overlapping_same_provider_conflicts() {
        let appointments = day();
        let found = find_conflicts(at("2026-03-02 14:15"), at("2026-03-02 14:45"), 1, None, &appointments);
        let ids: Vec<AppointmentId> = found.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn touching_intervals_do_not_conflict() {
        let appointments = day();
        assert!(find_conflicts(at("2026-03-02 14:30"), at("2026-03-02 15:00"), 1, None, &appointments).is_empty());
        assert!(find_conflicts(at("2026-03-02 13:30"), at("2026-03-02 14:00"), 1, None, &appointments).is_empty());
    }

    #[test]
    fn cancelled_and_excluded_appointments_are_ignored() {
        let appointments = day();
        assert!(find_conflicts(at("2026-03-02 15:00"), at("2026-03-02 15:30"), 1, None, &appointments).is_empty());
        assert!(find_conflicts(at("2026-03-02 14:00"), at("2026-03-02 14:30"), 1, Some(1), &appointments).is_empty());
    }

    #[test]
    fn report_lists_conflicting_times() {
        let appointments = day();
        let report = check_for_conflicts(at("2026-03-02 14:15"), at("2026-03-02 16:15"), 1, None, &appointments);

        assert!(report.has_conflict);
        assert_eq!(report.conflicts.len(), 2);
        assert_eq!(
            report.message.as_deref(),
            Some("Conflicts with existing appointment(s): 14:00 - 14:30, 16:00 - 17:00")
        );

        let clear = check_for_conflicts(at("2026-03-02 09:00"), at("2026-03-02 09:30"), 1, None, &appointments);
        assert!(!clear.has_conflict);
        assert!(clear.message.is_none());
    }
}
