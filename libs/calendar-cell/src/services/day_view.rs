use chrono::NaiveDate;

use shared_models::appointment::FormattedAppointment;

use crate::models::{CalendarError, ColumnProvider, DayViewModel, ProviderColumn};
use crate::services::columns::group_by_provider;
use crate::services::layout::inject_into_slots;
use crate::services::range::{day_label, normalize_day_of_week};
use crate::services::time_grid::TimeGrid;

/// One laid-out grid per provider, restricted to appointments on `date`.
pub(crate) fn provider_columns(
    date: NaiveDate,
    time_grid: &TimeGrid,
    groups: &[(ColumnProvider, Vec<FormattedAppointment>)],
    min_display_minutes: u32,
) -> Result<Vec<ProviderColumn>, CalendarError> {
    groups
        .iter()
        .map(|(provider, events)| {
            let day_events: Vec<FormattedAppointment> =
                events.iter().filter(|event| event.date() == date).cloned().collect();

            let mut grid = time_grid.day_grid(date)?;
            inject_into_slots(&mut grid, &day_events, time_grid, min_display_minutes);

            Ok(ProviderColumn {
                provider: provider.clone(),
                grid,
            })
        })
        .collect()
}

pub fn assemble_day_view(
    date: NaiveDate,
    today: NaiveDate,
    time_grid: &TimeGrid,
    appointments: Vec<FormattedAppointment>,
    min_display_minutes: u32,
) -> Result<DayViewModel, CalendarError> {
    let appointments: Vec<FormattedAppointment> =
        appointments.into_iter().filter(|apt| apt.date() == date).collect();

    let mut grid = time_grid.day_grid(date)?;
    inject_into_slots(&mut grid, &appointments, time_grid, min_display_minutes);

    let groups = group_by_provider(&appointments);
    let provider_columns = provider_columns(date, time_grid, &groups, min_display_minutes)?;
    let day = normalize_day_of_week(date);

    Ok(DayViewModel {
        date,
        day_name: date.format("%A").to_string(),
        day_label: day_label(date),
        weekday_name: day.name,
        weekday: day.index,
        is_today: date == today,
        is_past: date < today,
        business_hours: time_grid.business_hours(),
        grid,
        provider_columns,
        total_appointments: appointments.len(),
        appointments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_config::CalendarConfig;
    use shared_utils::test_utils::{appointment, date};

    #[test]
    fn day_view_builds_one_column_per_provider() {
        let time_grid = TimeGrid::from_config(&CalendarConfig::default()).unwrap();
        let appointments = vec![
            appointment(1, 7, "2026-02-26 09:00", "2026-02-26 10:00"),
            appointment(2, 3, "2026-02-26 09:30", "2026-02-26 10:00"),
            appointment(3, 7, "2026-02-26 09:30", "2026-02-26 10:30"),
            appointment(4, 7, "2026-02-27 09:30", "2026-02-27 10:30"),
        ];

        let view = assemble_day_view(date("2026-02-26"), date("2026-02-26"), &time_grid, appointments, 15).unwrap();

        assert_eq!(view.day_label, "Thursday, February 26, 2026");
        assert_eq!(view.total_appointments, 3);
        assert!(view.is_today && !view.is_past);
        assert_eq!(view.business_hours.start_time, "08:00");

        let ids: Vec<i64> = view.provider_columns.iter().map(|c| c.provider.id).collect();
        assert_eq!(ids, vec![7, 3]);

        // provider 7's two bookings overlap and split their column
        let seven = &view.provider_columns[0].grid;
        let nine = seven.slots.iter().find(|s| s.time == "09:00").unwrap();
        assert_eq!(nine.appointments[0].col_count, 2);

        // provider 3 has a single full-width booking
        let three = &view.provider_columns[1].grid;
        let half = three.slots.iter().find(|s| s.time == "09:30").unwrap();
        assert_eq!(half.appointments[0].col_count, 1);

        // combined grid lays out all three together
        let combined = view.grid.slots.iter().find(|s| s.time == "09:30").unwrap();
        assert_eq!(combined.appointments[0].col_count, 3);
    }

    #[test]
    fn empty_day_uses_placeholder_column() {
        let time_grid = TimeGrid::from_config(&CalendarConfig::default()).unwrap();
        let view = assemble_day_view(date("2026-02-26"), date("2026-03-01"), &time_grid, Vec::new(), 15).unwrap();

        assert!(view.is_past);
        assert_eq!(view.provider_columns.len(), 1);
        assert_eq!(view.provider_columns[0].provider.name, "All Providers");
        assert_eq!(view.provider_columns[0].grid.slots.len(), 20);
    }
}
