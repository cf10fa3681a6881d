use chrono::NaiveDate;

use shared_models::appointment::FormattedAppointment;
use shared_models::calendar::FirstDayOfWeek;

use crate::models::{CalendarError, WeekViewDay, WeekViewModel};
use crate::services::columns::group_by_provider;
use crate::services::day_view::provider_columns;
use crate::services::layout::inject_into_slots;
use crate::services::range::{generate_week_range, week_label};
use crate::services::time_grid::TimeGrid;

/// Seven day grids sharing one set of provider columns for the whole week.
pub fn assemble_week_view(
    anchor: NaiveDate,
    first_day: FirstDayOfWeek,
    today: NaiveDate,
    time_grid: &TimeGrid,
    appointments: Vec<FormattedAppointment>,
    min_display_minutes: u32,
) -> Result<WeekViewModel, CalendarError> {
    let range = generate_week_range(anchor, first_day, today)?;

    let appointments: Vec<FormattedAppointment> = appointments
        .into_iter()
        .filter(|apt| apt.date() >= range.start_date && apt.date() <= range.end_date)
        .collect();
    let groups = group_by_provider(&appointments);

    let days = range
        .days
        .into_iter()
        .map(|day| {
            let day_events: Vec<FormattedAppointment> = appointments
                .iter()
                .filter(|apt| apt.date() == day.date)
                .cloned()
                .collect();

            let mut day_grid = time_grid.day_grid(day.date)?;
            inject_into_slots(&mut day_grid, &day_events, time_grid, min_display_minutes);

            Ok(WeekViewDay {
                provider_columns: provider_columns(day.date, time_grid, &groups, min_display_minutes)?,
                appointment_count: day_events.len(),
                appointments: day_events,
                day_grid,
                day,
            })
        })
        .collect::<Result<Vec<_>, CalendarError>>()?;

    Ok(WeekViewModel {
        start_date: range.start_date,
        end_date: range.end_date,
        week_label: week_label(range.start_date, range.end_date),
        business_hours: time_grid.business_hours(),
        slot_duration: time_grid.resolution(),
        days,
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
    fn week_view_distributes_appointments_by_day() {
        let time_grid = TimeGrid::from_config(&CalendarConfig::default()).unwrap();
        let appointments = vec![
            appointment(1, 1, "2026-02-23 09:00", "2026-02-23 09:30"),
            appointment(2, 2, "2026-02-26 14:00", "2026-02-26 14:30"),
            appointment(3, 1, "2026-03-01 10:00", "2026-03-01 11:00"),
            appointment(4, 1, "2026-03-02 10:00", "2026-03-02 11:00"),
        ];

        let view = assemble_week_view(
            date("2026-02-26"),
            FirstDayOfWeek::Monday,
            date("2026-02-26"),
            &time_grid,
            appointments,
            15,
        )
        .unwrap();

        assert_eq!(view.week_label, "Feb 23 – Mar 1, 2026");
        assert_eq!(view.days.len(), 7);
        assert_eq!(view.total_appointments, 3);
        assert_eq!(view.slot_duration, 30);

        let counts: Vec<usize> = view.days.iter().map(|d| d.appointment_count).collect();
        assert_eq!(counts, vec![1, 0, 0, 1, 0, 0, 1]);

        // every day carries the same week-wide provider columns
        for day in &view.days {
            let ids: Vec<i64> = day.provider_columns.iter().map(|c| c.provider.id).collect();
            assert_eq!(ids, vec![1, 2]);
        }

        let thursday = &view.days[3];
        assert!(thursday.day.is_today);
        let two_pm = thursday.provider_columns[1].grid.slots.iter().find(|s| s.time == "14:00").unwrap();
        assert_eq!(two_pm.appointments.len(), 1);
        assert!(thursday.provider_columns[0].grid.slots.iter().all(|s| s.appointments.is_empty()));
    }

    #[test]
    fn sunday_first_week_label_within_one_month() {
        let time_grid = TimeGrid::from_config(&CalendarConfig::default()).unwrap();
        let view = assemble_week_view(
            date("2026-02-11"),
            FirstDayOfWeek::Sunday,
            date("2026-02-26"),
            &time_grid,
            Vec::new(),
            15,
        )
        .unwrap();

        assert_eq!(view.start_date, date("2026-02-08"));
        assert_eq!(view.week_label, "Feb 8 – 14, 2026");
        assert!(view.days.iter().all(|d| d.day.is_past));
        assert_eq!(view.days[0].provider_columns[0].provider.name, "All Providers");
    }
}
