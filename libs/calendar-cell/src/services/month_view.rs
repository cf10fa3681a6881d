use std::collections::BTreeMap;

use chrono::NaiveDate;

use shared_models::appointment::FormattedAppointment;
use shared_models::calendar::FirstDayOfWeek;

use crate::models::{CalendarError, MonthViewModel};
use crate::services::range::{generate_month_grid, month_bounds, month_label};

/// Fill a 42-cell month grid with appointment summaries. Each cell keeps at
/// most `max_per_cell` appointments visible and reports the overflow.
pub fn assemble_month_view<F>(
    year: i32,
    month: u32,
    first_day: FirstDayOfWeek,
    today: NaiveDate,
    max_per_cell: usize,
    appointments: Vec<FormattedAppointment>,
    has_availability: F,
) -> Result<MonthViewModel, CalendarError>
where
    F: Fn(NaiveDate) -> bool,
{
    let grid = generate_month_grid(year, month, first_day, today)?;
    let (first_of_month, _) = month_bounds(year, month)?;

    let appointments: Vec<FormattedAppointment> = appointments
        .into_iter()
        .filter(|apt| apt.date() >= grid.start_date && apt.date() <= grid.end_date)
        .collect();

    let mut by_date: BTreeMap<NaiveDate, Vec<&FormattedAppointment>> = BTreeMap::new();
    for apt in &appointments {
        by_date.entry(apt.date()).or_default().push(apt);
    }

    let weeks = grid
        .weeks
        .into_iter()
        .map(|week| {
            week.into_iter()
                .map(|mut cell| {
                    let events = by_date.get(&cell.date).map(Vec::as_slice).unwrap_or_default();
                    let count = events.len();

                    cell.appointments = events.iter().take(max_per_cell).map(|apt| (*apt).clone()).collect();
                    cell.appointment_count = count;
                    cell.has_more = count > max_per_cell;
                    cell.more_count = count.saturating_sub(max_per_cell);
                    cell.has_availability = has_availability(cell.date);
                    cell
                })
                .collect()
        })
        .collect();

    Ok(MonthViewModel {
        year,
        month,
        month_name: grid.month_name,
        month_label: month_label(first_of_month),
        start_date: grid.start_date,
        end_date: grid.end_date,
        weeks,
        total_appointments: appointments.len(),
        appointments,
    })
}
