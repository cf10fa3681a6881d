//! Pure date arithmetic for every calendar view. Nothing here reads the clock;
//! `today` always comes from the caller.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

use shared_models::calendar::{weekday_index, weekday_name, FirstDayOfWeek, Resolution};
use shared_models::time::{format_hhmm, parse_hhmm};
use shared_utils::{format_minutes, minutes_of_day};

use crate::models::{
    CalendarCell, CalendarError, DayOfWeek, DaySlotModel, MonthGridModel, TimeSlot, WeekDay, WeekRangeModel,
};

pub const MONTH_GRID_CELLS: usize = 42;

/// First `first_day` on or before `date`.
pub fn week_start(date: NaiveDate, first_day: FirstDayOfWeek) -> Result<NaiveDate, CalendarError> {
    let diff = (i64::from(weekday_index(date)) - i64::from(first_day.index()) + 7) % 7;
    date.checked_sub_signed(Duration::days(diff))
        .ok_or(CalendarError::DateOutOfRange(date))
}

fn days_after(date: NaiveDate, days: i64) -> Result<NaiveDate, CalendarError> {
    date.checked_add_signed(Duration::days(days))
        .ok_or(CalendarError::DateOutOfRange(date))
}

pub fn normalize_day_of_week(date: NaiveDate) -> DayOfWeek {
    let index = weekday_index(date);
    DayOfWeek {
        index,
        name: weekday_name(index),
    }
}

pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), CalendarError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(CalendarError::InvalidMonth { year, month })?;
    let last = if month == 12 {
        NaiveDate::from_ymd_opt(year, 12, 31)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).and_then(|next| next.pred_opt())
    }
    .ok_or(CalendarError::InvalidMonth { year, month })?;
    Ok((first, last))
}

pub fn generate_month_grid(
    year: i32,
    month: u32,
    first_day: FirstDayOfWeek,
    today: NaiveDate,
) -> Result<MonthGridModel, CalendarError> {
    let (first_of_month, _) = month_bounds(year, month)?;
    let grid_start = week_start(first_of_month, first_day)?;
    let grid_end = days_after(grid_start, MONTH_GRID_CELLS as i64 - 1)?;

    let cells: Vec<CalendarCell> = grid_start
        .iter_days()
        .take(MONTH_GRID_CELLS)
        .map(|date| month_cell(date, month, today))
        .collect();

    Ok(MonthGridModel {
        year,
        month,
        month_name: first_of_month.format("%B").to_string(),
        start_date: grid_start,
        end_date: grid_end,
        weeks: cells.chunks(7).map(|week| week.to_vec()).collect(),
    })
}

fn month_cell(date: NaiveDate, month: u32, today: NaiveDate) -> CalendarCell {
    let weekday = weekday_index(date);
    let is_today = date == today;
    CalendarCell {
        date,
        day_number: date.day(),
        weekday,
        weekday_name: weekday_name(weekday),
        week_of_year: date.iso_week().week(),
        is_current_month: date.month() == month,
        is_today,
        is_past: date < today && !is_today,
        is_future: date > today,
        appointments: Vec::new(),
        appointment_count: 0,
        has_more: false,
        more_count: 0,
        has_availability: false,
    }
}

pub fn generate_week_range(
    anchor: NaiveDate,
    first_day: FirstDayOfWeek,
    today: NaiveDate,
) -> Result<WeekRangeModel, CalendarError> {
    let start = week_start(anchor, first_day)?;
    let end = days_after(start, 6)?;

    let days = start
        .iter_days()
        .take(7)
        .map(|date| {
            let weekday = weekday_index(date);
            WeekDay {
                date,
                day_number: date.day(),
                month_name: date.format("%b").to_string(),
                full_date: date.format("%a, %b %-d").to_string(),
                weekday,
                weekday_name: weekday_name(weekday),
                is_today: date == today,
                is_past: date < today,
            }
        })
        .collect();

    Ok(WeekRangeModel {
        start_date: start,
        end_date: end,
        days,
    })
}

/// Day grid from `HH:MM` bounds. Inputs are validated, never coerced.
pub fn generate_day_slots(
    date: NaiveDate,
    start_time: &str,
    end_time: &str,
    resolution_minutes: u32,
    pixels_per_minute: u32,
) -> Result<DaySlotModel, CalendarError> {
    let start = parse_hhmm(start_time)?;
    let end = parse_hhmm(end_time)?;
    let resolution = Resolution::try_from(resolution_minutes)?;
    build_day_slots(date, start, end, resolution, pixels_per_minute)
}

pub(crate) fn build_day_slots(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    resolution: Resolution,
    pixels_per_minute: u32,
) -> Result<DaySlotModel, CalendarError> {
    if start >= end {
        return Err(CalendarError::DayWindow {
            start: format_hhmm(start),
            end: format_hhmm(end),
        });
    }
    if pixels_per_minute == 0 {
        return Err(CalendarError::PixelDensity);
    }

    let start_minutes = minutes_of_day(start);
    let end_minutes = minutes_of_day(end);
    let total_minutes = end_minutes - start_minutes;

    let slots = (start_minutes..end_minutes)
        .step_by(resolution.minutes() as usize)
        .map(|minute| {
            let offset = minute - start_minutes;
            let time = format_minutes(minute);
            TimeSlot {
                label: time.clone(),
                time,
                minutes: offset,
                is_hour: minute % 60 == 0,
                is_half: minute % 60 == 30,
                top_px: offset * pixels_per_minute,
                appointments: Vec::new(),
            }
        })
        .collect();

    Ok(DaySlotModel {
        date,
        day_start: format_hhmm(start),
        day_end: format_hhmm(end),
        total_minutes,
        pixels_per_minute,
        container_height: total_minutes * pixels_per_minute,
        slots,
    })
}

/// "February 2026"
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// "Feb 2 – 8, 2026", "Feb 23 – Mar 1, 2026" or "Dec 29, 2025 – Jan 4, 2026".
pub fn week_label(start: NaiveDate, end: NaiveDate) -> String {
    if start.year() == end.year() && start.month() == end.month() {
        format!("{} – {}", start.format("%b %-d"), end.format("%-d, %Y"))
    } else if start.year() == end.year() {
        format!("{} – {}", start.format("%b %-d"), end.format("%b %-d, %Y"))
    } else {
        format!("{} – {}", start.format("%b %-d, %Y"), end.format("%b %-d, %Y"))
    }
}

/// "Thursday, February 26, 2026"
pub fn day_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn d(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    const FIRST_DAYS: [FirstDayOfWeek; 3] = [FirstDayOfWeek::Sunday, FirstDayOfWeek::Monday, FirstDayOfWeek::Saturday];

    #[test]
    fn month_grid_always_has_42_aligned_cells() {
        let today = d("2026-02-26");
        for year in [2024, 2025, 2026, 2027] {
            for month in 1..=12 {
                for first_day in FIRST_DAYS {
                    let grid = generate_month_grid(year, month, first_day, today).unwrap();
                    assert_eq!(grid.cells().count(), 42);
                    assert_eq!(grid.weeks.len(), 6);
                    assert!(grid.weeks.iter().all(|week| week.len() == 7));
                    assert_eq!(grid.weeks[0][0].weekday, first_day.index());
                    assert_eq!(grid.end_date - grid.start_date, Duration::days(41));
                }
            }
        }
    }

    #[test]
    fn february_2026_monday_grid() {
        let grid = generate_month_grid(2026, 2, FirstDayOfWeek::Monday, d("2026-02-26")).unwrap();

        assert_eq!(grid.start_date, d("2026-01-26"));
        assert_eq!(grid.end_date, d("2026-03-08"));
        assert_eq!(grid.month_name, "February");

        let today = grid.cells().find(|c| c.date == d("2026-02-26")).unwrap();
        assert!(today.is_today && today.is_current_month);
        assert!(!today.is_past && !today.is_future);
        assert_eq!(today.weekday_name, "thursday");
        assert_eq!(today.week_of_year, 9);

        let january = grid.cells().next().unwrap();
        assert!(!january.is_current_month && january.is_past);
        assert!(grid.cells().last().unwrap().is_future);
    }

    #[test]
    fn month_starting_on_first_day_is_not_shifted() {
        // 2026-03-01 is a Sunday
        let grid = generate_month_grid(2026, 3, FirstDayOfWeek::Sunday, d("2026-02-26")).unwrap();
        assert_eq!(grid.start_date, d("2026-03-01"));
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert_matches!(
            generate_month_grid(2026, 13, FirstDayOfWeek::Monday, d("2026-02-26")),
            Err(CalendarError::InvalidMonth { year: 2026, month: 13 })
        );
    }

    #[test]
    fn ranges_at_the_calendar_edges_are_errors() {
        let today = d("2026-02-26");

        // the grid would start in the week before the first representable date
        let min = NaiveDate::MIN;
        let first_day = FIRST_DAYS
            .into_iter()
            .find(|day| day.index() != weekday_index(min))
            .unwrap();
        assert_matches!(
            generate_month_grid(min.year(), 1, first_day, today),
            Err(CalendarError::DateOutOfRange(_))
        );
        assert_matches!(generate_week_range(min, first_day, today), Err(CalendarError::DateOutOfRange(_)));

        // and the last month cannot fill 42 cells
        let max = NaiveDate::MAX;
        assert_matches!(
            generate_month_grid(max.year(), 12, FirstDayOfWeek::Monday, today),
            Err(CalendarError::DateOutOfRange(_))
        );
        assert_eq!(month_bounds(max.year(), 12).unwrap().1, max);
        assert_matches!(month_bounds(i32::MAX, 12), Err(CalendarError::InvalidMonth { .. }));
    }

    #[test]
    fn week_range_is_seven_aligned_days() {
        for first_day in FIRST_DAYS {
            for anchor in d("2026-02-20").iter_days().take(10) {
                let week = generate_week_range(anchor, first_day, d("2026-02-26")).unwrap();
                assert_eq!(week.days.len(), 7);
                assert_eq!(week.days[0].weekday, first_day.index());
                assert!(week.days.iter().any(|day| day.date == anchor));
            }
        }

        let week = generate_week_range(d("2026-02-26"), FirstDayOfWeek::Monday, d("2026-02-26")).unwrap();
        assert_eq!(week.start_date, d("2026-02-23"));
        assert_eq!(week.end_date, d("2026-03-01"));
        assert_eq!(week.days[3].full_date, "Thu, Feb 26");
        assert!(week.days[3].is_today);
        assert!(week.days[2].is_past && !week.days[3].is_past);
    }

    #[test]
    fn day_slots_truncate_the_trailing_partial_slot() {
        let grid = generate_day_slots(d("2026-02-26"), "08:00", "09:10", 30, 2).unwrap();

        let times: Vec<&str> = grid.slots.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, vec!["08:00", "08:30"]);
        assert_eq!(grid.slots[1].minutes, 30);
        assert_eq!(grid.slots[1].top_px, 60);
        assert!(grid.slots[0].is_hour && grid.slots[1].is_half);
        assert_eq!(grid.total_minutes, 70);
        assert_eq!(grid.container_height, 140);
    }

    #[test]
    fn day_slots_reject_bad_input() {
        let date = d("2026-02-26");
        assert_matches!(generate_day_slots(date, "8am", "18:00", 30, 2), Err(CalendarError::InvalidInput(_)));
        assert_matches!(generate_day_slots(date, "08:00", "18:00", 20, 2), Err(CalendarError::InvalidValue(_)));
        assert_matches!(generate_day_slots(date, "18:00", "08:00", 30, 2), Err(CalendarError::DayWindow { .. }));
        assert_matches!(generate_day_slots(date, "08:00", "18:00", 30, 0), Err(CalendarError::PixelDensity));
    }

    #[test]
    fn labels_and_bounds() {
        assert_eq!(month_label(d("2026-02-01")), "February 2026");
        assert_eq!(week_label(d("2026-02-02"), d("2026-02-08")), "Feb 2 – 8, 2026");
        assert_eq!(week_label(d("2026-02-23"), d("2026-03-01")), "Feb 23 – Mar 1, 2026");
        assert_eq!(week_label(d("2025-12-29"), d("2026-01-04")), "Dec 29, 2025 – Jan 4, 2026");
        assert_eq!(day_label(d("2026-02-26")), "Thursday, February 26, 2026");

        assert_eq!(month_bounds(2024, 2).unwrap(), (d("2024-02-01"), d("2024-02-29")));
        assert_eq!(month_bounds(2026, 12).unwrap().1, d("2026-12-31"));

        let day = normalize_day_of_week(d("2026-02-26"));
        assert_eq!((day.index, day.name), (4, "thursday"));
    }
}
