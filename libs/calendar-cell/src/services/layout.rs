//! Placement of appointments on a day grid: vertical position, side-by-side
//! columns for overlaps, and the grid row each appointment hangs from.

use shared_models::appointment::FormattedAppointment;
use shared_utils::round2;

use crate::models::{DaySlotModel, PositionedAppointment};
use crate::services::time_grid::TimeGrid;

/// Vertical placement relative to the grid's day start. Heights use at least
/// `min_display_minutes` so very short appointments stay visible.
pub fn position_events(
    events: &[FormattedAppointment],
    day_start_minutes: u32,
    pixels_per_minute: u32,
    min_display_minutes: u32,
) -> Vec<PositionedAppointment> {
    let ppm = i64::from(pixels_per_minute);

    events
        .iter()
        .map(|event| {
            let start_min = event.start_minute_of_day();
            let duration = event.duration_minutes().max(i64::from(min_display_minutes));
            let end_min = start_min + u32::try_from(duration).unwrap_or(0);

            PositionedAppointment {
                appointment: event.clone(),
                top_px: (i64::from(start_min) - i64::from(day_start_minutes)) * ppm,
                height_px: duration * ppm,
                start_min,
                end_min,
                col_index: 0,
                col_count: 1,
                width_pct: 100.0,
                left_pct: 0.0,
            }
        })
        .collect()
}

/// Greedy sweep-line column assignment.
///
/// Events are sorted by start (stable). An event joins the most recently
/// started group whenever anything is still active when it starts, even if it
/// does not overlap every member of that group, so a group can reserve more
/// columns than it strictly needs. Renderers depend on this exact layout.
pub fn resolve_columns(mut events: Vec<PositionedAppointment>) -> Vec<PositionedAppointment> {
    events.sort_by_key(|event| event.start_min);

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut active: Vec<usize> = Vec::new();

    for index in 0..events.len() {
        let start = events[index].start_min;
        active.retain(|&other| events[other].end_min > start);

        match groups.last_mut() {
            Some(group) if !active.is_empty() => group.push(index),
            _ => groups.push(vec![index]),
        }
        active.push(index);
    }

    for group in &groups {
        let col_count = group.len();
        for (col_index, &event_index) in group.iter().enumerate() {
            let event = &mut events[event_index];
            event.col_index = col_index;
            event.col_count = col_count;
            event.width_pct = round2(100.0 / col_count as f64);
            event.left_pct = round2(100.0 * col_index as f64 / col_count as f64);
        }
    }

    events
}

/// Grid row an appointment starting at `start_minutes` (after midnight) belongs to.
pub fn slot_boundary(start_minutes: u32, resolution: u32) -> u32 {
    if resolution == 0 {
        return start_minutes;
    }
    (start_minutes / resolution) * resolution
}

/// Position, resolve and attach `events` to the rows of `grid`. An appointment
/// whose boundary row is outside the grid is laid out but not attached.
pub fn inject_into_slots(
    grid: &mut DaySlotModel,
    events: &[FormattedAppointment],
    time_grid: &TimeGrid,
    min_display_minutes: u32,
) {
    if events.is_empty() {
        return;
    }

    let day_start = time_grid.day_start_minutes();
    let positioned = resolve_columns(position_events(
        events,
        day_start,
        time_grid.pixels_per_minute(),
        min_display_minutes,
    ));

    for event in positioned {
        let boundary = slot_boundary(event.start_min, time_grid.resolution());
        let row = grid
            .slots
            .iter_mut()
            .find(|slot| day_start + slot.minutes == boundary);

        if let Some(slot) = row {
            slot.appointments.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared_models::calendar::Resolution;
    use shared_utils::test_utils::{appointment, at};

    fn positioned(id: i64, start: &str, end: &str) -> PositionedAppointment {
        let apt = appointment(id, 1, &format!("2026-02-26 {}", start), &format!("2026-02-26 {}", end));
        position_events(&[apt], 480, 2, 15).remove(0)
    }

    fn columns(events: &[PositionedAppointment]) -> Vec<(i64, usize, usize)> {
        events
            .iter()
            .map(|e| (e.appointment.id, e.col_index, e.col_count))
            .collect()
    }

    #[test]
    fn positions_relative_to_day_start_with_display_floor() {
        let short = positioned(1, "09:00", "09:05");
        assert_eq!(short.top_px, 120);
        assert_eq!(short.height_px, 30);
        assert_eq!((short.start_min, short.end_min), (540, 555));

        let early = positioned(2, "07:30", "08:30");
        assert_eq!(early.top_px, -60);
        assert_eq!(early.height_px, 120);
    }

    #[test]
    fn disjoint_events_each_get_full_width() {
        let events = resolve_columns(vec![
            positioned(1, "09:00", "09:30"),
            positioned(2, "09:30", "10:00"),
        ]);
        assert_eq!(columns(&events), vec![(1, 0, 1), (2, 0, 1)]);
        assert_eq!(events[1].width_pct, 100.0);
    }

    #[test]
    fn overlapping_pair_splits_in_half() {
        let events = resolve_columns(vec![
            positioned(2, "10:15", "10:45"),
            positioned(1, "10:00", "10:30"),
        ]);
        assert_eq!(columns(&events), vec![(1, 0, 2), (2, 1, 2)]);
        assert_eq!(events[1].width_pct, 50.0);
        assert_eq!(events[1].left_pct, 50.0);
    }

    #[test]
    fn chained_overlaps_share_one_group() {
        // C does not overlap A, yet joins A's group because B is still active.
        let events = resolve_columns(vec![
            positioned(1, "09:00", "10:00"),
            positioned(2, "09:30", "10:30"),
            positioned(3, "10:15", "10:45"),
        ]);
        assert_eq!(columns(&events), vec![(1, 0, 3), (2, 1, 3), (3, 2, 3)]);
        assert_eq!(events[0].width_pct, 33.33);
        assert_eq!(events[2].left_pct, 66.67);
    }

    #[test]
    fn resolving_twice_is_stable() {
        let once = resolve_columns(vec![
            positioned(1, "09:00", "10:00"),
            positioned(2, "09:00", "09:30"),
            positioned(3, "11:00", "11:30"),
            positioned(4, "09:45", "10:15"),
        ]);
        let twice = resolve_columns(once.clone());
        assert_eq!(columns(&once), columns(&twice));
        assert_eq!(columns(&once)[0..2], [(1, 0, 3), (2, 1, 3)]);
    }

    #[test]
    fn slot_boundary_truncates_to_resolution() {
        assert_eq!(slot_boundary(9 * 60 + 47, 30), 9 * 60 + 30);
        assert_eq!(slot_boundary(9 * 60 + 47, 15), 9 * 60 + 45);
        assert_eq!(slot_boundary(9 * 60, 60), 9 * 60);
    }

    #[test]
    fn injection_hangs_each_event_from_its_boundary_row() {
        let time_grid = TimeGrid::new(
            at("2026-02-26 08:00").time(),
            at("2026-02-26 12:00").time(),
            Resolution::try_from(30).unwrap(),
            2,
        )
        .unwrap();
        let mut grid = time_grid.day_grid(NaiveDate::from_ymd_opt(2026, 2, 26).unwrap()).unwrap();

        let events = vec![
            appointment(1, 1, "2026-02-26 09:47", "2026-02-26 10:15"),
            appointment(2, 1, "2026-02-26 09:30", "2026-02-26 10:00"),
            appointment(3, 1, "2026-02-26 13:00", "2026-02-26 13:30"),
        ];
        inject_into_slots(&mut grid, &events, &time_grid, 15);

        let row = grid.slots.iter().find(|s| s.time == "09:30").unwrap();
        let ids: Vec<i64> = row.appointments.iter().map(|e| e.appointment.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(row.appointments[0].col_count, 2);

        let attached: usize = grid.slots.iter().map(|s| s.appointments.len()).sum();
        assert_eq!(attached, 2);
    }
}
