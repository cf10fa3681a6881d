use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use shared_config::CalendarConfig;
use shared_models::appointment::{AppointmentId, FormattedAppointment};
use shared_models::calendar::{
    is_date_blocked, is_weekend, weekday_index, BlockedPeriod, BusinessHours, Provider, ProviderId,
    ProviderSchedule, TimeWindow, BUFFER_MINUTES,
};
use shared_utils::overlaps;

use crate::models::{AvailabilityError, DayAvailability, Slot, SlotCheck, SlotStatus, UnavailableReason};

const MAX_SLOT_MINUTES: u32 = 24 * 60;

/// Everything one slot computation reads. Borrowed so callers keep ownership of
/// their snapshots.
#[derive(Debug, Clone, Copy)]
pub struct SlotRequest<'a> {
    pub date: NaiveDate,
    pub business_hours: &'a BusinessHours,
    pub slot_duration_minutes: u32,
    /// Kept free after each booking and added to the step between slot starts.
    pub buffer_minutes: u32,
    pub appointments: &'a [FormattedAppointment],
    pub providers: &'a [Provider],
    pub blocked_periods: &'a [BlockedPeriod],
    pub provider_schedules: &'a HashMap<ProviderId, ProviderSchedule>,
    /// When set and `date` is the same day, slots starting before this instant are omitted.
    pub filter_past: Option<NaiveDateTime>,
}

/// One provider and one concrete interval, as asked by a booking form.
#[derive(Debug, Clone, Copy)]
pub struct SlotCheckRequest<'a> {
    pub provider_id: ProviderId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub business_hours: &'a BusinessHours,
    pub schedule: Option<&'a ProviderSchedule>,
    pub blocked_periods: &'a [BlockedPeriod],
    pub appointments: &'a [FormattedAppointment],
    pub buffer_minutes: u32,
    /// The appointment being moved, which never conflicts with itself.
    pub exclude: Option<AppointmentId>,
}

/// A provider's working hours for one date.
#[derive(Debug, Clone, Copy, Default)]
struct WorkingDay {
    window: Option<TimeWindow>,
    pause: Option<TimeWindow>,
}

impl WorkingDay {
    fn on_break(&self, date: NaiveDate, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.pause
            .is_some_and(|pause| overlaps(start, end, date.and_time(pause.start), date.and_time(pause.end)))
    }

    fn within_hours(&self, date: NaiveDate, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.window
            .is_some_and(|window| end.date() == date && window.covers(start.time(), end.time()))
    }

    fn covers(&self, date: NaiveDate, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.within_hours(date, start, end) && !self.on_break(date, start, end)
    }
}

fn check_buffer(buffer_minutes: u32) -> Result<Duration, AvailabilityError> {
    if !BUFFER_MINUTES.contains(&buffer_minutes) {
        return Err(AvailabilityError::InvalidBuffer(buffer_minutes));
    }
    Ok(Duration::minutes(i64::from(buffer_minutes)))
}

/// Blocking appointments of `provider_id` that overlap `[start, end)` once each
/// booking is extended by `buffer`.
fn busy_with<'a>(
    appointments: &'a [FormattedAppointment],
    provider_id: ProviderId,
    start: NaiveDateTime,
    end: NaiveDateTime,
    buffer: Duration,
    exclude: Option<AppointmentId>,
) -> impl Iterator<Item = &'a FormattedAppointment> {
    appointments.iter().filter(move |apt| {
        let busy_until = apt.end.checked_add_signed(buffer).unwrap_or(NaiveDateTime::MAX);
        apt.provider_id == provider_id
            && Some(apt.id) != exclude
            && apt.status.is_blocking()
            && overlaps(apt.start, busy_until, start, end)
    })
}

/// The one slot-generation algorithm behind every view and endpoint.
#[derive(Debug, Clone, Copy)]
pub struct SlotAvailabilityEngine {
    weekends_closed: bool,
}

impl Default for SlotAvailabilityEngine {
    fn default() -> Self {
        Self { weekends_closed: true }
    }
}

impl SlotAvailabilityEngine {
    pub fn new(weekends_closed: bool) -> Self {
        Self { weekends_closed }
    }

    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::new(config.weekends_closed)
    }

    /// Location hours for a weekday after the weekend policy is applied.
    pub fn location_window(&self, business_hours: &BusinessHours, weekday: u8) -> Option<TimeWindow> {
        if self.weekends_closed && is_weekend(weekday) {
            return None;
        }
        business_hours.for_weekday(weekday).copied()
    }

    fn checked_location_window(
        &self,
        business_hours: &BusinessHours,
        weekday: u8,
    ) -> Result<Option<TimeWindow>, AvailabilityError> {
        match self.location_window(business_hours, weekday) {
            Some(window) if window.start >= window.end => Err(AvailabilityError::InvalidBusinessHours {
                weekday,
                start: window.start.format("%H:%M").to_string(),
                end: window.end.format("%H:%M").to_string(),
            }),
            window => Ok(window),
        }
    }

    fn working_day(&self, location: Option<TimeWindow>, schedule: Option<&ProviderSchedule>, weekday: u8) -> WorkingDay {
        match schedule {
            Some(schedule) => match schedule.day(weekday) {
                Some(day) => WorkingDay {
                    window: day.window(),
                    pause: day.break_window(),
                },
                None => WorkingDay::default(),
            },
            None => WorkingDay {
                window: location,
                pause: None,
            },
        }
    }

    pub fn generate_slots(&self, request: &SlotRequest<'_>) -> Result<Vec<Slot>, AvailabilityError> {
        let duration_minutes = request.slot_duration_minutes;
        if duration_minutes == 0 || duration_minutes > MAX_SLOT_MINUTES {
            return Err(AvailabilityError::InvalidSlotDuration(duration_minutes));
        }
        let buffer = check_buffer(request.buffer_minutes)?;

        let date = request.date;
        debug!(
            "Generating {}-minute slots (+{} buffer) for {} across {} providers",
            duration_minutes,
            request.buffer_minutes,
            date,
            request.providers.len()
        );

        if is_date_blocked(date, request.blocked_periods) {
            debug!("{} falls inside a blocked period", date);
            return Ok(Vec::new());
        }

        let weekday = weekday_index(date);
        let location = self.checked_location_window(request.business_hours, weekday)?;

        let working_days: Vec<(ProviderId, WorkingDay)> = request
            .providers
            .iter()
            .map(|p| (p.id, self.working_day(location, request.provider_schedules.get(&p.id), weekday)))
            .collect();

        // A closed location still runs slots when some provider schedule opens the day.
        let span = match location {
            Some(window) => Some(window),
            None => working_days
                .iter()
                .filter_map(|(_, day)| day.window)
                .reduce(|acc, window| acc.union(&window)),
        };

        let Some(span) = span else {
            debug!("{} is a non-working day", date);
            return Ok(Vec::new());
        };

        if request.providers.is_empty() {
            return Ok(Vec::new());
        }

        let length = Duration::minutes(i64::from(duration_minutes));
        let step = length + buffer;
        let day_end = date.and_time(span.end);
        let mut cursor = date.and_time(span.start);
        let mut slots = Vec::new();

        while cursor < day_end {
            let slot_start = cursor;
            let Some(slot_end) = slot_start.checked_add_signed(length) else {
                break;
            };
            let Some(next) = slot_start.checked_add_signed(step) else {
                break;
            };
            cursor = next;

            if let Some(now) = request.filter_past {
                if now.date() == date && slot_start < now {
                    continue;
                }
            }

            let mut available = Vec::new();
            let mut booked = Vec::new();
            let mut unavailable = Vec::new();

            for (provider_id, working_day) in &working_days {
                if !working_day.covers(date, slot_start, slot_end) {
                    unavailable.push(*provider_id);
                    continue;
                }

                let has_conflict = busy_with(request.appointments, *provider_id, slot_start, slot_end, buffer, None)
                    .next()
                    .is_some();

                if has_conflict {
                    booked.push(*provider_id);
                } else {
                    available.push(*provider_id);
                }
            }

            if available.is_empty() && booked.is_empty() {
                continue;
            }

            let status = if available.is_empty() {
                SlotStatus::FullyBooked
            } else if booked.is_empty() {
                SlotStatus::Open
            } else {
                SlotStatus::Partial
            };

            slots.push(Slot {
                time: slot_start.format("%H:%M").to_string(),
                start: slot_start,
                end: slot_end,
                available_providers: available,
                booked_providers: booked,
                unavailable_providers: unavailable,
                is_blocked: false,
                status,
            });
        }

        Ok(slots)
    }

    /// Lightweight per-day overview. Past slots are kept so a day that is
    /// partly over still reports what it had.
    pub fn compute_day_availability(&self, request: &SlotRequest<'_>) -> Result<DayAvailability, AvailabilityError> {
        let appointment_count = request
            .appointments
            .iter()
            .filter(|apt| apt.date() == request.date)
            .count();

        let slots = self.generate_slots(&SlotRequest {
            filter_past: None,
            ..*request
        })?;

        let has_open_slots = slots.iter().any(|slot| !slot.available_providers.is_empty());
        let is_fully_booked = !slots.is_empty() && slots.iter().all(|slot| slot.available_providers.is_empty());

        Ok(DayAvailability {
            date: request.date,
            has_appointments: appointment_count > 0,
            has_open_slots,
            is_fully_booked,
            appointment_count,
        })
    }

    /// Whether one provider can take `[start, end)`, and the first rule that
    /// says no: blocked date, day off, outside hours, break, then bookings.
    pub fn check_slot(&self, request: &SlotCheckRequest<'_>) -> Result<SlotCheck, AvailabilityError> {
        if request.start >= request.end {
            return Err(AvailabilityError::InvalidInterval {
                start: request.start,
                end: request.end,
            });
        }
        let buffer = check_buffer(request.buffer_minutes)?;

        let date = request.start.date();
        if is_date_blocked(date, request.blocked_periods) {
            return Ok(SlotCheck::unavailable(UnavailableReason::Blocked));
        }

        let weekday = weekday_index(date);
        let location = self.checked_location_window(request.business_hours, weekday)?;
        let working_day = self.working_day(location, request.schedule, weekday);

        if working_day.window.is_none() {
            return Ok(SlotCheck::unavailable(UnavailableReason::NotWorking));
        }
        if !working_day.within_hours(date, request.start, request.end) {
            return Ok(SlotCheck::unavailable(UnavailableReason::OutsideWorkingHours));
        }
        if working_day.on_break(date, request.start, request.end) {
            return Ok(SlotCheck::unavailable(UnavailableReason::OnBreak));
        }

        let conflicts: Vec<AppointmentId> = busy_with(
            request.appointments,
            request.provider_id,
            request.start,
            request.end,
            buffer,
            request.exclude,
        )
        .map(|apt| apt.id)
        .collect();

        if !conflicts.is_empty() {
            return Ok(SlotCheck {
                available: false,
                reason: Some(UnavailableReason::Conflict),
                conflicts,
            });
        }
        Ok(SlotCheck::available())
    }

    /// Whether anyone works on `date`: the provider's enabled schedule day when
    /// a schedule is known, otherwise the location hours for that weekday. A
    /// blocked date never has working hours.
    pub fn has_working_hours(
        &self,
        date: NaiveDate,
        business_hours: &BusinessHours,
        blocked_periods: &[BlockedPeriod],
        schedule: Option<&ProviderSchedule>,
    ) -> bool {
        if is_date_blocked(date, blocked_periods) {
            return false;
        }
        let weekday = weekday_index(date);
        match schedule {
            Some(schedule) => schedule.day(weekday).and_then(|day| day.window()).is_some(),
            None => self.location_window(business_hours, weekday).is_some(),
        }
    }
}
