use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use shared_config::CalendarConfig;
use shared_database::{AppointmentFormatter, AppointmentQuery};
use shared_models::appointment::{AppointmentFilters, AppointmentId, FormattedAppointment};
use shared_models::calendar::{Provider, ProviderId, ProviderSchedule};

use crate::models::{AvailabilityCalendar, AvailabilityError, DayAvailability, Slot, SlotCheck};
use crate::services::engine::{SlotAvailabilityEngine, SlotCheckRequest, SlotRequest};
use crate::services::schedule_cache::{ProviderScheduleCache, ScheduleLookup};

pub const MAX_CALENDAR_DAYS: i64 = 120;

/// Slots for one date together with the providers whose schedules failed to load.
#[derive(Debug, Clone)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
    pub schedule_errors: Vec<ProviderId>,
}

/// `start` (never before `today`) through `start + days - 1`, with `days`
/// clamped to 1..=120.
pub(crate) fn calendar_window(
    start: Option<NaiveDate>,
    today: NaiveDate,
    days: Option<i64>,
) -> Result<(NaiveDate, NaiveDate, i64), AvailabilityError> {
    let start_date = start.unwrap_or(today).max(today);
    let days = days.unwrap_or(60).clamp(1, MAX_CALENDAR_DAYS);
    let end_date = start_date
        .checked_add_signed(Duration::days(days - 1))
        .ok_or(AvailabilityError::DateOutOfRange(start_date))?;
    Ok((start_date, end_date, days))
}

/// Per-request overrides of the configured slot length and buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotLengths {
    pub duration: Option<u32>,
    pub buffer: Option<u32>,
}

/// Feeds the slot engine from the appointment source and the schedule cache.
pub struct AvailabilityService {
    config: CalendarConfig,
    engine: SlotAvailabilityEngine,
    appointments: Arc<dyn AppointmentQuery>,
    formatter: Arc<dyn AppointmentFormatter>,
    schedules: Arc<ProviderScheduleCache>,
}

impl AvailabilityService {
    pub fn new(
        config: CalendarConfig,
        appointments: Arc<dyn AppointmentQuery>,
        formatter: Arc<dyn AppointmentFormatter>,
        schedules: Arc<ProviderScheduleCache>,
    ) -> Self {
        Self {
            engine: SlotAvailabilityEngine::from_config(&config),
            config,
            appointments,
            formatter,
            schedules,
        }
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    pub fn engine(&self) -> &SlotAvailabilityEngine {
        &self.engine
    }

    pub fn schedules(&self) -> &ProviderScheduleCache {
        &self.schedules
    }

    async fn fetch_appointments(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filters: &AppointmentFilters,
        providers: &[Provider],
    ) -> Result<Vec<FormattedAppointment>, AvailabilityError> {
        let rows = self
            .appointments
            .get_for_range(start, end, filters)
            .await
            .map_err(|e| AvailabilityError::Upstream(e.to_string()))?;

        let wanted: Vec<ProviderId> = providers.iter().map(|p| p.id).collect();
        Ok(self
            .formatter
            .format_many_for_calendar(&rows)
            .into_iter()
            .filter(|apt| wanted.contains(&apt.provider_id))
            .collect())
    }

    async fn lookup_schedules(&self, providers: &[Provider]) -> ScheduleLookup {
        let ids: Vec<ProviderId> = providers.iter().map(|p| p.id).collect();
        self.schedules.get_many(&ids).await
    }

    fn slot_request<'a>(
        &'a self,
        date: NaiveDate,
        lengths: SlotLengths,
        appointments: &'a [FormattedAppointment],
        providers: &'a [Provider],
        schedules: &'a HashMap<ProviderId, ProviderSchedule>,
    ) -> SlotRequest<'a> {
        SlotRequest {
            date,
            business_hours: &self.config.business_hours,
            slot_duration_minutes: lengths.duration.unwrap_or(self.config.slot_duration_minutes),
            buffer_minutes: lengths.buffer.unwrap_or(self.config.buffer_minutes),
            appointments,
            providers,
            blocked_periods: &self.config.blocked_periods,
            provider_schedules: schedules,
            filter_past: None,
        }
    }

    pub async fn available_slots(
        &self,
        date: NaiveDate,
        providers: &[Provider],
        lengths: SlotLengths,
        filter_past: bool,
        filters: &AppointmentFilters,
    ) -> Result<DaySlots, AvailabilityError> {
        debug!("Computing slots for {} ({} providers)", date, providers.len());

        let appointments = self.fetch_appointments(date, date, filters, providers).await?;
        let lookup = self.lookup_schedules(providers).await;

        let mut request = self.slot_request(date, lengths, &appointments, providers, &lookup.schedules);
        if filter_past {
            request.filter_past = Some(self.config.now());
        }

        Ok(DaySlots {
            date,
            slots: self.engine.generate_slots(&request)?,
            schedule_errors: lookup.failed,
        })
    }

    /// Per-day summaries over an arbitrary set of dates, fetched with one range query.
    pub async fn day_summaries(
        &self,
        dates: &[NaiveDate],
        providers: &[Provider],
        lengths: SlotLengths,
        filters: &AppointmentFilters,
    ) -> Result<Vec<DayAvailability>, AvailabilityError> {
        let (Some(first), Some(last)) = (dates.iter().min(), dates.iter().max()) else {
            return Ok(Vec::new());
        };

        let appointments = self.fetch_appointments(*first, *last, filters, providers).await?;
        let lookup = self.lookup_schedules(providers).await;

        dates
            .iter()
            .map(|date| {
                let request = self.slot_request(*date, lengths, &appointments, providers, &lookup.schedules);
                self.engine.compute_day_availability(&request)
            })
            .collect()
    }

    /// Upcoming bookable dates for one provider, starting at `start` (or today)
    /// and spanning `days` (clamped to 1..=120). Past dates and past slots are skipped.
    pub async fn availability_calendar(
        &self,
        provider_id: ProviderId,
        start: Option<NaiveDate>,
        days: Option<i64>,
        lengths: SlotLengths,
    ) -> Result<AvailabilityCalendar, AvailabilityError> {
        let now = self.config.now();
        let today = now.date();
        let (start_date, end_date, days) = calendar_window(start, today, days)?;

        info!(
            "Building availability calendar for provider {} from {} to {}",
            provider_id, start_date, end_date
        );

        let providers = vec![Provider::new(provider_id, "")];
        let appointments = self
            .fetch_appointments(start_date, end_date, &AppointmentFilters::for_provider(provider_id), &providers)
            .await?;
        let schedules = match self.schedules.get(provider_id).await? {
            Some(schedule) => HashMap::from([(provider_id, schedule)]),
            None => HashMap::new(),
        };

        let mut available_dates = Vec::new();
        let mut slots_by_date = BTreeMap::new();

        for date in start_date.iter_days().take(days as usize) {
            let mut request = self.slot_request(date, lengths, &appointments, &providers, &schedules);
            request.filter_past = Some(now);

            let times: Vec<String> = self
                .engine
                .generate_slots(&request)?
                .into_iter()
                .filter(|slot| slot.is_available_for(provider_id))
                .map(|slot| slot.time)
                .collect();

            if !times.is_empty() {
                available_dates.push(date);
                slots_by_date.insert(date, times);
            }
        }

        Ok(AvailabilityCalendar {
            provider_id,
            start_date,
            end_date,
            available_dates,
            slots_by_date,
        })
    }

    /// Whether the provider (or, without one, the location) works on `date`.
    pub async fn has_working_hours(
        &self,
        date: NaiveDate,
        provider_id: Option<ProviderId>,
    ) -> Result<bool, AvailabilityError> {
        let schedule = match provider_id {
            Some(id) => self.schedules.get(id).await?,
            None => None,
        };
        Ok(self.engine.has_working_hours(
            date,
            &self.config.business_hours,
            &self.config.blocked_periods,
            schedule.as_ref(),
        ))
    }

    /// Whether `provider_id` can take `[start, end)`, with the reason when not.
    /// The fetch starts a day early so bookings running past midnight still count.
    pub async fn check_slot(
        &self,
        provider_id: ProviderId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude: Option<AppointmentId>,
        buffer_minutes: Option<u32>,
    ) -> Result<SlotCheck, AvailabilityError> {
        debug!("Checking provider {} for {} - {}", provider_id, start, end);

        let providers = vec![Provider::new(provider_id, "")];
        let first = start.date().pred_opt().unwrap_or(start.date());
        let appointments = self
            .fetch_appointments(first, end.date(), &AppointmentFilters::for_provider(provider_id), &providers)
            .await?;
        let schedule = self.schedules.get(provider_id).await?;

        self.engine.check_slot(&SlotCheckRequest {
            provider_id,
            start,
            end,
            business_hours: &self.config.business_hours,
            schedule: schedule.as_ref(),
            blocked_periods: &self.config.blocked_periods,
            appointments: &appointments,
            buffer_minutes: buffer_minutes.unwrap_or(self.config.buffer_minutes),
            exclude,
        })
    }

    pub async fn invalidate_schedules(&self, provider_ids: &[ProviderId]) {
        if provider_ids.is_empty() {
            self.schedules.invalidate_all().await;
            return;
        }
        for id in provider_ids {
            self.schedules.invalidate(*id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::test_utils::date;

    #[test]
    fn calendar_window_clamps_and_never_starts_in_the_past() {
        let today = date("2026-02-26");
        assert_eq!(
            calendar_window(Some(date("2026-01-01")), today, Some(7)).unwrap(),
            (today, date("2026-03-04"), 7)
        );
        assert_eq!(calendar_window(None, today, Some(500)).unwrap().2, MAX_CALENDAR_DAYS);
        assert_eq!(calendar_window(None, today, Some(0)).unwrap().1, today);
    }

    #[test]
    fn calendar_window_past_the_last_date_is_an_error() {
        let near_end = NaiveDate::MAX.pred_opt().unwrap();
        assert_eq!(
            calendar_window(Some(near_end), date("2026-02-26"), Some(7)),
            Err(AvailabilityError::DateOutOfRange(near_end))
        );
        assert!(calendar_window(Some(near_end), date("2026-02-26"), Some(2)).is_ok());
    }
}
