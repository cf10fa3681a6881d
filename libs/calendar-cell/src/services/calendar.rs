use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use availability_cell::AvailabilityService;
use shared_config::CalendarConfig;
use shared_database::{AppointmentFormatter, AppointmentQuery};
use shared_models::appointment::{AppointmentFilters, FormattedAppointment};
use shared_models::calendar::ProviderSchedule;

use crate::models::{CalendarError, DaySlotModel, DayViewModel, MonthViewModel, WeekViewModel};
use crate::services::day_view::assemble_day_view;
use crate::services::month_view::assemble_month_view;
use crate::services::range::{generate_month_grid, generate_week_range};
use crate::services::time_grid::TimeGrid;
use crate::services::week_view::assemble_week_view;

/// Fetches appointments for a view's date range and hands them to the pure assemblers.
pub struct CalendarService {
    config: CalendarConfig,
    time_grid: TimeGrid,
    appointments: Arc<dyn AppointmentQuery>,
    formatter: Arc<dyn AppointmentFormatter>,
    availability: Arc<AvailabilityService>,
}

impl CalendarService {
    pub fn new(
        config: CalendarConfig,
        appointments: Arc<dyn AppointmentQuery>,
        formatter: Arc<dyn AppointmentFormatter>,
        availability: Arc<AvailabilityService>,
    ) -> Result<Self, CalendarError> {
        Ok(Self {
            time_grid: TimeGrid::from_config(&config)?,
            config,
            appointments,
            formatter,
            availability,
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.config.today()
    }

    async fn fetch(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filters: &AppointmentFilters,
    ) -> Result<Vec<FormattedAppointment>, CalendarError> {
        let grouped = self
            .appointments
            .get_grouped_by_date(start, end, filters)
            .await
            .map_err(|e| CalendarError::Upstream(e.to_string()))?;

        let rows: Vec<_> = grouped.into_values().flatten().collect();
        debug!("Fetched {} appointments for {}..={}", rows.len(), start, end);
        Ok(self.formatter.format_many_for_calendar(&rows))
    }

    pub fn day_grid(&self, date: NaiveDate) -> Result<DaySlotModel, CalendarError> {
        self.time_grid.day_grid(date)
    }

    pub async fn day_view(&self, date: NaiveDate, filters: &AppointmentFilters) -> Result<DayViewModel, CalendarError> {
        debug!("Building day view for {}", date);
        let appointments = self.fetch(date, date, filters).await?;
        assemble_day_view(
            date,
            self.today(),
            &self.time_grid,
            appointments,
            self.config.min_display_minutes,
        )
    }

    pub async fn week_view(&self, anchor: NaiveDate, filters: &AppointmentFilters) -> Result<WeekViewModel, CalendarError> {
        debug!("Building week view around {}", anchor);
        let today = self.today();
        let range = generate_week_range(anchor, self.config.first_day_of_week, today)?;
        let appointments = self.fetch(range.start_date, range.end_date, filters).await?;
        assemble_week_view(
            anchor,
            self.config.first_day_of_week,
            today,
            &self.time_grid,
            appointments,
            self.config.min_display_minutes,
        )
    }

    pub async fn month_view(
        &self,
        year: i32,
        month: u32,
        filters: &AppointmentFilters,
    ) -> Result<MonthViewModel, CalendarError> {
        debug!("Building month view for {}-{:02}", year, month);
        let today = self.today();
        let first_day = self.config.first_day_of_week;

        // Grid bounds first so the fetch covers the leading and trailing weeks.
        let grid = generate_month_grid(year, month, first_day, today)?;
        let appointments = self.fetch(grid.start_date, grid.end_date, filters).await?;

        let schedule = match filters.provider_id {
            Some(provider_id) => match self.availability.schedules().get(provider_id).await {
                Ok(schedule) => schedule,
                Err(e) => {
                    warn!("{}; treating provider {} as unavailable", e, provider_id);
                    Some(ProviderSchedule::default())
                }
            },
            None => None,
        };

        let engine = self.availability.engine();
        let business_hours = &self.config.business_hours;
        let blocked_periods = &self.config.blocked_periods;

        assemble_month_view(
            year,
            month,
            first_day,
            today,
            self.config.max_per_cell,
            appointments,
            |date| engine.has_working_hours(date, business_hours, blocked_periods, schedule.as_ref()),
        )
    }
}
