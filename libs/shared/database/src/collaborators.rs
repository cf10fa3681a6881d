//! Boundary traits for everything the calendar engine reads from or writes to
//! the outside world, plus their REST implementation.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::json;
use tracing::debug;

use shared_models::appointment::{
    AppointmentFilters, AppointmentId, AppointmentRow, AppointmentStatus, FormattedAppointment,
    ReschedulePayload,
};
use shared_models::calendar::{ProviderId, ProviderSchedule};

use crate::rest::RestClient;

#[async_trait]
pub trait AppointmentQuery: Send + Sync {
    /// Appointments starting on any date in `start..=end`.
    async fn get_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filters: &AppointmentFilters,
    ) -> Result<Vec<AppointmentRow>>;

    async fn get_by_id(&self, id: AppointmentId) -> Result<Option<AppointmentRow>>;

    async fn get_grouped_by_date(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filters: &AppointmentFilters,
    ) -> Result<BTreeMap<NaiveDate, Vec<AppointmentRow>>> {
        let rows = self.get_for_range(start, end, filters).await?;
        let mut grouped: BTreeMap<NaiveDate, Vec<AppointmentRow>> = BTreeMap::new();
        for row in rows {
            grouped.entry(row.start_time.date()).or_default().push(row);
        }
        Ok(grouped)
    }
}

pub trait AppointmentFormatter: Send + Sync {
    fn format_many_for_calendar(&self, rows: &[AppointmentRow]) -> Vec<FormattedAppointment>;
}

#[async_trait]
pub trait ProviderScheduleSource: Send + Sync {
    /// `Ok(None)` when the provider has no explicit schedule.
    async fn load_provider_schedule(&self, provider_id: ProviderId) -> Result<Option<ProviderSchedule>>;
}

#[async_trait]
pub trait AppointmentCommands: Send + Sync {
    async fn commit_reschedule(&self, id: AppointmentId, payload: &ReschedulePayload) -> Result<()>;

    async fn commit_status(&self, id: AppointmentId, status: AppointmentStatus) -> Result<()>;
}

/// Maps rows one-to-one, sorted by start so downstream layout sees a stable order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAppointmentFormatter;

impl AppointmentFormatter for DefaultAppointmentFormatter {
    fn format_many_for_calendar(&self, rows: &[AppointmentRow]) -> Vec<FormattedAppointment> {
        let mut formatted: Vec<FormattedAppointment> = rows.iter().map(FormattedAppointment::from).collect();
        formatted.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));
        formatted
    }
}

#[async_trait]
impl AppointmentQuery for RestClient {
    async fn get_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filters: &AppointmentFilters,
    ) -> Result<Vec<AppointmentRow>> {
        debug!("Fetching appointments {}..={} with {:?}", start, end, filters);

        let mut query = vec![("start", start.to_string()), ("end", end.to_string())];
        query.extend(filters.to_query_pairs());

        self.request(Method::GET, "/api/appointments", &query, None).await
    }

    async fn get_by_id(&self, id: AppointmentId) -> Result<Option<AppointmentRow>> {
        let path = format!("/api/appointments/{}", id);
        self.request_optional(Method::GET, &path, &[]).await
    }
}

#[async_trait]
impl ProviderScheduleSource for RestClient {
    async fn load_provider_schedule(&self, provider_id: ProviderId) -> Result<Option<ProviderSchedule>> {
        debug!("Loading schedule for provider {}", provider_id);

        let path = format!("/api/providers/{}/schedule", provider_id);
        let schedule: Option<Option<ProviderSchedule>> = self.request_optional(Method::GET, &path, &[]).await?;
        Ok(schedule.flatten())
    }
}

#[async_trait]
impl AppointmentCommands for RestClient {
    async fn commit_reschedule(&self, id: AppointmentId, payload: &ReschedulePayload) -> Result<()> {
        debug!("Committing reschedule of appointment {} to {}", id, payload.start);

        let path = format!("/api/appointments/{}", id);
        self.execute(Method::PATCH, &path, serde_json::to_value(payload)?).await
    }

    async fn commit_status(&self, id: AppointmentId, status: AppointmentStatus) -> Result<()> {
        debug!("Committing status {:?} for appointment {}", status, id);

        let path = format!("/api/appointments/{}/status", id);
        self.execute(Method::PATCH, &path, json!({ "status": status })).await
    }
}
