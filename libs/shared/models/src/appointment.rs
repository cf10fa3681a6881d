use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::calendar::ProviderId;
use crate::time::local_datetime;

pub type AppointmentId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
    #[serde(other)]
    Unknown,
}

impl AppointmentStatus {
    /// Cancelled bookings free their time; every other status holds it.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

/// Raw appointment as returned by the upstream query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRow {
    pub id: AppointmentId,
    pub provider_id: ProviderId,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    pub status: AppointmentStatus,
    #[serde(with = "local_datetime", alias = "start_at", alias = "start")]
    pub start_time: NaiveDateTime,
    #[serde(with = "local_datetime", alias = "end_at", alias = "end")]
    pub end_time: NaiveDateTime,
}

/// The calendar-facing appointment shape. Optional fields stay optional;
/// nothing beyond these fields is assumed by layout or availability code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedAppointment {
    pub id: AppointmentId,
    pub provider_id: ProviderId,
    #[serde(default)]
    pub provider_name: Option<String>,
    pub status: AppointmentStatus,
    #[serde(with = "local_datetime")]
    pub start: NaiveDateTime,
    #[serde(with = "local_datetime")]
    pub end: NaiveDateTime,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
}

impl FormattedAppointment {
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Minutes after midnight of the start wall-clock time.
    pub fn start_minute_of_day(&self) -> u32 {
        self.start.hour() * 60 + self.start.minute()
    }

    pub fn end_minute_of_day(&self) -> u32 {
        self.end.hour() * 60 + self.end.minute()
    }
}

impl From<&AppointmentRow> for FormattedAppointment {
    fn from(row: &AppointmentRow) -> Self {
        Self {
            id: row.id,
            provider_id: row.provider_id,
            provider_name: row.provider_name.clone(),
            status: row.status,
            start: row.start_time,
            end: row.end_time,
            customer_name: row.customer_name.clone(),
            service_name: row.service_name.clone(),
        }
    }
}

/// Query filters forwarded untouched to the appointment source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<ProviderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_to_user_id: Option<i64>,
}

impl AppointmentFilters {
    pub fn for_provider(provider_id: ProviderId) -> Self {
        Self {
            provider_id: Some(provider_id),
            ..Default::default()
        }
    }

    /// Query-string pairs in the upstream API's parameter names.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(id) = self.provider_id {
            pairs.push(("provider_id", id.to_string()));
        }
        if let Some(id) = self.service_id {
            pairs.push(("service_id", id.to_string()));
        }
        if let Some(id) = self.location_id {
            pairs.push(("location_id", id.to_string()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        if let Some(role) = &self.user_role {
            pairs.push(("user_role", role.clone()));
        }
        if let Some(id) = self.scope_to_user_id {
            pairs.push(("scope_to_user_id", id.to_string()));
        }
        pairs
    }
}

/// Body of the upstream `PATCH /api/appointments/{id}` reschedule call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReschedulePayload {
    #[serde(with = "local_datetime")]
    pub start: NaiveDateTime,
    #[serde(with = "local_datetime")]
    pub end: NaiveDateTime,
    pub date: NaiveDate,
    pub time: String,
}

impl ReschedulePayload {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            date: start.date(),
            time: start.format("%H:%M").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_accept_upstream_aliases_and_unknown_statuses() {
        let row: AppointmentRow = serde_json::from_value(json!({
            "id": 7,
            "provider_id": 2,
            "status": "rescheduled",
            "start_at": "2026-02-26 10:00:00",
            "end_at": "2026-02-26 10:30:00"
        }))
        .unwrap();

        assert_eq!(row.status, AppointmentStatus::Unknown);
        let formatted = FormattedAppointment::from(&row);
        assert_eq!(formatted.duration_minutes(), 30);
        assert_eq!(formatted.start_minute_of_day(), 600);
        assert!(formatted.status.is_blocking());
    }

    #[test]
    fn formatted_appointments_serialize_camel_case_iso() {
        let formatted: FormattedAppointment = serde_json::from_value(json!({
            "id": 1,
            "providerId": 3,
            "status": "cancelled",
            "start": "2026-02-26T09:00:00",
            "end": "2026-02-26T09:45:00"
        }))
        .unwrap();

        assert!(!formatted.status.is_blocking());
        let value = serde_json::to_value(&formatted).unwrap();
        assert_eq!(value["providerId"], 3);
        assert_eq!(value["start"], "2026-02-26T09:00:00");
    }

    #[test]
    fn reschedule_payload_derives_date_and_time() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(14, 15, 0).unwrap();
        let payload = ReschedulePayload::new(start, start + chrono::Duration::minutes(30));
        assert_eq!(payload.time, "14:15");
        assert_eq!(payload.date, start.date());
    }
}
