use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

use shared_config::{AppConfig, CalendarConfig};
use shared_models::appointment::{AppointmentStatus, FormattedAppointment};
use shared_models::calendar::{Provider, ProviderSchedule, ProviderScheduleDay};
use shared_models::time::{parse_date, parse_hhmm, parse_local_datetime};

pub struct TestConfig {
    pub upstream_url: String,
    pub upstream_api_key: String,
    pub calendar: CalendarConfig,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            upstream_url: "http://localhost:8080".to_string(),
            upstream_api_key: "test-api-key".to_string(),
            calendar: CalendarConfig::default(),
        }
    }
}

impl TestConfig {
    pub fn with_upstream(uri: &str) -> Self {
        Self {
            upstream_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            upstream_url: self.upstream_url.clone(),
            upstream_api_key: self.upstream_api_key.clone(),
            port: 0,
            calendar: self.calendar.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// `"2026-02-26"` -> date. Panics on malformed fixtures.
pub fn date(value: &str) -> NaiveDate {
    parse_date(value).expect("fixture date")
}

/// `"2026-02-26 10:00"` -> local datetime. Panics on malformed fixtures.
pub fn at(value: &str) -> NaiveDateTime {
    parse_local_datetime(value).expect("fixture datetime")
}

pub fn provider(id: i64, name: &str) -> Provider {
    Provider::new(id, name)
}

pub fn appointment(id: i64, provider_id: i64, start: &str, end: &str) -> FormattedAppointment {
    FormattedAppointment {
        id,
        provider_id,
        provider_name: Some(format!("Provider {}", provider_id)),
        status: AppointmentStatus::Confirmed,
        start: at(start),
        end: at(end),
        customer_name: Some(format!("Customer {}", id)),
        service_name: Some("Consultation".to_string()),
    }
}

/// Same hours every enabled weekday; disabled days stay `None`.
pub fn weekly_schedule(enabled_days: &[u8], start: &str, end: &str) -> ProviderSchedule {
    let mut schedule = ProviderSchedule::default();
    for day in enabled_days {
        if let Some(slot) = schedule.day_mut(*day) {
            *slot = Some(ProviderScheduleDay {
                enabled: true,
                start: parse_hhmm(start).expect("fixture time"),
                end: parse_hhmm(end).expect("fixture time"),
                break_start: None,
                break_end: None,
            });
        }
    }
    schedule
}

pub struct MockUpstreamResponses;

impl MockUpstreamResponses {
    pub fn appointment_row(id: i64, provider_id: i64, start: &str, end: &str) -> serde_json::Value {
        json!({
            "id": id,
            "provider_id": provider_id,
            "provider_name": format!("Provider {}", provider_id),
            "customer_name": format!("Customer {}", id),
            "service_name": "Consultation",
            "status": "confirmed",
            "start_time": start,
            "end_time": end
        })
    }

    pub fn appointments_envelope(rows: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "data": rows })
    }

    pub fn schedule_response(start: &str, end: &str) -> serde_json::Value {
        let day = json!({ "enabled": true, "start": start, "end": end });
        let off = json!({ "enabled": false, "start": start, "end": end });
        json!({
            "data": {
                "sunday": off,
                "monday": day,
                "tuesday": day,
                "wednesday": day,
                "thursday": day,
                "friday": day,
                "saturday": off
            }
        })
    }

    pub fn error_response(message: &str) -> serde_json::Value {
        json!({ "error": { "message": message } })
    }
}
