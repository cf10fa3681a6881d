use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::calendar::{Provider, ProviderId};
use shared_models::error::AppError;

use crate::models::{CalendarQuery, InvalidateRequest, SlotCheckQuery, SlotsRequest, SummaryRequest};
use crate::services::{AvailabilityService, SlotLengths};

#[derive(Debug, Deserialize)]
pub struct WorkingHoursQuery {
    pub date: NaiveDate,
    pub provider_id: Option<ProviderId>,
}

fn provider_ids(providers: &[Provider]) -> Vec<ProviderId> {
    providers.iter().map(|p| p.id).collect()
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(service): State<Arc<AvailabilityService>>,
    Json(request): Json<SlotsRequest>,
) -> Result<Json<Value>, AppError> {
    let day = service
        .available_slots(
            request.date,
            &request.providers,
            SlotLengths {
                duration: request.slot_duration,
                buffer: request.buffer_minutes,
            },
            request.filter_past,
            &request.filters,
        )
        .await?;

    Ok(Json(json!({
        "date": day.date,
        "providerIds": provider_ids(&request.providers),
        "generation": request.generation,
        "slots": day.slots,
        "total": day.slots.len(),
        "scheduleErrors": day.schedule_errors
    })))
}

#[axum::debug_handler]
pub async fn get_day_summaries(
    State(service): State<Arc<AvailabilityService>>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<Value>, AppError> {
    let days = service
        .day_summaries(
            &request.dates,
            &request.providers,
            SlotLengths {
                duration: request.slot_duration,
                buffer: request.buffer_minutes,
            },
            &request.filters,
        )
        .await?;

    Ok(Json(json!({
        "providerIds": provider_ids(&request.providers),
        "generation": request.generation,
        "days": days
    })))
}

#[axum::debug_handler]
pub async fn get_availability_calendar(
    State(service): State<Arc<AvailabilityService>>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Value>, AppError> {
    let calendar = service
        .availability_calendar(
            query.provider_id,
            query.start,
            query.days,
            SlotLengths {
                duration: query.slot_duration,
                buffer: query.buffer_minutes,
            },
        )
        .await?;

    Ok(Json(json!(calendar)))
}

#[axum::debug_handler]
pub async fn get_working_hours(
    State(service): State<Arc<AvailabilityService>>,
    Query(query): Query<WorkingHoursQuery>,
) -> Result<Json<Value>, AppError> {
    let has_working_hours = service.has_working_hours(query.date, query.provider_id).await?;

    Ok(Json(json!({
        "date": query.date,
        "providerId": query.provider_id,
        "hasWorkingHours": has_working_hours
    })))
}

#[axum::debug_handler]
pub async fn check_slot(
    State(service): State<Arc<AvailabilityService>>,
    Query(query): Query<SlotCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let check = service
        .check_slot(query.provider_id, query.start, query.end, query.exclude_id, query.buffer_minutes)
        .await?;

    Ok(Json(json!({
        "providerId": query.provider_id,
        "available": check.available,
        "reason": check.reason,
        "message": check.reason.map(|reason| reason.message()).unwrap_or_default(),
        "conflicts": check.conflicts
    })))
}

#[axum::debug_handler]
pub async fn invalidate_schedules(
    State(service): State<Arc<AvailabilityService>>,
    Json(request): Json<InvalidateRequest>,
) -> Result<Json<Value>, AppError> {
    service.invalidate_schedules(&request.provider_ids).await;

    Ok(Json(json!({
        "invalidated": if request.provider_ids.is_empty() { json!("all") } else { json!(request.provider_ids) }
    })))
}
