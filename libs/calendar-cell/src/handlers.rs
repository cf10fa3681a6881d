use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use shared_models::appointment::AppointmentFilters;
use shared_models::calendar::ProviderId;
use shared_models::error::AppError;

use crate::services::CalendarService;

/// Query parameters shared by every calendar view. Filter fields are listed
/// individually so numeric values parse from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub provider_id: Option<ProviderId>,
    pub service_id: Option<i64>,
    pub location_id: Option<i64>,
    pub status: Option<String>,
    pub generation: Option<u64>,
}

impl ViewQuery {
    fn filters(&self) -> AppointmentFilters {
        AppointmentFilters {
            provider_id: self.provider_id,
            service_id: self.service_id,
            location_id: self.location_id,
            status: self.status.clone(),
            ..Default::default()
        }
    }
}

fn envelope(data: Value, query: &ViewQuery, filters: &AppointmentFilters) -> Json<Value> {
    Json(json!({
        "data": data,
        "generation": query.generation,
        "filters": filters
    }))
}

#[axum::debug_handler]
pub async fn get_month_view(
    State(service): State<Arc<CalendarService>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<Value>, AppError> {
    let today = service.today();
    let year = query.year.unwrap_or_else(|| query.date.unwrap_or(today).year());
    let month = query.month.unwrap_or_else(|| query.date.unwrap_or(today).month());
    let filters = query.filters();

    debug!("Month view requested for {}-{:02}", year, month);
    let view = service.month_view(year, month, &filters).await?;

    Ok(envelope(json!(view), &query, &filters))
}

#[axum::debug_handler]
pub async fn get_week_view(
    State(service): State<Arc<CalendarService>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<Value>, AppError> {
    let anchor = query.date.unwrap_or_else(|| service.today());
    let filters = query.filters();

    let view = service.week_view(anchor, &filters).await?;

    Ok(envelope(json!(view), &query, &filters))
}

#[axum::debug_handler]
pub async fn get_day_view(
    State(service): State<Arc<CalendarService>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<Value>, AppError> {
    let date = query.date.unwrap_or_else(|| service.today());
    let filters = query.filters();

    let view = service.day_view(date, &filters).await?;

    Ok(envelope(json!(view), &query, &filters))
}

#[axum::debug_handler]
pub async fn get_day_grid(
    State(service): State<Arc<CalendarService>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<Value>, AppError> {
    let date = query.date.unwrap_or_else(|| service.today());
    let grid = service.day_grid(date)?;

    Ok(Json(json!(grid)))
}
