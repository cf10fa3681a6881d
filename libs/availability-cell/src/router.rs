use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::AvailabilityService;

pub fn availability_routes(service: Arc<AvailabilityService>) -> Router {
    Router::new()
        .route("/slots", post(handlers::get_available_slots))
        .route("/summary", post(handlers::get_day_summaries))
        .route("/calendar", get(handlers::get_availability_calendar))
        .route("/working-hours", get(handlers::get_working_hours))
        .route("/check", get(handlers::check_slot))
        .route("/schedules/invalidate", post(handlers::invalidate_schedules))
        .with_state(service)
}
