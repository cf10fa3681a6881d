use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers;
use crate::services::AppointmentService;

pub fn appointment_routes(service: Arc<AppointmentService>) -> Router {
    Router::new()
        .route("/{id}/reschedule/validate", post(handlers::validate_reschedule))
        .route("/{id}/reschedule", post(handlers::reschedule_appointment))
        .route("/{id}/status", post(handlers::change_status))
        .with_state(service)
}
