use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::services::CalendarService;

pub fn calendar_routes(service: Arc<CalendarService>) -> Router {
    Router::new()
        .route("/month", get(handlers::get_month_view))
        .route("/week", get(handlers::get_week_view))
        .route("/day", get(handlers::get_day_view))
        .route("/grid/day", get(handlers::get_day_grid))
        .with_state(service)
}
