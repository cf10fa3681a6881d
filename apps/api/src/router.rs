use std::sync::Arc;

use axum::{routing::get, Router};
use serde_json::json;

use appointment_cell::router::appointment_routes;
use appointment_cell::services::AppointmentService;
use availability_cell::router::availability_routes;
use availability_cell::services::{AvailabilityService, ProviderScheduleCache};
use calendar_cell::router::calendar_routes;
use calendar_cell::services::CalendarService;
use calendar_cell::CalendarError;
use shared_config::AppConfig;
use shared_database::{DefaultAppointmentFormatter, RestClient};

/// Wire every cell to one upstream client and one schedule cache.
pub fn create_router(config: &AppConfig) -> Result<Router, CalendarError> {
    let client = Arc::new(RestClient::new(config));
    let formatter = Arc::new(DefaultAppointmentFormatter);
    let schedules = Arc::new(ProviderScheduleCache::new(client.clone()));

    let availability = Arc::new(AvailabilityService::new(
        config.calendar.clone(),
        client.clone(),
        formatter.clone(),
        schedules,
    ));
    let calendar = Arc::new(CalendarService::new(
        config.calendar.clone(),
        client.clone(),
        formatter.clone(),
        availability.clone(),
    )?);
    let appointments = Arc::new(AppointmentService::new(
        config.calendar.clone(),
        client.clone(),
        formatter,
        client,
    ));

    Ok(Router::new()
        .route("/", get(|| async { "Calendar API is running!" }))
        .route("/health", get(|| async { axum::Json(json!({ "status": "ok" })) }))
        .nest("/calendar", calendar_routes(calendar))
        .nest("/availability", availability_routes(availability))
        .nest("/appointments", appointment_routes(appointments)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use shared_utils::test_utils::TestConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn cells_are_mounted_under_their_prefixes() {
        let mock_server = wiremock::MockServer::start().await;
        let config = TestConfig::with_upstream(&mock_server.uri()).to_app_config();
        let app = create_router(&config).unwrap();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/calendar/grid/day?date=2026-02-26")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
