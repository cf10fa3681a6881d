use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use shared_models::appointment::AppointmentId;
use shared_models::error::AppError;

use crate::models::{RescheduleError, RescheduleRequest, StatusChangeRequest};
use crate::services::AppointmentService;

/// A rejected commit still carries the reloaded appointment so the caller can
/// re-render from it.
fn commit_failed(err: RescheduleError) -> Result<Response, AppError> {
    match err {
        RescheduleError::CommitFailed { ref current, .. } => {
            tracing::error!("Error: {}: {}", StatusCode::BAD_GATEWAY, err);
            let body = json!({
                "error": err.to_string(),
                "kind": err.reason(),
                "appointment": current
            });
            Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response())
        }
        other => Err(other.into()),
    }
}

#[axum::debug_handler]
pub async fn validate_reschedule(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<AppointmentId>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let proposal = service.validate_reschedule(appointment_id, &request.target).await?;

    Ok(Json(json!({
        "appointmentId": appointment_id,
        "generation": request.generation,
        "valid": true,
        "proposal": proposal
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<AppointmentId>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Response, AppError> {
    match service.reschedule(appointment_id, &request.target).await {
        Ok(outcome) => Ok(Json(json!({
            "appointmentId": appointment_id,
            "generation": request.generation,
            "proposal": outcome.proposal,
            "appointment": outcome.appointment
        }))
        .into_response()),
        Err(e) => commit_failed(e),
    }
}

#[axum::debug_handler]
pub async fn change_status(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<AppointmentId>,
    Json(request): Json<StatusChangeRequest>,
) -> Result<Response, AppError> {
    match service.change_status(appointment_id, request.status).await {
        Ok(appointment) => Ok(Json(json!({
            "appointmentId": appointment_id,
            "status": request.status,
            "appointment": appointment
        }))
        .into_response()),
        Err(e) => commit_failed(e),
    }
}
