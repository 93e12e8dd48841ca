use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::health::HealthResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health and time of the latest evaluation", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let last_evaluated_ms = state
        .alarm_state
        .report
        .read()
        .await
        .as_ref()
        .map(|report| report.as_of_ms);

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        last_evaluated_ms,
    }))
}
