use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Epoch ms of the latest finished evaluation
    pub last_evaluated_ms: Option<u64>,
}
