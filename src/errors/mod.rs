use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message.clone()),
            AppError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        };

        let body = Json(ErrorResponse { message });
        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(error.to_string())
    }
}

/// Reasons a single symbol cannot be evaluated.
///
/// None of these escape a batch run; the monitor turns every one of them
/// into a degraded record for the symbol.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlarmError {
    #[error("no historical data available")]
    NoHistoricalData,
    #[error("no data available at {0}")]
    NoDataAtWindow(DateTime<FixedOffset>),
    #[error("observation window is empty")]
    EmptyWindow,
    #[error("invalid opening price {0}")]
    InvalidOpeningPrice(f64),
    #[error("latest quote unavailable for {0}")]
    QuoteUnavailable(String),
    #[error("unknown symbol {0}")]
    UnknownSymbol(String),
    #[error("market data error: {0}")]
    Upstream(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
