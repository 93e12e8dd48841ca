mod business_logic;
mod config;
mod errors;
mod handlers;
mod models;
mod services;
mod state;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers::alarms::{get_alarm_stream, get_alarms, refresh_alarms};
use crate::services::alarm_state::AlarmStateInner;
use crate::services::monitor::MonitorService;
use crate::services::yahoo::YahooClient;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::alarms::get_alarms,
        handlers::alarms::refresh_alarms,
        handlers::alarms::get_alarm_stream
    ),
    components(schemas(
        models::health::HealthResponse,
        models::alarm::AlarmReport,
        models::alarm::AlarmRow,
        errors::ErrorResponse
    ))
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Console plus a daily rotating file under logs/
    let file_appender = tracing_appender::rolling::daily("logs", "stalarm.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stalarm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::info!(
        "Monitoring {} symbols from {} (decrease limit {}, increase limit {})",
        config.monitoring.symbols.len(),
        config.monitoring.requested_start,
        config.monitoring.decrease_limit_label(),
        config.monitoring.increase_limit_label()
    );

    let client = YahooClient::new().context("failed to build market data client")?;
    let alarm_state = Arc::new(AlarmStateInner::default());
    let monitor = Arc::new(MonitorService::new(
        Arc::new(client),
        config.monitoring.clone(),
        config.service.timezone,
        alarm_state.clone(),
    ));

    // Evaluate immediately, then on the configured period
    let background = monitor.clone();
    let update_frequency = config.service.update_frequency;
    tokio::spawn(async move {
        background.run(update_frequency).await;
    });

    let state = AppState {
        alarm_state,
        monitor,
    };

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/alarms", get(get_alarms))
        .route("/alarms/refresh", post(refresh_alarms))
        .route("/alarms/stream", get(get_alarm_stream))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&config.service.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.service.bind_addr))?;
    tracing::info!("Server running on http://{}", config.service.bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui", config.service.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
