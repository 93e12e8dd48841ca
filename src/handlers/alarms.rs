use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;

use crate::errors::AppError;
use crate::models::alarm::AlarmReport;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/alarms",
    responses(
        (status = 200, description = "Latest ranked alarm report", body = AlarmReport),
        (status = 503, description = "No evaluation has finished yet", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_alarms(State(state): State<AppState>) -> Result<Json<AlarmReport>, AppError> {
    let report = state.alarm_state.report.read().await.clone();
    report
        .map(Json)
        .ok_or_else(|| AppError::Unavailable("first evaluation still running".to_string()))
}

#[utoipa::path(
    post,
    path = "/alarms/refresh",
    responses(
        (status = 200, description = "Re-evaluate all symbols now and return the ranked report", body = AlarmReport)
    )
)]
pub async fn refresh_alarms(State(state): State<AppState>) -> Result<Json<AlarmReport>, AppError> {
    let report = state.monitor.refresh().await;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/alarms/stream",
    responses(
        (status = 200, description = "SSE stream of alarm reports", content_type = "text/event-stream")
    )
)]
pub async fn get_alarm_stream(
    State(state): State<AppState>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    let initial_report = state.alarm_state.report.read().await.clone();

    let initial_events = match initial_report.and_then(report_event) {
        Some(event) => vec![Ok(event)],
        None => Vec::new(),
    };
    let initial_stream = tokio_stream::iter(initial_events);

    let rx = state.alarm_state.broadcaster.subscribe();
    let broadcast_stream = BroadcastStream::new(rx).filter_map(|message| match message {
        Ok(report) => report_event(report).map(Ok),
        Err(BroadcastStreamRecvError::Lagged(_)) => None,
    });

    let stream = initial_stream.chain(broadcast_stream);

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

fn report_event(report: AlarmReport) -> Option<Event> {
    let data = serde_json::to_string(&report).ok()?;
    Some(
        Event::default()
            .event("snapshot")
            .id(report.as_of_ms.to_string())
            .data(data),
    )
}
