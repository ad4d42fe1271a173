use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::ApiResponse;
use crate::telemetry::spawn_with_tracing;
use crate::AppState;

/// Starts a digest run in the background and answers straight away.
#[tracing::instrument(name = "Trigger digest run", skip(state))]
pub async fn send_news(state: State<AppState>) -> Response {
    let dispatcher = state.dispatcher.clone();
    spawn_with_tracing(async move {
        match dispatcher.run_daily_digest().await {
            Ok(report) => tracing::info!(
                outcome = ?report.outcome,
                delivered = report.delivered(),
                failed = report.failed(),
                "Triggered digest run completed"
            ),
            Err(e) => tracing::error!(error.cause_chain = ?e, "Triggered digest run failed"),
        }
    });
    (
        StatusCode::OK,
        Json(ApiResponse::ok(
            "Started sending today's digest to every subscriber.",
        )),
    )
        .into_response()
}
