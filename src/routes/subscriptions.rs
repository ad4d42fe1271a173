use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::ApiResponse;
use crate::subscriber_store::{AddOutcome, StoreError};
use crate::utils::{error_chain_fmt, truncate_graphemes};
use crate::AppState;

#[derive(Deserialize)]
pub struct SubscribeBody {
    #[serde(default)]
    pub email: String,
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("Please enter a valid email address.")]
    InvalidAddress(String),
    #[error("The request body must be a JSON object with an `email` string.")]
    MalformedBody(#[source] JsonRejection),
    #[error(transparent)]
    StorageUnavailable(StoreError),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for SubscribeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidAddress(reason) => Self::InvalidAddress(reason),
            other => Self::StorageUnavailable(other),
        }
    }
}

impl IntoResponse for SubscribeError {
    fn into_response(self) -> Response {
        match &self {
            Self::InvalidAddress(_) | Self::MalformedBody(_) => (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::failed(self.to_string())),
            )
                .into_response(),
            Self::StorageUnavailable(e) => {
                tracing::error!(error.cause_chain = ?e, "Failed to store a subscriber");
                let reason = std::error::Error::source(e)
                    .map(|cause| cause.to_string())
                    .unwrap_or_else(|| e.to_string());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::failed(format!(
                        "Subscription failed: {}",
                        truncate_graphemes(&reason, 50)
                    ))),
                )
                    .into_response()
            }
        }
    }
}

#[tracing::instrument(
    name = "Adding new subscriber",
    skip(state, body),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    state: State<AppState>,
    body: Result<Json<SubscribeBody>, JsonRejection>,
) -> Result<Response, SubscribeError> {
    let Json(body) = body.map_err(SubscribeError::MalformedBody)?;
    let email = body.email.trim().to_string();
    tracing::Span::current().record("subscriber_email", email.as_str());
    let msg = match state.store.add_if_absent(email).await? {
        AddOutcome::Added => "Subscribed! The daily digest is on its way to your inbox.",
        AddOutcome::AlreadyPresent => "You are already subscribed. No need to subscribe again.",
    };
    Ok((StatusCode::OK, Json(ApiResponse::ok(msg))).into_response())
}
