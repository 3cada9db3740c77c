use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::common::error::NmtError;
use crate::pipelines::TranslateGate;

/// Edge-facing error: the pipeline error plus the `Retry-After` estimate
/// attached for overload responses.
pub struct ApiError {
    pub error: NmtError,
    pub retry_after: Option<u64>,
}

impl ApiError {
    /// Wrap an error, asking the gate for a retry estimate when the error
    /// signals overload.
    pub fn from_gate(error: NmtError, gate: &TranslateGate) -> ApiError {
        let retry_after = match &error {
            NmtError::QueueOverflow { waiters } => Some(gate.estimate_retry_after(Some(*waiters))),
            NmtError::ServiceBusy => Some(gate.estimate_retry_after(None)),
            _ => None,
        };
        ApiError { error, retry_after }
    }
}

impl From<NmtError> for ApiError {
    fn from(error: NmtError) -> ApiError {
        ApiError {
            error,
            retry_after: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.error {
            NmtError::QueueOverflow { .. } => {
                overload_response(StatusCode::TOO_MANY_REQUESTS, self.retry_after)
            }
            NmtError::ServiceBusy => {
                overload_response(StatusCode::SERVICE_UNAVAILABLE, self.retry_after)
            }
            NmtError::UnsupportedLanguagePair { src, tgt } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Unsupported language pair",
                    "src": src,
                    "tgt": tgt,
                })),
            )
                .into_response(),
            NmtError::TranslationTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({"error": self.error.to_string()})),
            )
                .into_response(),
            NmtError::ModelLoad(_) | NmtError::Inference(_) => (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": self.error.to_string()})),
            )
                .into_response(),
            NmtError::ValueError(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": self.error.to_string()})),
            )
                .into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": self.error.to_string()})),
            )
                .into_response(),
        }
    }
}

fn overload_response(status: StatusCode, retry_after: Option<u64>) -> Response {
    let retry_after = retry_after.unwrap_or(1).max(1);
    let message = if status == StatusCode::TOO_MANY_REQUESTS {
        "Too many requests; queue full"
    } else {
        "Server busy"
    };
    let mut response = (
        status,
        Json(json!({
            "message": message,
            "retry_after_sec": retry_after,
        })),
    )
        .into_response();
    if let Ok(value) = retry_after.to_string().parse() {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}
