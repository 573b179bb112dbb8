//! Error responses.
//!
//! Every refusal on the bridge endpoint carries a JSON body of the form
//! `{"error": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::bridge::{AdmissionError, ConnectError};
use crate::http::request::RequestError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Build a JSON error response.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        error_response(StatusCode::BAD_REQUEST, self.to_string())
    }
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        error_response(StatusCode::SERVICE_UNAVAILABLE, self.to_string())
    }
}

impl IntoResponse for ConnectError {
    fn into_response(self) -> Response {
        let status = if self.is_timeout() {
            StatusCode::GATEWAY_TIMEOUT
        } else {
            StatusCode::BAD_GATEWAY
        };
        error_response(status, self.to_string())
    }
}
