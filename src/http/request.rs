//! Request parsing.
//!
//! # Responsibilities
//! - Resolve the bridge target from `host` and `port` query parameters
//! - Read the request ID set by the request-id layer

use axum::http::HeaderMap;
use serde::Deserialize;
use thiserror::Error;

use crate::bridge::Target;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID from the headers, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Invalid bridge request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("missing host or port query params")]
    MissingParams,

    #[error("invalid port query param: {0}")]
    InvalidPort(String),
}

/// Raw query parameters of the `/tcp` endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct TargetParams {
    pub host: Option<String>,
    pub port: Option<String>,
}

impl TargetParams {
    /// Both parameters must be present and non-empty; the port must be a
    /// TCP port number.
    pub fn resolve(self) -> Result<Target, RequestError> {
        let host = self.host.filter(|h| !h.is_empty());
        let port = self.port.filter(|p| !p.is_empty());

        let (host, port) = match (host, port) {
            (Some(host), Some(port)) => (host, port),
            _ => return Err(RequestError::MissingParams),
        };

        let port = port
            .parse::<u16>()
            .map_err(|_| RequestError::InvalidPort(port))?;

        Ok(Target::new(host, port))
    }
}
