use serde::Deserialize;
use thiserror::Error;

use crate::http::{HttpError, Response};

/// Failure of a remote API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Transport failure, no response received.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response not covered by a more specific variant.
    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// The server rejected the request body.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The addressed resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A 2xx response whose body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// The call could not be made because local wiring is missing.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Classify a non-2xx response.
    ///
    /// The message prefers the body's `error` (then `message`) field and
    /// falls back to the status code.
    pub fn from_response(response: &Response, what: &str) -> Self {
        let detail = serde_json::from_slice::<ErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.error.or(body.message))
            .filter(|msg| !msg.trim().is_empty());

        match response.status {
            404 => Self::NotFound(detail.unwrap_or_else(|| what.to_owned())),
            400 | 422 => Self::Validation(detail.unwrap_or_else(|| {
                format!("{what} rejected with status {}", response.status)
            })),
            status => Self::Server {
                status,
                message: detail.unwrap_or_else(|| format!("API returned status: {status}")),
            },
        }
    }

    pub fn decode(what: &str, err: &serde_json::Error) -> Self {
        Self::Decode(format!("Failed to parse {what}: {err}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<HttpError> for ApiError {
    fn from(err: HttpError) -> Self {
        Self::Network(err.message)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn response(status: u16, body: &str) -> Response {
        Response {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn not_found_maps_to_not_found() {
        let err = ApiError::from_response(&response(404, "{}"), "user 23");
        assert_eq!(err, ApiError::NotFound("user 23".to_owned()));
        assert!(err.is_not_found());
    }

    #[test]
    fn bad_request_uses_error_field() {
        let body = r#"{"error":"Missing password"}"#;
        let err = ApiError::from_response(&response(400, body), "login");
        assert_eq!(err, ApiError::Validation("Missing password".to_owned()));
    }

    #[test]
    fn other_status_is_server_error() {
        let err = ApiError::from_response(&response(503, "<html>down</html>"), "list users");
        assert_eq!(
            err,
            ApiError::Server {
                status: 503,
                message: "API returned status: 503".to_owned()
            }
        );
    }

    #[test]
    fn http_error_is_network() {
        let err: ApiError = HttpError::new("connection refused").into();
        assert_eq!(err, ApiError::Network("connection refused".to_owned()));
        assert_eq!(err.to_string(), "Network error: connection refused");
    }
}
