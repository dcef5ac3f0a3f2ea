//! SDK error types and HTTP error classification.
//!
//! [`Error`] is the single error type returned by every fallible
//! operation in the SDK. Failed HTTP calls are classified into an
//! [`ApiError`] carrying a typed [`ErrorKind`] plus everything useful
//! from the response, and wrapped as [`Error::Api`].

use std::fmt;

use openlb_models::EndpointLookupError;

use crate::transport::HttpResponse;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or missing configuration (e.g. bad URL, unreadable CA file).
    #[error("configuration error: {0}")]
    Config(String),

    /// The auth plugin cannot authenticate with the options it was given.
    #[error("authentication failed, missing options: {}", missing.join(", "))]
    MissingOptions {
        /// The required option names that were not supplied.
        missing: Vec<String>,
    },

    /// Mutually exclusive scope options were combined.
    #[error("invalid scope: {0}")]
    InvalidScope(String),

    /// The identity service rejected the credentials, or its response
    /// could not be understood.
    #[error("authorization failure: {0}")]
    AuthorizationFailure(String),

    /// A precondition for running the command was not met.
    #[error("{0}")]
    Command(String),

    /// No catalog endpoint matched the requested service.
    #[error(transparent)]
    EndpointNotFound(#[from] EndpointLookupError),

    /// A classified failure from the identity or load-balancer API.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Classification of a failed HTTP call.
///
/// Statuses with a dedicated variant map to it; any other 5xx maps to
/// [`ErrorKind::Server`], any other 4xx to [`ErrorKind::Client`], and
/// everything else to [`ErrorKind::Http`]. A call that produced no
/// response at all is [`ErrorKind::Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received (refused, reset, timed out).
    Connection,
    /// 400.
    BadRequest,
    /// 401.
    Unauthorized,
    /// 403.
    Forbidden,
    /// 404.
    NotFound,
    /// 405.
    MethodNotAllowed,
    /// 406.
    NotAcceptable,
    /// 409.
    Conflict,
    /// 413.
    OverLimit,
    /// 415.
    UnsupportedMediaType,
    /// 429.
    RateLimit,
    /// 501.
    NotImplemented,
    /// 503.
    ServiceUnavailable,
    /// Any other 5xx, including 500.
    Server,
    /// Any other 4xx.
    Client,
    /// Any status outside 4xx/5xx that was still treated as a failure.
    Http,
}

impl ErrorKind {
    /// Map a status code to its classification.
    pub fn from_status(status: u16) -> ErrorKind {
        match status {
            400 => ErrorKind::BadRequest,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            405 => ErrorKind::MethodNotAllowed,
            406 => ErrorKind::NotAcceptable,
            409 => ErrorKind::Conflict,
            413 => ErrorKind::OverLimit,
            415 => ErrorKind::UnsupportedMediaType,
            429 => ErrorKind::RateLimit,
            501 => ErrorKind::NotImplemented,
            503 => ErrorKind::ServiceUnavailable,
            500..=599 => ErrorKind::Server,
            400..=499 => ErrorKind::Client,
            _ => ErrorKind::Http,
        }
    }
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// A classified HTTP failure.
///
/// Built once per failed call by the transport's classifier and never
/// mutated. The `message` falls back to `"n/a"` when the response body
/// carried nothing usable.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Classification of the failure.
    pub kind: ErrorKind,
    /// HTTP status, absent for connection-level failures.
    pub status: Option<u16>,
    /// Human-readable message extracted from the body.
    pub message: String,
    /// Additional detail from the body, when present.
    pub details: Option<String>,
    /// Value of the `x-compute-request-id` response header.
    pub request_id: Option<String>,
    /// Parsed `retry-after` response header.
    pub retry_after: Option<u64>,
    /// The request method.
    pub method: String,
    /// The request URL.
    pub url: String,
}

/// Signature of the response classifier the transport calls for every
/// non-success response. Swappable for tests or alternative taxonomies.
pub type Classifier = fn(method: &str, url: &str, response: &HttpResponse) -> ApiError;

/// Non-empty string field of a JSON object, mirroring the API's habit of
/// sending present-but-empty fields.
fn body_field(body: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    body.get(key)
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ApiError {
    /// Classify a response. Total over every status code: the result
    /// always carries exactly one [`ErrorKind`].
    pub fn from_response(method: &str, url: &str, response: &HttpResponse) -> ApiError {
        let mut message = String::from("n/a");
        let mut details = None;

        let content_type = response.content_type().unwrap_or("");
        if content_type.starts_with("application/json") {
            if let Ok(serde_json::Value::Object(body)) =
                serde_json::from_str::<serde_json::Value>(response.body())
            {
                if let Some(text) =
                    body_field(&body, "faultstring").or_else(|| body_field(&body, "message"))
                {
                    message = text;
                }
                details = body_field(&body, "details");
            }
        } else if content_type.starts_with("text/") && !response.body().is_empty() {
            details = Some(response.body().to_string());
        }

        ApiError {
            kind: ErrorKind::from_status(response.status()),
            status: Some(response.status()),
            message,
            details,
            request_id: response.header("x-compute-request-id").map(str::to_string),
            retry_after: response
                .header("retry-after")
                .and_then(|v| v.trim().parse().ok()),
            method: method.to_string(),
            url: url.to_string(),
        }
    }

    /// A connection-level failure: the call produced no response.
    pub fn connection(method: &str, url: &str, reason: impl fmt::Display) -> ApiError {
        ApiError {
            kind: ErrorKind::Connection,
            status: None,
            message: "cannot connect to API service".to_string(),
            details: Some(reason.to_string()),
            request_id: None,
            retry_after: None,
            method: method.to_string(),
            url: url.to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {status})")?;
        }
        if let Some(id) = &self.request_id {
            write!(f, " (Request-ID: {id})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
