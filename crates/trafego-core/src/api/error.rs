use std::fmt;

use serde_json::Value;

/// Categories of API failures.
///
/// Callers branch on the kind: `Authentication` ends the session, the other
/// two are surfaced locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// HTTP 401 or 403
    Authentication,
    /// The request never completed (DNS, connect, timeout)
    Transport,
    /// Any other non-2xx status, or an undecodable 2xx body
    Status,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Authentication => write!(f, "authentication"),
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Status => write!(f, "status"),
        }
    }
}

/// Structured error returned by every [`ApiClient`](super::ApiClient) operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// HTTP status when a response was received
    pub status: Option<u16>,
    /// Server-provided message, or a description of the failure
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    pub fn authentication(status: u16, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Authentication, Some(status), message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport, None, message)
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Status, Some(status), message)
    }

    /// Builds the error for a non-2xx response.
    ///
    /// 401 and 403 are authentication failures; everything else keeps the
    /// status and the best message found in the body.
    pub fn from_response(status: u16, body: &str, reason: Option<&str>) -> Self {
        let message = extract_server_message(body)
            .or_else(|| reason.map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {status}"));

        if matches!(status, 401 | 403) {
            Self::authentication(status, message)
        } else {
            Self::status(status, message)
        }
    }

    pub fn is_authentication(&self) -> bool {
        self.kind == ApiErrorKind::Authentication
    }

    pub fn is_transport(&self) -> bool {
        self.kind == ApiErrorKind::Transport
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.status) {
            (ApiErrorKind::Authentication, Some(status)) => {
                write!(f, "authentication failed (HTTP {status}): {}", self.message)
            }
            (ApiErrorKind::Authentication, None) => {
                write!(f, "authentication failed: {}", self.message)
            }
            (ApiErrorKind::Transport, _) => write!(f, "transport error: {}", self.message),
            (ApiErrorKind::Status, Some(status)) => write!(f, "HTTP {status}: {}", self.message),
            (ApiErrorKind::Status, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

pub(crate) fn classify_reqwest_error(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::transport(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ApiError::transport(format!("Connection failed: {e}"))
    } else if let Some(status) = e.status() {
        ApiError::from_response(status.as_u16(), "", status.canonical_reason())
    } else {
        ApiError::transport(format!("Network error: {e}"))
    }
}

/// Pulls a human-readable message out of an error body.
///
/// Order: `detail` string, `detail` validation array (joined `msg` fields),
/// `message` string, then the trimmed raw body.
pub fn extract_server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        match json.get("detail") {
            Some(Value::String(detail)) if !detail.trim().is_empty() => {
                return Some(detail.trim().to_string());
            }
            Some(Value::Array(items)) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if !msgs.is_empty() {
                    return Some(msgs.join("; "));
                }
            }
            _ => {}
        }

        if let Some(message) = json.get("message").and_then(Value::as_str)
            && !message.trim().is_empty()
        {
            return Some(message.trim().to_string());
        }
    }

    Some(trimmed.to_string())
}
