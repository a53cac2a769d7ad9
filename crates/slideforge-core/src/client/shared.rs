//! Error types and URL helpers shared by the service client and the orchestrator.

use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard User-Agent header for SlideForge API requests.
pub const USER_AGENT: &str = concat!("slideforge/", env!("CARGO_PKG_VERSION"));

/// Default service address (the backend's development port).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";

/// Environment variable that overrides the configured base URL.
pub const BASE_URL_ENV: &str = "SLIDEFORGE_BASE_URL";

// ============================================================================
// Config resolution helpers
// ============================================================================

/// Resolves a base URL with precedence: env > config > default.
///
/// # Errors
/// Returns an error if the env or config value is not a valid URL.
pub fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
) -> Result<String> {
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.to_string());
        }
    }

    Ok(default_url.to_string())
}

/// Validates that a URL is well-formed.
///
/// # Errors
/// Returns an error if `url` does not parse.
pub fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid SlideForge base URL: {url}"))?;
    Ok(())
}

/// Turns a service-relative path (e.g. `/api/download/deck.pptx`) into an
/// absolute URL against `base_url`. Absolute inputs are returned unchanged.
pub fn build_download_url(base_url: &str, path: &str) -> String {
    let path = path.trim();
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// ============================================================================
// Errors
// ============================================================================

/// Categories of service errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorKind {
    /// Connection refused, DNS failure, broken pipe and the like
    Transport,
    /// The request exceeded the client timeout
    Timeout,
    /// Non-2xx response from the service
    HttpStatus,
    /// Response body could not be decoded
    Parse,
    /// The operation was not allowed in the current session state
    Precondition,
    /// A response carried a conversation id that differs from the known one
    ConversationMismatch,
}

impl ServiceErrorKind {
    /// Returns true for failures where the request never got a response.
    pub fn is_transport(self) -> bool {
        matches!(self, ServiceErrorKind::Transport | ServiceErrorKind::Timeout)
    }
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceErrorKind::Transport => write!(f, "transport"),
            ServiceErrorKind::Timeout => write!(f, "timeout"),
            ServiceErrorKind::HttpStatus => write!(f, "http_status"),
            ServiceErrorKind::Parse => write!(f, "parse"),
            ServiceErrorKind::Precondition => write!(f, "precondition"),
            ServiceErrorKind::ConversationMismatch => write!(f, "conversation_mismatch"),
        }
    }
}

/// Structured error from the service client with kind and details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    /// Error category
    pub kind: ServiceErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ServiceError {
    /// Creates a new service error.
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Creates an HTTP status error.
    ///
    /// The service reports failures as `{"detail": "..."}`; when present the
    /// detail becomes the message and the status moves to `details`.
    pub fn http_status(status: u16, body: &str) -> Self {
        if let Some(detail) = extract_detail(body) {
            return Self {
                kind: ServiceErrorKind::HttpStatus,
                message: detail,
                details: Some(format!("HTTP {status}")),
            };
        }
        Self {
            kind: ServiceErrorKind::HttpStatus,
            message: format!("HTTP {status}"),
            details: (!body.trim().is_empty()).then(|| body.to_string()),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(action: &str) -> Self {
        Self::new(
            ServiceErrorKind::Timeout,
            format!("The SlideForge service did not respond in time while {action}"),
        )
    }

    /// Creates a transport error for a request that never reached the service.
    pub fn transport(action: &str) -> Self {
        Self::new(
            ServiceErrorKind::Transport,
            format!("Could not reach the SlideForge service while {action}"),
        )
    }

    pub fn parse(action: &str, err: &impl fmt::Display) -> Self {
        Self::new(
            ServiceErrorKind::Parse,
            format!("Unexpected response from the SlideForge service while {action}"),
        )
        .with_details(err.to_string())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Precondition, message)
    }

    pub fn conversation_mismatch(known: &str, returned: &str) -> Self {
        Self::new(
            ServiceErrorKind::ConversationMismatch,
            format!("The service answered for conversation {returned}, expected {known}"),
        )
    }

    /// Maps a reqwest failure to a service error for the given action.
    pub fn from_reqwest(err: &reqwest::Error, action: &str) -> Self {
        let base = if err.is_timeout() {
            Self::timeout(action)
        } else if err.is_decode() {
            return Self::parse(action, err);
        } else {
            Self::transport(action)
        };
        base.with_details(err.to_string())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Pulls a human-readable detail out of an error body.
///
/// Handles both `{"detail": "text"}` and request-validation bodies of the
/// form `{"detail": [{"msg": "..."}]}`.
fn extract_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("detail")? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
