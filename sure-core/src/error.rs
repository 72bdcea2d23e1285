//! Structured errors for agent consumption: every failure carries a stable
//! code, a human message, and optional JSON details.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Stable, machine-readable error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    AuthRequired,
    AuthInvalid,
    AuthExpired,
    NotFound,
    #[serde(rename = "validation_failed")]
    Validation,
    #[serde(rename = "network_error")]
    Network,
    Timeout,
    #[serde(rename = "rate_limited")]
    RateLimit,
    ServerError,
    ConfigMissing,
    ConfigInvalid,
    RequestFailed,
    #[serde(rename = "unknown_error")]
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthRequired => "auth_required",
            ErrorCode::AuthInvalid => "auth_invalid",
            ErrorCode::AuthExpired => "auth_expired",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Validation => "validation_failed",
            ErrorCode::Network => "network_error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::RateLimit => "rate_limited",
            ErrorCode::ServerError => "server_error",
            ErrorCode::ConfigMissing => "config_missing",
            ErrorCode::ConfigInvalid => "config_invalid",
            ErrorCode::RequestFailed => "request_failed",
            ErrorCode::Unknown => "unknown_error",
        }
    }

    /// Temporary failures worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::Network | ErrorCode::Timeout | ErrorCode::RateLimit | ErrorCode::ServerError
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A classified failure: code + message + optional details and cause.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct CliError {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
    #[source]
    source: Option<BoxError>,
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Wrap an underlying error with a classified code
    pub fn wrap(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::new(code, message)
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Message followed by the cause chain, e.g. "Network error (connection reset)"
    pub fn full_message(&self) -> String {
        let mut out = self.message.clone();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            out.push_str(&format!(" ({err})"));
            cause = err.source();
        }
        out
    }
}

/// Map a non-success HTTP status to a structured error.
pub fn classify_http_status(status: u16, body: &str) -> CliError {
    match status {
        401 => CliError::new(ErrorCode::AuthRequired, "Authentication required"),
        403 => CliError::new(ErrorCode::AuthInvalid, "Access denied"),
        404 => CliError::new(ErrorCode::NotFound, "Resource not found"),
        422 => CliError::new(ErrorCode::Validation, "Validation failed")
            .with_details(serde_json::json!({ "body": truncate(body, 500) })),
        429 => CliError::new(ErrorCode::RateLimit, "Rate limit exceeded"),
        s if s >= 500 => CliError::new(ErrorCode::ServerError, format!("Server error (HTTP {s})")),
        s => CliError::new(ErrorCode::Unknown, format!("HTTP {s}")),
    }
}

/// Cut `s` to at most `max` bytes (on a char boundary), marking the cut with "..."
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_http_status() {
        assert_eq!(classify_http_status(401, "").code(), ErrorCode::AuthRequired);
        assert_eq!(classify_http_status(403, "").code(), ErrorCode::AuthInvalid);
        assert_eq!(classify_http_status(404, "").code(), ErrorCode::NotFound);
        assert_eq!(classify_http_status(429, "").code(), ErrorCode::RateLimit);
        assert_eq!(classify_http_status(418, "").code(), ErrorCode::Unknown);
        assert_eq!(classify_http_status(418, "").message(), "HTTP 418");

        let err = classify_http_status(503, "");
        assert_eq!(err.code(), ErrorCode::ServerError);
        assert_eq!(err.message(), "Server error (HTTP 503)");
    }

    #[test]
    fn test_validation_error_carries_truncated_body() {
        let body = "x".repeat(600);
        let err = classify_http_status(422, &body);
        assert_eq!(err.code(), ErrorCode::Validation);

        let details = err.details().unwrap();
        let shown = details["body"].as_str().unwrap();
        assert_eq!(shown.len(), 503);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        // "é" is two bytes; cutting at 1 must back off to 0
        assert_eq!(truncate("é", 1), "...");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }

    #[test]
    fn test_retryable_codes() {
        for code in [ErrorCode::Network, ErrorCode::Timeout, ErrorCode::RateLimit, ErrorCode::ServerError] {
            assert!(CliError::new(code, "x").is_retryable(), "{code} should be retryable");
        }
        for code in [ErrorCode::AuthRequired, ErrorCode::AuthInvalid, ErrorCode::Validation, ErrorCode::NotFound] {
            assert!(!CliError::new(code, "x").is_retryable(), "{code} should not be retryable");
        }
    }

    #[test]
    fn test_display_and_cause_chain() {
        let io = std::io::Error::other("connection reset");
        let err = CliError::wrap(ErrorCode::Network, "Network error", io);
        assert_eq!(err.to_string(), "network_error: Network error");
        assert_eq!(err.full_message(), "Network error (connection reset)");
    }

    #[test]
    fn test_code_serializes_to_wire_name() {
        for code in [ErrorCode::Validation, ErrorCode::Network, ErrorCode::RateLimit, ErrorCode::Unknown] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }
}
