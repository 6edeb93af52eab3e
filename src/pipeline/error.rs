//! Step error taxonomy
//!
//! Every failure a step can produce is a [`StepError`] value carried in the
//! run report. Nothing in the pipeline is thrown past the executor.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a step failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// The remote call could not be completed (DNS, TLS, timeout, reset)
    Transport,
    /// The API answered with a non-2xx status
    HttpError,
    /// 2xx response, but the expected field was missing or mistyped
    MalformedResponse,
    /// A predecessor step did not produce a value this step needs
    SkippedDependency,
    /// The run was cancelled before this step's call was dispatched
    Cancelled,
    /// The request body could not be serialized
    InvalidRequest,
}

impl ErrorKind {
    /// Stable kebab-case name, as used in reports and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::HttpError => "http-error",
            Self::MalformedResponse => "malformed-response",
            Self::SkippedDependency => "skipped-dependency",
            Self::Cancelled => "cancelled",
            Self::InvalidRequest => "invalid-request",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed step: which step, what kind of failure, and the diagnostic detail
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("step '{step}' failed ({kind}{}): {detail}", status_suffix(.status))]
pub struct StepError {
    /// Name of the failing step
    pub step: String,
    /// Failure classification
    pub kind: ErrorKind,
    /// HTTP status, when the call completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Human-readable cause (raw response body for HTTP errors)
    pub detail: String,
}

impl StepError {
    /// Create an error without an HTTP status
    #[must_use]
    pub fn new(step: &str, kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            step: step.to_string(),
            kind,
            status: None,
            detail: detail.into(),
        }
    }

    /// Attach the HTTP status the failure was observed with
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(", status {s}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_are_kebab_case() {
        assert_eq!(ErrorKind::Transport.as_str(), "transport");
        assert_eq!(ErrorKind::HttpError.as_str(), "http-error");
        assert_eq!(ErrorKind::MalformedResponse.as_str(), "malformed-response");
        assert_eq!(ErrorKind::SkippedDependency.as_str(), "skipped-dependency");
        assert_eq!(ErrorKind::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_kind_serializes_like_display() {
        let json = serde_json::to_string(&ErrorKind::HttpError).unwrap();
        assert_eq!(json, "\"http-error\"");
    }

    #[test]
    fn test_display_includes_status_when_present() {
        let err = StepError::new("create-issue", ErrorKind::HttpError, "Not Found").with_status(404);
        assert_eq!(
            err.to_string(),
            "step 'create-issue' failed (http-error, status 404): Not Found"
        );
    }

    #[test]
    fn test_display_without_status() {
        let err = StepError::new("create-repository", ErrorKind::Transport, "connection refused");
        assert_eq!(
            err.to_string(),
            "step 'create-repository' failed (transport): connection refused"
        );
    }

    #[test]
    fn test_status_omitted_from_json_when_absent() {
        let err = StepError::new("add-comment", ErrorKind::Cancelled, "cancelled");
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("status").is_none());
        assert_eq!(json["kind"], "cancelled");
    }
}
