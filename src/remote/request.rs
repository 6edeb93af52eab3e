//! Request and result types exchanged with the remote API

use std::fmt;

use reqwest::Method;
use serde::Serialize;

/// Authentication token and API base URL
///
/// Immutable once built. The token is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    base_url: String,
}

impl Credentials {
    /// Create credentials, normalizing the base URL to end with `/` so
    /// relative paths such as `user/repos` concatenate correctly.
    #[must_use]
    pub fn new(token: &str, base_url: &str) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            token: token.to_string(),
            base_url,
        }
    }

    /// The personal access token
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Base API URL, always ending with `/`
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// One outbound API call
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the API base URL
    pub path: String,
    /// JSON request body
    pub body: serde_json::Value,
}

impl RemoteRequest {
    /// Build a `POST` request with a serialized JSON body
    pub fn post<T: Serialize>(path: impl Into<String>, body: &T) -> serde_json::Result<Self> {
        Ok(Self {
            method: Method::POST,
            path: path.into(),
            body: serde_json::to_value(body)?,
        })
    }
}

/// Why a remote call did not yield a usable payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The call never completed (DNS, TLS, timeout, reset)
    Transport,
    /// The API answered with a non-2xx status
    HttpStatus,
    /// 2xx status but the body was not valid JSON
    InvalidBody,
}

impl FailureReason {
    /// Short name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::HttpStatus => "http-error",
            Self::InvalidBody => "invalid-body",
        }
    }
}

/// A remote call that did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    /// Response status, absent on transport failures
    pub status: Option<u16>,
    /// Raw response body, or the transport error message
    pub raw_body: String,
    /// Failure classification
    pub reason: FailureReason,
}

/// Outcome of a single remote call
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResult {
    /// 2xx response with its parsed JSON body (`null` when empty)
    Success {
        /// Response status
        status: u16,
        /// Parsed body
        body: serde_json::Value,
    },
    /// Anything else
    Failure(RemoteFailure),
}

impl RemoteResult {
    /// Successful result with the given status and body
    #[must_use]
    pub const fn success(status: u16, body: serde_json::Value) -> Self {
        Self::Success { status, body }
    }

    /// Non-2xx result carrying the raw body as diagnostic text
    #[must_use]
    pub fn http_error(status: u16, raw_body: impl Into<String>) -> Self {
        Self::Failure(RemoteFailure {
            status: Some(status),
            raw_body: raw_body.into(),
            reason: FailureReason::HttpStatus,
        })
    }

    /// Transport-level failure with no status
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Failure(RemoteFailure {
            status: None,
            raw_body: message.into(),
            reason: FailureReason::Transport,
        })
    }

    /// 2xx result whose body could not be parsed
    #[must_use]
    pub fn invalid_body(status: u16, raw_body: impl Into<String>) -> Self {
        Self::Failure(RemoteFailure {
            status: Some(status),
            raw_body: raw_body.into(),
            reason: FailureReason::InvalidBody,
        })
    }

    /// Whether the call succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
