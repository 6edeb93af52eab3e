//! Authenticated JSON client for the hosting API
//!
//! [`RemoteClient`] is the seam the pipeline talks to; [`HttpClient`] is the
//! reqwest-backed implementation used by the binary.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use tracing::{debug, warn};

use super::request::{Credentials, RemoteRequest, RemoteResult};

/// Default `User-Agent` sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("forgeflow/", env!("CARGO_PKG_VERSION"));

/// Media type requested from the API
const ACCEPT_JSON: &str = "application/vnd.github+json";

/// Sends one request and classifies the response.
///
/// Implementations never return an error: every failure is encoded in the
/// returned [`RemoteResult`].
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Perform the call described by `request`
    async fn send(&self, request: RemoteRequest) -> RemoteResult;
}

/// reqwest-backed [`RemoteClient`]
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    credentials: Credentials,
}

impl HttpClient {
    /// Build a client that authenticates with `credentials` on every call.
    ///
    /// `timeout` bounds each whole request; it is the only timeout applied
    /// anywhere in a run.
    pub fn new(credentials: Credentials, user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("token {}", credentials.token()))
            .context("Token contains characters not allowed in an HTTP header")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .context("User agent contains characters not allowed in an HTTP header")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Credentials this client authenticates with
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[async_trait]
impl RemoteClient for HttpClient {
    async fn send(&self, request: RemoteRequest) -> RemoteResult {
        let url = self.credentials.url_for(&request.path);
        debug!(method = %request.method, %url, "Sending request");

        let response = match self
            .client
            .request(request.method, &url)
            .json(&request.body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(%url, error = %err, "Request did not complete");
                return RemoteResult::transport(err.to_string());
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                warn!(%url, error = %err, "Failed to read response body");
                return RemoteResult::transport(err.to_string());
            }
        };

        debug!(%url, status = status.as_u16(), bytes = text.len(), "Received response");
        classify(status.as_u16(), text)
    }
}

/// Turn a completed response into a [`RemoteResult`].
///
/// The body is only parsed on 2xx; error bodies are kept verbatim since
/// their shape is not guaranteed.
fn classify(status: u16, text: String) -> RemoteResult {
    if !(200..300).contains(&status) {
        return RemoteResult::http_error(status, text);
    }
    if text.trim().is_empty() {
        return RemoteResult::success(status, serde_json::Value::Null);
    }
    match serde_json::from_str(&text) {
        Ok(body) => RemoteResult::success(status, body),
        Err(_) => RemoteResult::invalid_body(status, text),
    }
}
