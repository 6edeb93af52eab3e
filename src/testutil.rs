//! Shared test utilities
//!
//! Common helpers used across test modules. Only compiled in test builds.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::remote::{RemoteClient, RemoteRequest, RemoteResult};

/// Scripted [`RemoteClient`] that records every request it receives.
///
/// Responses are handed out in order. Once the script is exhausted every
/// further call gets a transport failure, so an unexpected extra call shows
/// up as a failed step rather than a panic.
pub struct MockClient {
    script: Mutex<VecDeque<RemoteResult>>,
    repeat: Option<RemoteResult>,
    requests: Mutex<Vec<RemoteRequest>>,
}

impl MockClient {
    /// Answer calls with `responses`, in order
    #[must_use]
    pub fn new(responses: Vec<RemoteResult>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with the same result
    #[must_use]
    pub fn repeating(response: RemoteResult) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<RemoteRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Request paths received so far, in order
    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    /// Number of calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteClient for MockClient {
    async fn send(&self, request: RemoteRequest) -> RemoteResult {
        self.requests.lock().unwrap().push(request);
        if let Some(response) = &self.repeat {
            return response.clone();
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| RemoteResult::transport("mock script exhausted"))
    }
}
