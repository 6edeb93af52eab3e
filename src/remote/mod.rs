//! Remote resource client
//!
//! Outbound authenticated JSON calls and the classification of their
//! responses into success or typed failure.

pub mod client;
pub mod request;

pub use client::{HttpClient, RemoteClient, DEFAULT_USER_AGENT};
pub use request::{Credentials, FailureReason, RemoteFailure, RemoteRequest, RemoteResult};
