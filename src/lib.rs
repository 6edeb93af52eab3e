//! Forgeflow - dependent repository workflow runner
//!
//! Forgeflow creates a repository, opens an issue in it, and comments on
//! that issue through a GitHub-compatible REST API. Each step's identifier
//! feeds the next, and the first failure halts the run with a typed report.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod cli;
pub mod config;
pub mod log;
pub mod pipeline;
pub mod publish;
pub mod remote;
pub mod workflow;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use cli::{render_run_summary, RunDisplay};
pub use config::ForgeConfig;
pub use log::RunLog;
pub use pipeline::{
    CancelToken, ErrorKind, Executor, RunObserver, RunReport, RunState, Step, StepError,
    StepOutcome, StepValue,
};
pub use publish::{EnvSink, FileSink, Publisher};
pub use remote::{Credentials, HttpClient, RemoteClient, RemoteRequest, RemoteResult};
pub use workflow::issue_workflow;
