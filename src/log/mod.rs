//! Logging and observability
//!
//! Leveled `tracing` output on stderr, plus the optional JSONL history of
//! finished runs.

pub mod jsonl;

pub use jsonl::RunLog;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
#[must_use]
pub const fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "forgeflow=debug"
    } else {
        "forgeflow=info"
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(verbose: bool) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose))),
        )
        .init();
}
