//! Pipeline executor
//!
//! Runs an ordered list of steps against a [`RemoteClient`], threading each
//! step's value into later steps and halting on the first failure.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::cancel::CancelToken;
use super::error::{ErrorKind, StepError};
use super::report::{ReportBuilder, RunReport, StepRecord};
use super::step::{Step, StepOutcome};
use crate::remote::RemoteClient;

/// Callbacks fired as a run progresses.
///
/// Observers see every step boundary but cannot change control flow. The
/// binary uses them for terminal display and for publishing identifiers.
pub trait RunObserver: Send {
    /// A step is about to make its remote call
    fn step_started(&mut self, _index: usize, _step: &Step) {}

    /// A step finished (successfully or not) and its record was appended
    fn step_finished(&mut self, _step: &Step, _record: &StepRecord) {}
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Fan one event stream out to several observers, in order
#[derive(Default)]
pub struct Observers<'a>(Vec<&'a mut dyn RunObserver>);

impl<'a> Observers<'a> {
    /// Create an empty fan-out
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add an observer
    #[must_use]
    pub fn with(mut self, observer: &'a mut dyn RunObserver) -> Self {
        self.0.push(observer);
        self
    }
}

impl RunObserver for Observers<'_> {
    fn step_started(&mut self, index: usize, step: &Step) {
        for observer in &mut self.0 {
            observer.step_started(index, step);
        }
    }

    fn step_finished(&mut self, step: &Step, record: &StepRecord) {
        for observer in &mut self.0 {
            observer.step_finished(step, record);
        }
    }
}

/// Executes steps strictly in order
///
/// Each call to [`Executor::run`] owns its own accumulator and report, so one
/// executor can serve independent runs concurrently.
#[derive(Clone)]
pub struct Executor {
    client: Arc<dyn RemoteClient>,
}

impl Executor {
    /// Create an executor that sends every request through `client`
    #[must_use]
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self { client }
    }

    /// Run `steps` without observers
    pub async fn run(&self, steps: &[Step], cancel: &CancelToken) -> RunReport {
        self.run_observed(steps, cancel, &mut NoopObserver).await
    }

    /// Run `steps` in order, notifying `observer` at each step boundary.
    ///
    /// Before each step the cancellation signal and the step's declared
    /// predecessors are checked; either failing records an error for that
    /// step without calling the client. The first error halts the run.
    pub async fn run_observed(
        &self,
        steps: &[Step],
        cancel: &CancelToken,
        observer: &mut dyn RunObserver,
    ) -> RunReport {
        let mut report = ReportBuilder::start();

        for (index, step) in steps.iter().enumerate() {
            report.enter(index);
            debug!(state = ?report.state(), step = step.name(), "Entering step");
            let started = Instant::now();

            let outcome: StepOutcome = if cancel.is_cancelled() {
                StepError::new(step.name(), ErrorKind::Cancelled, "run cancelled before dispatch")
                    .into()
            } else if let Some(missing) = step
                .depends_on()
                .iter()
                .find(|dep| !report.succeeded_step(dep))
            {
                StepError::new(
                    step.name(),
                    ErrorKind::SkippedDependency,
                    format!("predecessor '{missing}' did not succeed"),
                )
                .into()
            } else {
                observer.step_started(index, step);
                step.run(report.values(), self.client.as_ref()).await
            };

            let record = StepRecord {
                name: step.name().to_string(),
                outcome,
                elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            };

            let failed_kind = match &record.outcome {
                StepOutcome::Ok { value } => {
                    if let Some(key) = step.output_key() {
                        if !report.store(key, value.clone()) {
                            warn!(step = step.name(), key, "Value already produced; keeping the first");
                        }
                    }
                    info!(step = step.name(), %value, elapsed_ms = record.elapsed_ms, "Step succeeded");
                    None
                }
                StepOutcome::Err { error } => {
                    error!(
                        step = step.name(),
                        kind = %error.kind,
                        status = error.status,
                        detail = %error.detail,
                        "Step failed"
                    );
                    Some(error.kind)
                }
            };

            observer.step_finished(step, &record);
            report.push(record);

            if let Some(kind) = failed_kind {
                return report.fail(index, kind);
            }
        }

        report.succeed()
    }
}
