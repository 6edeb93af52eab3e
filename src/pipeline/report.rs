//! Run report: the immutable record of one pipeline execution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{ErrorKind, StepError};
use super::step::StepOutcome;
use super::value::{StepValue, Values};

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunState {
    /// No step has started
    Pending,
    /// The step at `step` (0-based) is executing
    Running {
        /// Index of the executing step
        step: usize,
    },
    /// Every step reported `Ok`
    Succeeded,
    /// The step at `step` failed and the run halted
    Failed {
        /// Index of the failing step
        step: usize,
        /// Why it failed
        kind: ErrorKind,
    },
}

impl RunState {
    /// Whether the run can make no further progress
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. })
    }
}

/// Outcome and timing of one executed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name
    pub name: String,
    /// What the step produced
    pub outcome: StepOutcome,
    /// Wall-clock time spent in the step, in milliseconds
    pub elapsed_ms: u64,
}

/// Complete record of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    state: RunState,
    succeeded: bool,
    records: Vec<StepRecord>,
    values: Values,
}

impl RunReport {
    /// Whether every step reported `Ok`
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Terminal state of the run
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Per-step records, in execution order
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Values accumulated by successful steps
    #[must_use]
    pub const fn values(&self) -> &Values {
        &self.values
    }

    /// Record for the named step, if it ran
    #[must_use]
    pub fn record(&self, name: &str) -> Option<&StepRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// The error that halted the run, if any
    #[must_use]
    pub fn failure(&self) -> Option<&StepError> {
        self.records.iter().find_map(|r| r.outcome.error())
    }

    /// When the run started
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the run halted
    #[must_use]
    pub const fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Sum of per-step elapsed time in milliseconds
    #[must_use]
    pub fn total_elapsed_ms(&self) -> u64 {
        self.records.iter().map(|r| r.elapsed_ms).sum()
    }
}

/// Incrementally builds a [`RunReport`] while the executor runs.
#[derive(Debug)]
pub(crate) struct ReportBuilder {
    started_at: DateTime<Utc>,
    state: RunState,
    records: Vec<StepRecord>,
    values: Values,
}

impl ReportBuilder {
    pub(crate) fn start() -> Self {
        Self {
            started_at: Utc::now(),
            state: RunState::Pending,
            records: Vec::new(),
            values: Values::new(),
        }
    }

    pub(crate) const fn values(&self) -> &Values {
        &self.values
    }

    pub(crate) fn enter(&mut self, step: usize) {
        self.state = RunState::Running { step };
    }

    pub(crate) const fn state(&self) -> RunState {
        self.state
    }

    /// Whether `name` has a recorded `Ok` outcome
    pub(crate) fn succeeded_step(&self, name: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.name == name && r.outcome.is_ok())
    }

    /// Store an extracted value. Returns `false` if the key already exists.
    pub(crate) fn store(&mut self, key: &str, value: StepValue) -> bool {
        self.values.insert(key, value)
    }

    pub(crate) fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    pub(crate) fn fail(self, step: usize, kind: ErrorKind) -> RunReport {
        self.finish(RunState::Failed { step, kind })
    }

    pub(crate) fn succeed(self) -> RunReport {
        self.finish(RunState::Succeeded)
    }

    fn finish(self, state: RunState) -> RunReport {
        RunReport {
            started_at: self.started_at,
            finished_at: Utc::now(),
            state,
            succeeded: state == RunState::Succeeded,
            records: self.records,
            values: self.values,
        }
    }
}
