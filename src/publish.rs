//! Publication of extracted identifiers
//!
//! After each successful step its value is handed to the configured sinks
//! under the step's output key. Publication is a side channel driven by the
//! executor's observer hooks; a sink failure is logged and never fails the
//! run.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use crate::pipeline::{RunObserver, Step, StepRecord, StepValue};

/// Destination for published `key=value` pairs
pub trait OutputSink: Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Publish one value
    fn publish(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Sets variables in this process's environment, inherited by any child
/// process spawned afterwards.
#[derive(Debug, Default)]
pub struct EnvSink;

impl OutputSink for EnvSink {
    fn name(&self) -> &'static str {
        "env"
    }

    fn publish(&mut self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() || key.contains(['=', '\0']) || value.contains('\0') {
            bail!("Cannot export '{key}' to the environment");
        }
        // Observers run between steps on the executor's task, after one call
        // has completed and before the next starts, so no other thread is
        // reading the environment while it is written.
        std::env::set_var(key, value);
        Ok(())
    }
}

/// Appends `key=value` lines to a file, in the format CI runners read from
/// `$GITHUB_OUTPUT`.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a sink writing to `path`, creating its parent directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create outputs directory: {}", parent.display())
            })?;
        }
        Ok(Self { path })
    }

    /// Path of the outputs file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn publish(&mut self, key: &str, value: &str) -> Result<()> {
        if value.contains('\n') {
            bail!("Value for '{key}' spans multiple lines");
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open outputs file: {}", self.path.display()))?;

        writeln!(file, "{key}={value}").context("Failed to write to outputs file")?;
        Ok(())
    }
}

/// Observer that forwards each successful step's value to every sink
///
/// Each key is published at most once. A later step extracting the same key
/// is ignored, matching the run's values where the first value wins.
#[derive(Default)]
pub struct Publisher {
    sinks: Vec<Box<dyn OutputSink>>,
    published: BTreeSet<String>,
}

impl Publisher {
    /// Create a publisher with no sinks
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn OutputSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Whether any sink is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl RunObserver for Publisher {
    fn step_finished(&mut self, step: &Step, record: &StepRecord) {
        let (Some(key), Some(value)) = (step.output_key(), record.outcome.value()) else {
            return;
        };
        if *value == StepValue::Unit {
            return;
        }
        if !self.published.insert(key.to_string()) {
            debug!(step = step.name(), key, "Output already published; keeping the first");
            return;
        }

        let value = value.to_string();
        for sink in &mut self.sinks {
            match sink.publish(key, &value) {
                Ok(()) => debug!(sink = sink.name(), key, value = %value, "Published output"),
                Err(err) => warn!(sink = sink.name(), key, error = %format!("{err:#}"), "Failed to publish output"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ErrorKind, StepError, StepOutcome};
    use serde_json::json;
    use tempfile::TempDir;

    fn keyed_step() -> Step {
        Step::new("create-issue", |input| input.post("x".to_string(), &json!({})))
            .extract("issue_number", |n: u64| StepValue::Number(n))
    }

    fn record(outcome: StepOutcome) -> StepRecord {
        StepRecord {
            name: "create-issue".to_string(),
            outcome,
            elapsed_ms: 3,
        }
    }

    #[test]
    fn test_file_sink_appends_lines() {
        let temp_dir = TempDir::new().unwrap();
        let mut sink = FileSink::new(temp_dir.path().join("outputs.env")).unwrap();

        sink.publish("repo_full_name", "acme/demo").unwrap();
        sink.publish("issue_number", "42").unwrap();

        let content = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content, "repo_full_name=acme/demo\nissue_number=42\n");
    }

    #[test]
    fn test_file_sink_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("outputs.env");
        let mut sink = FileSink::new(&path).unwrap();
        sink.publish("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_file_sink_rejects_multiline_value() {
        let temp_dir = TempDir::new().unwrap();
        let mut sink = FileSink::new(temp_dir.path().join("outputs.env")).unwrap();
        assert!(sink.publish("k", "a\nb").is_err());
    }

    #[test]
    fn test_env_sink_sets_variable() {
        let mut sink = EnvSink;
        sink.publish("FORGEFLOW_TEST_PUBLISH", "acme/demo").unwrap();
        assert_eq!(
            std::env::var("FORGEFLOW_TEST_PUBLISH").unwrap(),
            "acme/demo"
        );
    }

    #[test]
    fn test_env_sink_rejects_bad_key() {
        let mut sink = EnvSink;
        assert!(sink.publish("A=B", "x").is_err());
        assert!(sink.publish("", "x").is_err());
    }

    #[test]
    fn test_publisher_writes_successful_value() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("outputs.env");
        let mut publisher =
            Publisher::new().with_sink(Box::new(FileSink::new(&path).unwrap()));

        publisher.step_finished(
            &keyed_step(),
            &record(StepOutcome::Ok {
                value: StepValue::Number(42),
            }),
        );

        assert_eq!(fs::read_to_string(&path).unwrap(), "issue_number=42\n");
    }

    #[test]
    fn test_publisher_ignores_failed_step() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("outputs.env");
        let mut publisher =
            Publisher::new().with_sink(Box::new(FileSink::new(&path).unwrap()));

        publisher.step_finished(
            &keyed_step(),
            &record(StepError::new("create-issue", ErrorKind::HttpError, "nope").into()),
        );

        assert!(!path.exists());
    }

    #[test]
    fn test_publisher_ignores_step_without_key() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("outputs.env");
        let mut publisher =
            Publisher::new().with_sink(Box::new(FileSink::new(&path).unwrap()));
        let step = Step::new("add-comment", |input| input.post("x".to_string(), &json!({})));

        publisher.step_finished(
            &step,
            &record(StepOutcome::Ok {
                value: StepValue::Unit,
            }),
        );

        assert!(!path.exists());
        assert!(!publisher.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_key_publishes_first_value_only() {
        use crate::pipeline::{CancelToken, Executor};
        use crate::remote::RemoteResult;
        use crate::testutil::MockClient;
        use std::sync::Arc;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("outputs.env");
        let mut publisher =
            Publisher::new().with_sink(Box::new(FileSink::new(&path).unwrap()));
        let steps = vec![
            Step::new("first", |input| input.post("a".to_string(), &json!({})))
                .extract("k", |n: u64| StepValue::Number(n)),
            Step::new("second", |input| input.post("b".to_string(), &json!({})))
                .extract("k", |n: u64| StepValue::Number(n)),
        ];
        let client = Arc::new(MockClient::new(vec![
            RemoteResult::success(201, json!(1)),
            RemoteResult::success(201, json!(2)),
        ]));

        let report = Executor::new(client)
            .run_observed(&steps, &CancelToken::new(), &mut publisher)
            .await;

        assert!(report.succeeded());
        assert_eq!(report.values().number("k"), Some(1));
        assert_eq!(fs::read_to_string(&path).unwrap(), "k=1\n");
    }
}
