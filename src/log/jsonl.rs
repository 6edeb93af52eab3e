//! JSONL (JSON Lines) history of finished runs
//!
//! Provides append-only logging of run reports to `<dir>/runs.jsonl`.
//! Only the binary writes here, and only when asked to; the pipeline itself
//! persists nothing.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use crate::pipeline::RunReport;

/// JSONL logger for run reports
///
/// Each line is a JSON object holding one complete [`RunReport`].
pub struct RunLog {
    log_path: PathBuf,
}

impl RunLog {
    /// Create a new run log
    ///
    /// # Arguments
    /// * `log_dir` - Directory where runs.jsonl will be stored
    ///
    /// # Errors
    /// Returns an error if the log directory cannot be created
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Result<Self> {
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        Ok(Self {
            log_path: log_dir.join("runs.jsonl"),
        })
    }

    /// Append a run report to the log
    pub fn append(&self, report: &RunReport) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open log file: {}", self.log_path.display()))?;

        let json = serde_json::to_string(report).context("Failed to serialize run report to JSON")?;

        writeln!(file, "{json}").context("Failed to write to log file")?;

        Ok(())
    }

    /// Read all run reports from the log, oldest first
    pub fn read_all(&self) -> Result<Vec<RunReport>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.log_path)
            .with_context(|| format!("Failed to read log file: {}", self.log_path.display()))?;

        let mut reports = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let report: RunReport = serde_json::from_str(line)
                .with_context(|| format!("Failed to parse line {} as JSON", line_num + 1))?;

            reports.push(report);
        }

        Ok(reports)
    }

    /// Get the path to the log file
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
