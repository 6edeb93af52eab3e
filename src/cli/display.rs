//! Rich CLI display for pipeline runs
//!
//! Renders step progress and the final run report as human-readable
//! terminal output. All output goes to stderr so stdout remains clean for
//! piping the JSON report.

use colored::Colorize;

use crate::pipeline::{RunObserver, RunReport, Step, StepOutcome, StepRecord};

/// Longest error detail shown inline before truncating
const MAX_DETAIL_CHARS: usize = 200;

/// Live display handler for one pipeline run
pub struct RunDisplay {
    total_steps: usize,
}

impl RunDisplay {
    /// Create a display for a run of `total_steps` steps
    #[must_use]
    pub const fn new(total_steps: usize) -> Self {
        Self { total_steps }
    }

    /// Print the run header before the first step
    pub fn print_header(&self, base_url: &str) {
        eprintln!(
            "\n{} {}",
            "===".bold().cyan(),
            format!("Workflow: {} step(s) against {base_url}", self.total_steps)
                .bold()
                .cyan()
        );
        eprintln!("{}", "─".repeat(50).dimmed());
    }
}

impl RunObserver for RunDisplay {
    fn step_started(&mut self, index: usize, step: &Step) {
        eprintln!(
            "  {} {} {}",
            "▶".blue(),
            format!("[{}/{}]", index + 1, self.total_steps).dimmed(),
            step.name().bold()
        );
    }

    fn step_finished(&mut self, _step: &Step, record: &StepRecord) {
        eprintln!("    {}", describe_record(record));
    }
}

/// One-line description of a finished step
fn describe_record(record: &StepRecord) -> String {
    match &record.outcome {
        StepOutcome::Ok { value } => format!(
            "{} {} {}",
            "✓".green().bold(),
            value,
            format!("({} ms)", record.elapsed_ms).dimmed()
        ),
        StepOutcome::Err { error } => {
            let status = error
                .status
                .map_or_else(String::new, |s| format!(" {s}"));
            // Cancelled and skipped steps never print a start line, so name
            // the step here.
            format!(
                "{} {} {}{}: {}",
                "✗".red().bold(),
                record.name.bold(),
                error.kind.as_str().red(),
                status.red(),
                truncate(&error.detail, MAX_DETAIL_CHARS)
            )
        }
    }
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`
fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Render the post-run summary
pub fn render_run_summary(report: &RunReport) {
    eprintln!("{}", "─".repeat(50).dimmed());

    let status = if report.succeeded() {
        "COMPLETED".green().bold().to_string()
    } else {
        "FAILED".red().bold().to_string()
    };
    eprintln!(
        "  {} {}/{} step(s) | {} ms",
        status,
        report.records().iter().filter(|r| r.outcome.is_ok()).count(),
        report.records().len(),
        report.total_elapsed_ms()
    );

    for (key, value) in report.values().iter() {
        eprintln!("  {} {key} = {value}", "•".dimmed());
    }

    if let Some(error) = report.failure() {
        eprintln!("  {} {}", "Cause:".dimmed(), error.to_string().red());
    }

    eprintln!();
}
