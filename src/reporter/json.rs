//! JSON reporter for machine-readable run summaries

use crate::loader::InputFailure;
use crate::Report;
use serde::Serialize;
use std::path::Path;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Summary of one run: where the page went, totals, and skipped inputs
    pub fn report(&self, report: &Report, output: &Path, failures: &[InputFailure]) -> String {
        let counts = report.counts();
        let summary = JsonSummary {
            output: output.display().to_string(),
            title: report.title(),
            generated_at: report.generated_at().to_rfc3339(),
            suites: report.suites().len(),
            tests: counts.total(),
            passed: counts.passed,
            failed: counts.failed,
            errors: counts.error,
            skipped: counts.skipped,
            duration: report.duration(),
            skipped_inputs: failures
                .iter()
                .map(|f| JsonInputFailure {
                    path: f.path.display().to_string(),
                    reason: &f.reason,
                })
                .collect(),
        };

        if self.pretty {
            serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary<'a> {
    output: String,
    title: &'a str,
    generated_at: String,
    suites: usize,
    tests: usize,
    passed: usize,
    failed: usize,
    errors: usize,
    skipped: usize,
    duration: f64,
    skipped_inputs: Vec<JsonInputFailure<'a>>,
}

#[derive(Serialize)]
struct JsonInputFailure<'a> {
    path: String,
    reason: &'a str,
}
