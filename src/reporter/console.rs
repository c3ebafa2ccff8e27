//! Console reporter with colored output

use super::format_duration;
use crate::view::{project, SortDirection, SortKey, StatusSet, ViewState};
use crate::{Report, Status};
use colored::{ColoredString, Colorize};
use std::path::Path;

/// Reporter for the terminal summary printed after a run
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to list failing tests
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Print the summary to stdout
    pub fn report(&self, report: &Report, output: &Path) {
        print!("{}", self.summary(report, output));
    }

    /// Summary text: output path, totals line, and in verbose mode every
    /// failed or errored test, most severe first
    pub fn summary(&self, report: &Report, output: &Path) -> String {
        let counts = report.counts();
        let mut out = String::new();
        out.push_str(&format!(
            "{} {}\n",
            self.paint("Wrote".bold()),
            output.display()
        ));
        out.push_str(&format!(
            "Suites: {}, Tests: {}, {}: {}, {}: {}, {}: {}, {}: {}, Time: {}\n",
            report.suites().len(),
            counts.total(),
            self.status_text("Passed", Status::Passed),
            counts.passed,
            self.status_text("Failed", Status::Failed),
            counts.failed,
            self.status_text("Errors", Status::Error),
            counts.error,
            self.status_text("Skipped", Status::Skipped),
            counts.skipped,
            format_duration(report.duration())
        ));

        if self.verbose && counts.has_problems() {
            out.push('\n');
            out.push_str(&format!("{}\n", self.paint("Problems:".bold())));
            let state = ViewState::default()
                .with_enabled(StatusSet::only(&[Status::Failed, Status::Error]))
                .sorted_by(SortKey::Status, SortDirection::Descending);
            let projection = project(report, &state);
            for (suite, class, case) in projection.cases(report) {
                out.push_str(&format!(
                    "  {:<5} {} › {} › {} ({})\n",
                    self.status_text(case.status.label(), case.status),
                    suite.name(),
                    class.classname(),
                    case.name,
                    format_duration(case.duration)
                ));
                if let Some(message) = case.message.as_deref().filter(|m| !m.is_empty()) {
                    let first = message.lines().next().unwrap_or(message);
                    out.push_str(&format!("        {}\n", self.paint(first.dimmed())));
                }
            }
        }
        out
    }

    fn status_text(&self, text: &str, status: Status) -> String {
        let colored = match status {
            Status::Passed => text.green(),
            Status::Failed => text.red(),
            Status::Error => text.red().bold(),
            Status::Skipped => text.yellow(),
        };
        self.paint(colored)
    }

    fn paint(&self, text: ColoredString) -> String {
        if self.use_colors {
            text.to_string()
        } else {
            text.clear().to_string()
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
