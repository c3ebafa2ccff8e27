//! junit2html: merge JUnit XML results into one self-contained HTML report
//!
//! The pipeline is: XML files are read by the [`loader`], turned into
//! normalized records by a [`parser::ResultParser`], merged into a
//! Suite → Class → Test-case [`Report`] by the [`builder`], and finally
//! rendered by the [`reporter`] into a single HTML document that carries
//! its own data, styles and interaction script.

pub mod builder;
pub mod config;
pub mod loader;
pub mod output;
pub mod parser;
pub mod reporter;
pub mod view;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Title used when neither the CLI nor the config file names the report
pub const DEFAULT_TITLE: &str = "JUnit Report";

/// Outcome of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Error,
    Skipped,
}

impl Status {
    /// All statuses in their canonical (serialization code) order
    pub const ALL: [Status; 4] = [Status::Passed, Status::Failed, Status::Error, Status::Skipped];

    /// Map a free-form status label onto the closed status set.
    ///
    /// Anything unrecognized is treated as an error so that a tool emitting an
    /// unexpected value never hides a broken test.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "passed" | "pass" | "success" | "ok" | "run" | "executed" => Status::Passed,
            "failed" | "failure" | "fail" => Status::Failed,
            "skipped" | "skip" | "ignored" | "disabled" | "notrun" | "pending" => Status::Skipped,
            _ => Status::Error,
        }
    }

    /// Compact code used in the embedded report data
    pub fn code(self) -> u8 {
        match self {
            Status::Passed => 0,
            Status::Failed => 1,
            Status::Error => 2,
            Status::Skipped => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Status::Passed),
            1 => Some(Status::Failed),
            2 => Some(Status::Error),
            3 => Some(Status::Skipped),
            _ => None,
        }
    }

    /// Severity rank: error > failed > skipped > passed
    pub fn severity(self) -> u8 {
        match self {
            Status::Passed => 0,
            Status::Skipped => 1,
            Status::Failed => 2,
            Status::Error => 3,
        }
    }

    /// Short upper-case label shown in the report
    pub fn label(self) -> &'static str {
        match self {
            Status::Passed => "PASS",
            Status::Failed => "FAIL",
            Status::Error => "ERROR",
            Status::Skipped => "SKIP",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Error => "error",
            Status::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-status tally of test cases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub passed: usize,
    pub failed: usize,
    pub error: usize,
    pub skipped: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Passed => self.passed += 1,
            Status::Failed => self.failed += 1,
            Status::Error => self.error += 1,
            Status::Skipped => self.skipped += 1,
        }
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Passed => self.passed,
            Status::Failed => self.failed,
            Status::Error => self.error,
            Status::Skipped => self.skipped,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.error + self.skipped
    }

    /// True when at least one case failed or errored
    pub fn has_problems(&self) -> bool {
        self.failed + self.error > 0
    }

    /// Most severe status present, if any case was counted
    pub fn worst(&self) -> Option<Status> {
        [Status::Error, Status::Failed, Status::Skipped, Status::Passed]
            .into_iter()
            .find(|s| self.get(*s) > 0)
    }
}

impl AddAssign for StatusCounts {
    fn add_assign(&mut self, other: Self) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.error += other.error;
        self.skipped += other.skipped;
    }
}

/// A single test case as read from the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseRecord {
    pub name: String,
    pub classname: String,
    /// Wall time in seconds, never negative
    pub duration: f64,
    pub status: Status,
    pub message: Option<String>,
    /// Stack trace or failure text
    pub detail: Option<String>,
}

impl TestCaseRecord {
    pub fn new(name: impl Into<String>, classname: impl Into<String>, status: Status) -> Self {
        Self {
            name: name.into(),
            classname: classname.into(),
            duration: 0.0,
            status,
            message: None,
            detail: None,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = if seconds.is_finite() && seconds > 0.0 {
            seconds
        } else {
            0.0
        };
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Whether the row has anything to expand
    pub fn has_details(&self) -> bool {
        self.message.as_deref().is_some_and(|m| !m.is_empty())
            || self.detail.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// Test cases sharing a classname within one suite.
///
/// Aggregates are computed once on construction and are read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassNode {
    classname: String,
    cases: Vec<TestCaseRecord>,
    counts: StatusCounts,
    duration: f64,
}

impl ClassNode {
    pub(crate) fn from_cases(classname: String, cases: Vec<TestCaseRecord>) -> Self {
        let mut counts = StatusCounts::default();
        let mut duration = 0.0;
        for case in &cases {
            counts.record(case.status);
            duration += case.duration;
        }
        Self {
            classname,
            cases,
            counts,
            duration,
        }
    }

    pub fn classname(&self) -> &str {
        &self.classname
    }

    pub fn cases(&self) -> &[TestCaseRecord] {
        &self.cases
    }

    pub fn counts(&self) -> StatusCounts {
        self.counts
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}

/// A named suite and its classes
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteNode {
    name: String,
    classes: Vec<ClassNode>,
    counts: StatusCounts,
    duration: f64,
}

impl SuiteNode {
    pub(crate) fn from_classes(name: String, classes: Vec<ClassNode>) -> Self {
        let mut counts = StatusCounts::default();
        let mut duration = 0.0;
        for class in &classes {
            counts += class.counts;
            duration += class.duration;
        }
        Self {
            name,
            classes,
            counts,
            duration,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classes(&self) -> &[ClassNode] {
        &self.classes
    }

    pub fn class(&self, classname: &str) -> Option<&ClassNode> {
        self.classes.iter().find(|c| c.classname == classname)
    }

    pub fn counts(&self) -> StatusCounts {
        self.counts
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}

/// The merged, read-only result of one run
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    title: String,
    generated_at: DateTime<Utc>,
    suites: Vec<SuiteNode>,
    counts: StatusCounts,
    duration: f64,
}

impl Report {
    pub(crate) fn from_suites(
        title: String,
        generated_at: DateTime<Utc>,
        suites: Vec<SuiteNode>,
    ) -> Self {
        let mut counts = StatusCounts::default();
        let mut duration = 0.0;
        for suite in &suites {
            counts += suite.counts;
            duration += suite.duration;
        }
        Self {
            title,
            generated_at,
            suites,
            counts,
            duration,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn suites(&self) -> &[SuiteNode] {
        &self.suites
    }

    pub fn suite(&self, name: &str) -> Option<&SuiteNode> {
        self.suites.iter().find(|s| s.name == name)
    }

    pub fn counts(&self) -> StatusCounts {
        self.counts
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn test_count(&self) -> usize {
        self.counts.total()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Every test case in canonical order
    pub fn cases(&self) -> impl Iterator<Item = &TestCaseRecord> {
        self.suites
            .iter()
            .flat_map(|s| s.classes.iter())
            .flat_map(|c| c.cases.iter())
    }
}
