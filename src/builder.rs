//! Hierarchy builder: merges parsed files into one Suite → Class → Case tree

use crate::parser::ParsedSuite;
use crate::{ClassNode, Report, SuiteNode, TestCaseRecord, DEFAULT_TITLE};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Everything parsed out of one input file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub source: PathBuf,
    pub suites: Vec<ParsedSuite>,
}

impl ParsedFile {
    pub fn new(source: impl Into<PathBuf>, suites: Vec<ParsedSuite>) -> Self {
        Self {
            source: source.into(),
            suites,
        }
    }

    pub fn case_count(&self) -> usize {
        self.suites.iter().map(ParsedSuite::case_count).sum()
    }
}

#[derive(Debug, Default)]
struct SuiteAcc {
    name: String,
    classes: Vec<(String, Vec<TestCaseRecord>)>,
    class_index: HashMap<String, usize>,
}

impl SuiteAcc {
    fn push_cases(&mut self, classname: &str, cases: Vec<TestCaseRecord>) {
        let idx = match self.class_index.get(classname) {
            Some(&idx) => idx,
            None => {
                self.classes.push((classname.to_string(), Vec::new()));
                self.class_index
                    .insert(classname.to_string(), self.classes.len() - 1);
                self.classes.len() - 1
            }
        };
        self.classes[idx].1.extend(cases);
    }
}

/// Accumulates parsed files in order, then aggregates once in [`build`].
///
/// [`build`]: ReportBuilder::build
#[derive(Debug)]
pub struct ReportBuilder {
    title: String,
    generated_at: DateTime<Utc>,
    suites: Vec<SuiteAcc>,
    suite_index: HashMap<String, usize>,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            generated_at: Utc::now(),
            suites: Vec::new(),
            suite_index: HashMap::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    /// Merge one file's suites. Same-named suites and classes are combined,
    /// appending to whatever earlier files contributed.
    pub fn add_file(&mut self, file: ParsedFile) -> &mut Self {
        debug!(
            source = %file.source.display(),
            cases = file.case_count(),
            "merging file"
        );
        self.add_suites(file.suites)
    }

    pub fn add_suites(&mut self, suites: Vec<ParsedSuite>) -> &mut Self {
        for suite in suites {
            let idx = match self.suite_index.get(&suite.name) {
                Some(&idx) => idx,
                None => {
                    self.suites.push(SuiteAcc {
                        name: suite.name.clone(),
                        ..SuiteAcc::default()
                    });
                    self.suite_index
                        .insert(suite.name.clone(), self.suites.len() - 1);
                    self.suites.len() - 1
                }
            };
            let acc = &mut self.suites[idx];
            for class in suite.classes {
                acc.push_cases(&class.classname, class.cases);
            }
        }
        self
    }

    /// Aggregate bottom-up and freeze the tree. Classes and suites without
    /// any test case are dropped.
    pub fn build(self) -> Report {
        let suites: Vec<SuiteNode> = self
            .suites
            .into_iter()
            .filter_map(|acc| {
                let classes: Vec<ClassNode> = acc
                    .classes
                    .into_iter()
                    .filter(|(_, cases)| !cases.is_empty())
                    .map(|(classname, cases)| ClassNode::from_cases(classname, cases))
                    .collect();
                if classes.is_empty() {
                    debug!(suite = %acc.name, "dropping empty suite");
                    None
                } else {
                    Some(SuiteNode::from_classes(acc.name, classes))
                }
            })
            .collect();
        Report::from_suites(self.title, self.generated_at, suites)
    }
}

/// Build a report with default title from a sequence of parsed files
pub fn build(files: impl IntoIterator<Item = ParsedFile>) -> Report {
    let mut builder = ReportBuilder::new();
    for file in files {
        builder.add_file(file);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;

    fn case(name: &str, classname: &str, status: Status, secs: f64) -> TestCaseRecord {
        TestCaseRecord::new(name, classname, status).with_duration(secs)
    }

    fn login_file() -> ParsedFile {
        ParsedFile::new(
            "login.xml",
            vec![ParsedSuite::from_cases(
                "Login",
                vec![
                    case("test_ok", "LoginTest", Status::Passed, 0.12),
                    case("test_bad", "LoginTest", Status::Failed, 0.05)
                        .with_message("assertion failed"),
                    case("test_skip", "LoginTest", Status::Skipped, 0.0),
                ],
            )],
        )
    }

    #[test]
    fn test_login_scenario() {
        let report = build(vec![login_file()]);
        assert_eq!(report.suites().len(), 1);
        let suite = report.suite("Login").unwrap();
        assert_eq!(suite.classes().len(), 1);
        let class = suite.class("LoginTest").unwrap();
        assert_eq!(class.cases().len(), 3);

        let counts = report.counts();
        assert_eq!(counts.passed, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.error, 0);
        assert!((report.duration() - 0.17).abs() < 1e-9);
        assert_eq!(report.title(), DEFAULT_TITLE);
    }

    #[test]
    fn test_same_suite_merged_in_file_order() {
        let a = ParsedFile::new(
            "a.xml",
            vec![ParsedSuite::from_cases(
                "S",
                vec![case("a1", "A", Status::Passed, 1.0)],
            )],
        );
        let b = ParsedFile::new(
            "b.xml",
            vec![ParsedSuite::from_cases(
                "S",
                vec![
                    case("b1", "B", Status::Failed, 2.0),
                    case("a2", "A", Status::Passed, 0.5),
                ],
            )],
        );
        let report = build(vec![a, b]);
        assert_eq!(report.suites().len(), 1);
        let suite = &report.suites()[0];
        let classes: Vec<_> = suite.classes().iter().map(|c| c.classname()).collect();
        assert_eq!(classes, vec!["A", "B"]);
        let a_cases: Vec<_> = suite.classes()[0]
            .cases()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(a_cases, vec!["a1", "a2"]);
        assert_eq!(suite.counts().total(), 3);
        assert_eq!(suite.duration(), 3.5);
    }

    #[test]
    fn test_suite_order_is_first_encountered() {
        let a = ParsedFile::new(
            "a.xml",
            vec![
                ParsedSuite::from_cases("Z", vec![case("z", "C", Status::Passed, 0.0)]),
                ParsedSuite::from_cases("A", vec![case("a", "C", Status::Passed, 0.0)]),
            ],
        );
        let b = ParsedFile::new(
            "b.xml",
            vec![
                ParsedSuite::from_cases("M", vec![case("m", "C", Status::Passed, 0.0)]),
                ParsedSuite::from_cases("Z", vec![case("z2", "C", Status::Passed, 0.0)]),
            ],
        );
        let report = build(vec![a, b]);
        let names: Vec<_> = report.suites().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Z", "A", "M"]);
    }

    #[test]
    fn test_empty_input_yields_empty_report() {
        let report = build(Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.test_count(), 0);
        assert_eq!(report.duration(), 0.0);
    }

    #[test]
    fn test_empty_suites_dropped() {
        let file = ParsedFile::new(
            "e.xml",
            vec![
                ParsedSuite::from_cases("Empty", Vec::new()),
                ParsedSuite::from_cases("Full", vec![case("t", "C", Status::Passed, 0.0)]),
            ],
        );
        let report = build(vec![file]);
        let names: Vec<_> = report.suites().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Full"]);
    }

    #[test]
    fn test_builder_title_and_timestamp() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut builder = ReportBuilder::new().title("Nightly").generated_at(at);
        builder.add_file(login_file());
        let report = builder.build();
        assert_eq!(report.title(), "Nightly");
        assert_eq!(report.generated_at(), at);
    }
}
