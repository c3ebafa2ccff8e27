//! Parser module: turns raw result files into normalized records

pub mod junit;

pub use junit::JunitXmlParser;

use crate::TestCaseRecord;
use thiserror::Error;

/// Classname given to test cases that do not declare one
pub const DEFAULT_CLASSNAME: &str = "Default";

/// Errors produced while parsing a single input
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("not a JUnit report: no <testsuite> or <testsuites> element")]
    NotJunit,

    #[error("document ended inside <{0}>")]
    Truncated(String),
}

/// Test cases of one classname, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedClass {
    pub classname: String,
    pub cases: Vec<TestCaseRecord>,
}

/// A suite as found in one file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSuite {
    pub name: String,
    pub classes: Vec<ParsedClass>,
}

impl ParsedSuite {
    /// Group cases by classname, keeping first-encountered order for both
    /// classes and the cases inside them.
    pub fn from_cases(name: impl Into<String>, cases: Vec<TestCaseRecord>) -> Self {
        let mut classes: Vec<ParsedClass> = Vec::new();
        for case in cases {
            match classes.iter_mut().find(|c| c.classname == case.classname) {
                Some(class) => class.cases.push(case),
                None => classes.push(ParsedClass {
                    classname: case.classname.clone(),
                    cases: vec![case],
                }),
            }
        }
        Self {
            name: name.into(),
            classes,
        }
    }

    pub fn case_count(&self) -> usize {
        self.classes.iter().map(|c| c.cases.len()).sum()
    }
}

/// Capability interface for result-file parsers.
///
/// `source` is a display name for the input (used as a fallback suite name).
pub trait ResultParser {
    fn parse(&self, bytes: &[u8], source: &str) -> Result<Vec<ParsedSuite>, ParseError>;
}
