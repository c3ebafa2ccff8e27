//! Compact report encoding for embedding inside a `<script>` element.
//!
//! Layout (version 1):
//!
//! ```text
//! {"v":1,"title":..,"generatedAt":..,"totals":[p,f,e,s,dur],
//!  "suites":[{"n":..,"a":[p,f,e,s,dur],
//!             "classes":[{"n":..,"a":[..],"cases":[[name,code,dur,msg,detail],..]}]}]}
//! ```
//!
//! Status codes: 0 passed, 1 failed, 2 error, 3 skipped.

use crate::{ClassNode, Report, Status, StatusCounts, SuiteNode, TestCaseRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FORMAT_VERSION: u32 = 1;

/// Marker preceding the blob in rendered pages
pub const SCRIPT_PREFIX: &str = "const REPORT=";

type Aggregate = (usize, usize, usize, usize, f64);
type CaseTuple<S> = (S, u8, f64, Option<S>, Option<S>);

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no embedded report data found")]
    MissingData,

    #[error("invalid report data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported report data version {0}")]
    UnsupportedVersion(u32),

    #[error("unknown status code {0}")]
    UnknownStatus(u8),

    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("aggregate mismatch in {0}")]
    AggregateMismatch(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncReport<'a> {
    v: u32,
    title: &'a str,
    generated_at: String,
    totals: Aggregate,
    suites: Vec<EncSuite<'a>>,
}

#[derive(Serialize)]
struct EncSuite<'a> {
    n: &'a str,
    a: Aggregate,
    classes: Vec<EncClass<'a>>,
}

#[derive(Serialize)]
struct EncClass<'a> {
    n: &'a str,
    a: Aggregate,
    cases: Vec<CaseTuple<&'a str>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecReport {
    v: u32,
    title: String,
    generated_at: String,
    totals: Aggregate,
    suites: Vec<DecSuite>,
}

#[derive(Deserialize)]
struct DecSuite {
    n: String,
    a: Aggregate,
    classes: Vec<DecClass>,
}

#[derive(Deserialize)]
struct DecClass {
    n: String,
    a: Aggregate,
    cases: Vec<CaseTuple<String>>,
}

fn aggregate(counts: StatusCounts, duration: f64) -> Aggregate {
    (
        counts.passed,
        counts.failed,
        counts.error,
        counts.skipped,
        duration,
    )
}

/// Rewrite characters that could end a `<script>` element or break a JS
/// parse as `\uXXXX` escapes. Only valid on JSON text, where they can only
/// occur inside string literals.
pub fn escape_for_script(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        match ch {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

/// Encode the report as a single-line, script-safe JS literal
pub fn serialize(report: &Report) -> Result<String, serde_json::Error> {
    let enc = EncReport {
        v: FORMAT_VERSION,
        title: report.title(),
        generated_at: report
            .generated_at()
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        totals: aggregate(report.counts(), report.duration()),
        suites: report
            .suites()
            .iter()
            .map(|suite| EncSuite {
                n: suite.name(),
                a: aggregate(suite.counts(), suite.duration()),
                classes: suite
                    .classes()
                    .iter()
                    .map(|class| EncClass {
                        n: class.classname(),
                        a: aggregate(class.counts(), class.duration()),
                        cases: class
                            .cases()
                            .iter()
                            .map(|c| {
                                (
                                    c.name.as_str(),
                                    c.status.code(),
                                    c.duration,
                                    c.message.as_deref(),
                                    c.detail.as_deref(),
                                )
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
    };
    let json = serde_json::to_string(&enc)?;
    Ok(escape_for_script(&json))
}

fn check(what: &str, expected: Aggregate, counts: StatusCounts, duration: f64) -> Result<(), DecodeError> {
    if expected == aggregate(counts, duration) {
        Ok(())
    } else {
        Err(DecodeError::AggregateMismatch(what.to_string()))
    }
}

/// Decode a blob produced by [`serialize`] back into a report
pub fn deserialize(blob: &str) -> Result<Report, DecodeError> {
    let dec: DecReport = serde_json::from_str(blob)?;
    if dec.v != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(dec.v));
    }
    let generated_at = DateTime::parse_from_rfc3339(&dec.generated_at)?.with_timezone(&Utc);

    let mut suites = Vec::with_capacity(dec.suites.len());
    for suite in dec.suites {
        let mut classes = Vec::with_capacity(suite.classes.len());
        for class in suite.classes {
            let mut cases = Vec::with_capacity(class.cases.len());
            for (name, code, duration, message, detail) in class.cases {
                let status = Status::from_code(code).ok_or(DecodeError::UnknownStatus(code))?;
                let mut record = TestCaseRecord::new(name, class.n.clone(), status);
                record.duration = duration;
                record.message = message;
                record.detail = detail;
                cases.push(record);
            }
            let node = ClassNode::from_cases(class.n, cases);
            check(node.classname(), class.a, node.counts(), node.duration())?;
            classes.push(node);
        }
        let node = SuiteNode::from_classes(suite.n, classes);
        check(node.name(), suite.a, node.counts(), node.duration())?;
        suites.push(node);
    }
    let report = Report::from_suites(dec.title, generated_at, suites);
    check("totals", dec.totals, report.counts(), report.duration())?;
    Ok(report)
}

/// Find the embedded blob in a rendered page and decode it
pub fn extract_from_html(html: &str) -> Result<Report, DecodeError> {
    // Escaped page text can never contain a raw `<script>` tag
    let marker = format!("<script>\n{SCRIPT_PREFIX}");
    let start = html.find(&marker).ok_or(DecodeError::MissingData)? + marker.len();
    let rest = &html[start..];
    let line = rest.split('\n').next().unwrap_or(rest);
    let blob = line.trim_end().trim_end_matches(';');
    deserialize(blob)
}
