//! JUnit XML adapter built on the quick-xml event reader.
//!
//! Accepts `<testsuites>` documents, bare `<testsuite>` documents and nested
//! suites. Each `<testsuite>` element becomes its own [`ParsedSuite`], emitted
//! in the order its start tag appears.

use super::{ParseError, ParsedSuite, ResultParser, DEFAULT_CLASSNAME};
use crate::{Status, TestCaseRecord};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

const TAG_TEST_SUITES: &[u8] = b"testsuites";
const TAG_TEST_SUITE: &[u8] = b"testsuite";
const TAG_TEST_CASE: &[u8] = b"testcase";
const TAG_FAILURE: &[u8] = b"failure";
const TAG_ERROR: &[u8] = b"error";
const TAG_SKIPPED: &[u8] = b"skipped";

/// Parser for JUnit / xUnit style XML reports
#[derive(Debug, Clone, Copy, Default)]
pub struct JunitXmlParser;

impl JunitXmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl ResultParser for JunitXmlParser {
    fn parse(&self, bytes: &[u8], source: &str) -> Result<Vec<ParsedSuite>, ParseError> {
        let mut reader = Reader::from_reader(bytes);

        let mut state = ParseState::new(source);
        let mut buf = Vec::new();
        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| ParseError::Xml {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
            let position = reader.buffer_position() as u64;
            match event {
                Event::Eof => break,
                Event::Start(e) => state.open(&e, position)?,
                Event::Empty(e) => {
                    state.open(&e, position)?;
                    state.close(e.local_name().as_ref());
                }
                Event::End(e) => state.close(e.local_name().as_ref()),
                Event::Text(t) => {
                    if state.capturing() {
                        let text = t.unescape().map_err(|e| ParseError::Xml {
                            position,
                            message: e.to_string(),
                        })?;
                        state.push_text(&text);
                    }
                }
                Event::CData(c) => {
                    if state.capturing() {
                        state.push_text(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                _ => {}
            }
            buf.clear();
        }

        let suites = state.finish()?;
        debug!(
            source,
            suites = suites.len(),
            cases = suites.iter().map(ParsedSuite::case_count).sum::<usize>(),
            "parsed junit document"
        );
        Ok(suites)
    }
}

/// First `<failure>`, `<error>` or `<skipped>` child of a test case
#[derive(Debug)]
struct ResultDraft {
    status: Status,
    message: Option<String>,
    text: String,
}

#[derive(Debug)]
struct CaseDraft {
    name: String,
    classname: String,
    duration: f64,
    status_attr: Option<String>,
    result: Option<ResultDraft>,
}

impl CaseDraft {
    fn into_record(self) -> TestCaseRecord {
        let record = match self.result {
            Some(result) => {
                let mut record = TestCaseRecord::new(self.name, self.classname, result.status);
                record.message = result.message.filter(|m| !m.trim().is_empty());
                let detail = result.text.trim();
                if !detail.is_empty() {
                    record.detail = Some(detail.to_string());
                }
                record
            }
            None => {
                let status = self
                    .status_attr
                    .as_deref()
                    .map(Status::from_label)
                    .unwrap_or(Status::Passed);
                TestCaseRecord::new(self.name, self.classname, status)
            }
        };
        record.with_duration(self.duration)
    }
}

#[derive(Debug)]
struct SuiteDraft {
    slot: usize,
    name: String,
    cases: Vec<TestCaseRecord>,
}

struct ParseState<'a> {
    source: &'a str,
    seen_root: bool,
    slots: Vec<Option<ParsedSuite>>,
    suites: Vec<SuiteDraft>,
    orphans: Option<SuiteDraft>,
    case: Option<CaseDraft>,
    /// Depth inside `<testcase>` elements nested in the open case
    skip_depth: usize,
    capturing: bool,
}

impl<'a> ParseState<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            seen_root: false,
            slots: Vec::new(),
            suites: Vec::new(),
            orphans: None,
            case: None,
            skip_depth: 0,
            capturing: false,
        }
    }

    fn capturing(&self) -> bool {
        self.capturing && self.skip_depth == 0
    }

    fn open(&mut self, e: &BytesStart, position: u64) -> Result<(), ParseError> {
        let local = e.local_name();
        if self.skip_depth > 0 {
            if local.as_ref() == TAG_TEST_CASE {
                self.skip_depth += 1;
            }
            return Ok(());
        }
        match local.as_ref() {
            TAG_TEST_SUITES => self.seen_root = true,
            TAG_TEST_SUITE => {
                self.seen_root = true;
                let name = attribute(e, b"name", position)?
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| self.source.to_string());
                let slot = self.reserve_slot();
                self.suites.push(SuiteDraft {
                    slot,
                    name,
                    cases: Vec::new(),
                });
            }
            TAG_TEST_CASE => {
                if self.case.is_some() {
                    debug!(source = self.source, "ignoring nested <testcase>");
                    self.skip_depth = 1;
                    return Ok(());
                }
                let name = attribute(e, b"name", position)?.unwrap_or_default();
                let classname = attribute(e, b"classname", position)?
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_CLASSNAME.to_string());
                let duration = attribute(e, b"time", position)?
                    .map(|t| parse_duration(&t))
                    .unwrap_or(0.0);
                let status_attr = attribute(e, b"status", position)?;
                self.case = Some(CaseDraft {
                    name,
                    classname,
                    duration,
                    status_attr,
                    result: None,
                });
            }
            tag @ (TAG_FAILURE | TAG_ERROR | TAG_SKIPPED) => {
                let message = attribute(e, b"message", position)?;
                if let Some(case) = self.case.as_mut() {
                    if case.result.is_none() {
                        let status = match tag {
                            TAG_FAILURE => Status::Failed,
                            TAG_ERROR => Status::Error,
                            _ => Status::Skipped,
                        };
                        case.result = Some(ResultDraft {
                            status,
                            message,
                            text: String::new(),
                        });
                        self.capturing = true;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, tag: &[u8]) {
        if self.skip_depth > 0 {
            if tag == TAG_TEST_CASE {
                self.skip_depth -= 1;
            }
            return;
        }
        match tag {
            TAG_TEST_SUITE => {
                if let Some(draft) = self.suites.pop() {
                    self.slots[draft.slot] = Some(ParsedSuite::from_cases(draft.name, draft.cases));
                }
            }
            TAG_TEST_CASE => {
                if let Some(case) = self.case.take() {
                    let record = case.into_record();
                    self.current_suite().cases.push(record);
                }
                self.capturing = false;
            }
            TAG_FAILURE | TAG_ERROR | TAG_SKIPPED => self.capturing = false,
            _ => {}
        }
    }

    /// Text and CDATA chunks are kept verbatim; the whole body is trimmed
    /// once when the case is finalized
    fn push_text(&mut self, text: &str) {
        if let Some(result) = self.case.as_mut().and_then(|c| c.result.as_mut()) {
            result.text.push_str(text);
        }
    }

    fn reserve_slot(&mut self) -> usize {
        self.slots.push(None);
        self.slots.len() - 1
    }

    /// Innermost open suite, or the fallback suite for cases outside any suite
    fn current_suite(&mut self) -> &mut SuiteDraft {
        if !self.suites.is_empty() {
            let last = self.suites.len() - 1;
            return &mut self.suites[last];
        }
        let slots = &mut self.slots;
        let source = self.source;
        self.orphans.get_or_insert_with(|| {
            slots.push(None);
            SuiteDraft {
                slot: slots.len() - 1,
                name: source.to_string(),
                cases: Vec::new(),
            }
        })
    }

    fn finish(mut self) -> Result<Vec<ParsedSuite>, ParseError> {
        if self.case.is_some() {
            return Err(ParseError::Truncated("testcase".into()));
        }
        if !self.suites.is_empty() {
            return Err(ParseError::Truncated("testsuite".into()));
        }
        if let Some(draft) = self.orphans.take() {
            self.slots[draft.slot] = Some(ParsedSuite::from_cases(draft.name, draft.cases));
        } else if !self.seen_root {
            return Err(ParseError::NotJunit);
        }
        Ok(self.slots.into_iter().flatten().collect())
    }
}

fn attribute(e: &BytesStart, key: &[u8], position: u64) -> Result<Option<String>, ParseError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::Xml {
            position,
            message: err.to_string(),
        })?;
        if attr.key.local_name().as_ref() == key {
            let value = attr.unescape_value().map_err(|err| ParseError::Xml {
                position,
                message: err.to_string(),
            })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Seconds from a `time` attribute; garbage and negatives become zero
fn parse_duration(raw: &str) -> f64 {
    raw.trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Result<Vec<ParsedSuite>, ParseError> {
        JunitXmlParser::new().parse(xml.as_bytes(), "report.xml")
    }

    #[test]
    fn parses_testsuites_root() {
        let suites = parse(
            r#"<?xml version="1.0"?>
<testsuites>
  <testsuite name="Login" tests="2">
    <testcase name="test_ok" classname="LoginTest" time="0.12"/>
    <testcase name="test_bad" classname="LoginTest" time="0.05">
      <failure message="assertion failed">Traceback line 1
line 2</failure>
    </testcase>
  </testsuite>
</testsuites>"#,
        )
        .unwrap();
        assert_eq!(suites.len(), 1);
        let suite = &suites[0];
        assert_eq!(suite.name, "Login");
        assert_eq!(suite.classes.len(), 1);
        let cases = &suite.classes[0].cases;
        assert_eq!(cases[0].status, Status::Passed);
        assert_eq!(cases[0].duration, 0.12);
        assert_eq!(cases[1].status, Status::Failed);
        assert_eq!(cases[1].message.as_deref(), Some("assertion failed"));
        assert_eq!(cases[1].detail.as_deref(), Some("Traceback line 1\nline 2"));
    }

    #[test]
    fn parses_bare_testsuite_root() {
        let suites = parse(r#"<testsuite name="Solo"><testcase name="a" classname="A"/></testsuite>"#)
            .unwrap();
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].name, "Solo");
    }

    #[test]
    fn first_result_element_wins() {
        let suites = parse(
            r#"<testsuite name="S">
  <testcase name="t" classname="C">
    <error message="boom" type="RuntimeError">stack</error>
    <failure message="later"/>
  </testcase>
</testsuite>"#,
        )
        .unwrap();
        let case = &suites[0].classes[0].cases[0];
        assert_eq!(case.status, Status::Error);
        assert_eq!(case.message.as_deref(), Some("boom"));
        assert_eq!(case.detail.as_deref(), Some("stack"));
    }

    #[test]
    fn skipped_without_text_has_no_detail() {
        let suites = parse(
            r#"<testsuite name="S"><testcase name="t" classname="C"><skipped/></testcase></testsuite>"#,
        )
        .unwrap();
        let case = &suites[0].classes[0].cases[0];
        assert_eq!(case.status, Status::Skipped);
        assert!(case.message.is_none());
        assert!(case.detail.is_none());
        assert!(!case.has_details());
    }

    #[test]
    fn cdata_and_entities_are_decoded() {
        let suites = parse(
            r#"<testsuite name="S"><testcase name="a &amp; b" classname="C"><failure message="x &lt; y"><![CDATA[</script><b>raw</b>]]></failure></testcase></testsuite>"#,
        )
        .unwrap();
        let case = &suites[0].classes[0].cases[0];
        assert_eq!(case.name, "a & b");
        assert_eq!(case.message.as_deref(), Some("x < y"));
        assert_eq!(case.detail.as_deref(), Some("</script><b>raw</b>"));
    }

    #[test]
    fn mixed_text_and_cdata_keep_spacing() {
        let suites = parse(
            r#"<testsuite name="S"><testcase name="t" classname="C"><failure>
  expected <![CDATA[<a>]]> got b
</failure></testcase></testsuite>"#,
        )
        .unwrap();
        let case = &suites[0].classes[0].cases[0];
        assert_eq!(case.detail.as_deref(), Some("expected <a> got b"));
    }

    #[test]
    fn nested_testcase_does_not_close_outer_case() {
        let suites = parse(
            r#"<testsuite name="S">
  <testcase name="outer" classname="C">
    <testcase name="inner" classname="C"><error message="inner"/></testcase>
    <failure message="boom">trace</failure>
  </testcase>
  <testcase name="after" classname="C"/>
</testsuite>"#,
        )
        .unwrap();
        let cases: Vec<_> = suites[0].classes[0]
            .cases
            .iter()
            .map(|c| (c.name.as_str(), c.status))
            .collect();
        assert_eq!(cases, vec![("outer", Status::Failed), ("after", Status::Passed)]);
        let outer = &suites[0].classes[0].cases[0];
        assert_eq!(outer.message.as_deref(), Some("boom"));
        assert_eq!(outer.detail.as_deref(), Some("trace"));
    }

    #[test]
    fn unknown_status_attribute_maps_to_error() {
        let suites = parse(
            r#"<testsuite name="S">
  <testcase name="a" classname="C" status="run"/>
  <testcase name="b" classname="C" status="weird"/>
</testsuite>"#,
        )
        .unwrap();
        let cases = &suites[0].classes[0].cases;
        assert_eq!(cases[0].status, Status::Passed);
        assert_eq!(cases[1].status, Status::Error);
    }

    #[test]
    fn missing_names_fall_back() {
        let suites = parse(r#"<testsuite><testcase name="a"/></testsuite>"#).unwrap();
        assert_eq!(suites[0].name, "report.xml");
        assert_eq!(suites[0].classes[0].classname, DEFAULT_CLASSNAME);
        assert_eq!(suites[0].classes[0].cases[0].classname, DEFAULT_CLASSNAME);
    }

    #[test]
    fn nested_suites_emitted_in_start_order() {
        let suites = parse(
            r#"<testsuites>
  <testsuite name="outer">
    <testcase name="o1" classname="O"/>
    <testsuite name="inner">
      <testcase name="i1" classname="I"/>
    </testsuite>
  </testsuite>
</testsuites>"#,
        )
        .unwrap();
        let names: Vec<_> = suites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["outer", "inner"]);
        assert_eq!(suites[0].case_count(), 1);
        assert_eq!(suites[1].case_count(), 1);
    }

    #[test]
    fn bad_time_values_become_zero() {
        assert_eq!(parse_duration("abc"), 0.0);
        assert_eq!(parse_duration("-3"), 0.0);
        assert_eq!(parse_duration("1,234.5"), 1234.5);
        assert_eq!(parse_duration(" 0.5 "), 0.5);
        assert_eq!(parse_duration("inf"), 0.0);
    }

    #[test]
    fn empty_suite_is_kept_by_parser() {
        let suites = parse(r#"<testsuites><testsuite name="Empty" tests="0"/></testsuites>"#).unwrap();
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].case_count(), 0);
    }

    #[test]
    fn mismatched_tags_are_rejected() {
        let err = parse(r#"<testsuite name="S"><testcase name="a"></testsuite>"#).unwrap_err();
        assert!(matches!(err, ParseError::Xml { .. }));
    }

    #[test]
    fn truncated_document_is_rejected() {
        let err = parse(r#"<testsuite name="S"><testcase name="a"/>"#).unwrap_err();
        assert!(matches!(err, ParseError::Truncated(_) | ParseError::Xml { .. }));
    }

    #[test]
    fn non_junit_document_is_rejected() {
        assert!(matches!(parse("<html><body/></html>"), Err(ParseError::NotJunit)));
        assert!(matches!(parse("hello world"), Err(ParseError::NotJunit)));
        assert!(matches!(parse(""), Err(ParseError::NotJunit)));
    }
}
