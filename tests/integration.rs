//! Integration tests: full pipeline against tests/fixtures/

use junit2html::builder::{build, ReportBuilder};
use junit2html::loader::{expand_inputs, load_inputs, FailurePolicy};
use junit2html::parser::JunitXmlParser;
use junit2html::reporter::embed::extract_from_html;
use junit2html::reporter::html::render;
use junit2html::view::{project, StatusSet, ViewState};
use junit2html::{Report, Status};
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn load(names: &[&str]) -> Report {
    let inputs: Vec<String> = names.iter().map(|n| fixture(n)).collect();
    let (paths, failures) = expand_inputs(&inputs, None);
    let outcome = load_inputs(&paths, failures, &JunitXmlParser::new(), FailurePolicy::BestEffort)
        .unwrap_or_else(|e| panic!("load({:?}) failed: {}", names, e));
    build(outcome.files)
}

// --- Hierarchy ---

#[test]
fn login_sample_counts() {
    let report = load(&["login.xml"]);
    assert_eq!(report.suites().len(), 1);
    let suite = report.suite("Login").unwrap();
    assert_eq!(suite.classes().len(), 1);
    assert_eq!(suite.classes()[0].classname(), "LoginTest");

    let counts = report.counts();
    assert_eq!(
        (counts.passed, counts.failed, counts.error, counts.skipped),
        (1, 1, 0, 1)
    );
    assert!((report.duration() - 0.17).abs() < 1e-9);

    let bad = &suite.classes()[0].cases()[1];
    assert_eq!(bad.name, "test_bad");
    assert_eq!(bad.message.as_deref(), Some("assertion failed"));
    assert!(bad.detail.as_deref().unwrap().contains("AssertionError: assert 500 == 200"));

    let skip = &suite.classes()[0].cases()[2];
    assert_eq!(skip.status, Status::Skipped);
    assert_eq!(skip.message.as_deref(), Some("not on CI"));
}

#[test]
fn same_suite_across_files_is_merged_in_file_order() {
    let report = load(&["login.xml", "login_more.xml"]);
    let names: Vec<_> = report.suites().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["Login", "Payments"]);

    let login = report.suite("Login").unwrap();
    let classes: Vec<_> = login.classes().iter().map(|c| c.classname()).collect();
    assert_eq!(classes, vec!["LoginTest", "LogoutTest"]);
    let login_cases: Vec<_> = login.classes()[0]
        .cases()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(
        login_cases,
        vec!["test_ok", "test_bad", "test_skip", "test_remember_me"]
    );
    assert_eq!(login.counts().total(), 5);
    assert_eq!(report.test_count(), 7);
    assert_eq!(report.counts().error, 1);
}

#[test]
fn no_cases_lost_or_duplicated() {
    let single: usize = ["login.xml", "login_more.xml", "hostile.xml"]
        .iter()
        .map(|n| load(&[*n]).test_count())
        .sum();
    let merged = load(&["login.xml", "login_more.xml", "hostile.xml"]);
    assert_eq!(merged.test_count(), single);
    assert_eq!(merged.cases().count(), single);
}

#[test]
fn malformed_file_excluded_others_kept() {
    let report = load(&["login.xml", "malformed.xml", "login_more.xml"]);
    assert_eq!(report.test_count(), 7);
    assert!(report.suite("Broken").is_none());
}

#[test]
fn empty_suite_file_yields_empty_report() {
    let report = load(&["empty.xml"]);
    assert!(report.is_empty());
    assert_eq!(report.test_count(), 0);
    let html = render(&report).unwrap();
    assert!(html.contains("0 of 0 tests"));
}

// --- Rendering ---

#[test]
fn round_trip_through_rendered_page() {
    let report = load(&["login.xml", "login_more.xml", "hostile.xml"]);
    let decoded = extract_from_html(&render(&report).unwrap()).unwrap();
    assert_eq!(decoded, report);
}

#[test]
fn rendering_is_idempotent() {
    let report = load(&["login.xml", "login_more.xml"]);
    assert_eq!(render(&report).unwrap(), render(&report).unwrap());
}

#[test]
fn hostile_names_cannot_break_out_of_script() {
    let report = load(&["hostile.xml"]);
    let case = report.cases().next().unwrap();
    assert_eq!(case.name, "</script><script>alert(1)</script>");
    assert!(case.detail.as_deref().unwrap().contains('\u{2028}'));

    let html = render(&report).unwrap();
    assert_eq!(html.matches("<script").count(), 1);
    assert_eq!(html.matches("</script>").count(), 1);
    assert!(!html.contains('\u{2028}'));
    assert!(html.contains("&lt;/script&gt;&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(html.contains("Hostile &lt;suite&gt;"));
}

#[test]
fn page_is_self_contained() {
    let html = render(&load(&["login.xml", "login_more.xml"])).unwrap();
    for forbidden in ["http://", "https://", "<link", "src=", "@import", "url("] {
        assert!(!html.contains(forbidden), "found {}", forbidden);
    }
}

#[test]
fn sidebar_lists_every_merged_node() {
    let report = load(&["login.xml", "login_more.xml"]);
    let html = render(&report).unwrap();
    assert_eq!(html.matches("<li class=\"nav-suite\"").count(), report.suites().len());
    let classes: usize = report.suites().iter().map(|s| s.classes().len()).sum();
    assert_eq!(html.matches("<li class=\"nav-class\"").count(), classes);
    assert_eq!(html.matches("<li class=\"nav-case\"").count(), report.test_count());
    assert!(html.contains("<li class=\"nav-class\" data-s=\"0\" data-c=\"1\">"));
}

// --- View ---

#[test]
fn failed_filter_keeps_only_test_bad_and_ancestors() {
    let report = load(&["login.xml"]);
    let state = ViewState::default().with_enabled(StatusSet::only(&[Status::Failed]));
    let projection = project(&report, &state);
    let visible: Vec<_> = projection
        .cases(&report)
        .map(|(s, c, t)| format!("{}/{}/{}", s.name(), c.classname(), t.name))
        .collect();
    assert_eq!(visible, vec!["Login/LoginTest/test_bad"]);
}

#[test]
fn builder_title_is_rendered() {
    let inputs = vec![fixture("login.xml")];
    let (paths, failures) = expand_inputs(&inputs, None);
    let outcome =
        load_inputs(&paths, failures, &JunitXmlParser::new(), FailurePolicy::Strict).unwrap();
    let mut builder = ReportBuilder::new().title("Release 1.2");
    for file in outcome.files {
        builder.add_file(file);
    }
    let html = render(&builder.build()).unwrap();
    assert!(html.contains("<h1>Release 1.2</h1>"));
}
