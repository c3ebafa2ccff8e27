//! View projection: which nodes are visible, and in what order, for a given
//! search query, status filter and sort.
//!
//! The embedded page script evaluates the same rules in the browser; this
//! module is the reference the console reporter and the tests use.

use crate::{ClassNode, Report, Status, StatusCounts, SuiteNode, TestCaseRecord};
use std::cmp::Ordering;

/// Set of enabled statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSet(u8);

impl StatusSet {
    pub fn all() -> Self {
        Self(0b1111)
    }

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn only(statuses: &[Status]) -> Self {
        let mut set = Self::empty();
        for status in statuses {
            set.insert(*status);
        }
        set
    }

    fn bit(status: Status) -> u8 {
        1 << status.code()
    }

    pub fn contains(&self, status: Status) -> bool {
        self.0 & Self::bit(status) != 0
    }

    pub fn insert(&mut self, status: Status) {
        self.0 |= Self::bit(status);
    }

    pub fn remove(&mut self, status: Status) {
        self.0 &= !Self::bit(status);
    }

    pub fn toggle(&mut self, status: Status) {
        self.0 ^= Self::bit(status);
    }
}

impl Default for StatusSet {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Status,
    Duration,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Transient UI state. `sort: None` means canonical order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub query: String,
    pub enabled: StatusSet,
    pub sort: Option<(SortKey, SortDirection)>,
}

impl ViewState {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_enabled(mut self, enabled: StatusSet) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn sorted_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort = Some((key, direction));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassView {
    /// Index into the suite's classes
    pub index: usize,
    /// Indices into the class's cases, in display order
    pub cases: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteView {
    pub index: usize,
    pub classes: Vec<ClassView>,
}

/// Visible nodes per level in display order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projection {
    pub suites: Vec<SuiteView>,
}

impl Projection {
    pub fn visible_cases(&self) -> usize {
        self.suites
            .iter()
            .flat_map(|s| s.classes.iter())
            .map(|c| c.cases.len())
            .sum()
    }

    /// Resolve the projection back to records, in display order
    pub fn cases<'r>(
        &'r self,
        report: &'r Report,
    ) -> impl Iterator<Item = (&'r SuiteNode, &'r ClassNode, &'r TestCaseRecord)> + 'r {
        self.suites.iter().flat_map(move |sv| {
            let suite = &report.suites()[sv.index];
            sv.classes.iter().flat_map(move |cv| {
                let class = &suite.classes()[cv.index];
                cv.cases
                    .iter()
                    .map(move |&i| (suite, class, &class.cases()[i]))
            })
        })
    }
}

fn matches_query(needle: &str, suite: &SuiteNode, case: &TestCaseRecord) -> bool {
    needle.is_empty()
        || case.name.to_lowercase().contains(needle)
        || case.classname.to_lowercase().contains(needle)
        || suite.name().to_lowercase().contains(needle)
}

/// Sort rank of an inner node: the worst status among its cases
fn node_severity(counts: StatusCounts) -> u8 {
    counts.worst().map(Status::severity).unwrap_or(0)
}

fn compare(key: SortKey, a: &SortFields, b: &SortFields) -> Ordering {
    match key {
        SortKey::Status => a.severity.cmp(&b.severity),
        SortKey::Duration => a.duration.total_cmp(&b.duration),
        SortKey::Name => a.name.cmp(&b.name),
    }
}

struct SortFields {
    severity: u8,
    duration: f64,
    name: String,
}

/// Order `items` by key and direction; equal keys keep ascending canonical
/// order in both directions. Without a sort, canonical order is restored.
fn order<T>(
    items: Vec<T>,
    sort: Option<(SortKey, SortDirection)>,
    index: impl Fn(&T) -> usize,
    fields: impl Fn(&T) -> SortFields,
) -> Vec<T> {
    let mut keyed: Vec<(SortFields, usize, T)> = items
        .into_iter()
        .map(|t| (fields(&t), index(&t), t))
        .collect();
    match sort {
        None => keyed.sort_by_key(|(_, idx, _)| *idx),
        Some((key, direction)) => keyed.sort_by(|(fa, ia, _), (fb, ib, _)| {
            let ord = match direction {
                SortDirection::Ascending => compare(key, fa, fb),
                SortDirection::Descending => compare(key, fb, fa),
            };
            ord.then(ia.cmp(ib))
        }),
    }
    keyed.into_iter().map(|(_, _, t)| t).collect()
}

/// Compute visibility and order for every level of the tree
pub fn project(report: &Report, state: &ViewState) -> Projection {
    let needle = state.query.trim().to_lowercase();
    let mut suites = Vec::new();

    for (si, suite) in report.suites().iter().enumerate() {
        let mut classes = Vec::new();
        for (ci, class) in suite.classes().iter().enumerate() {
            let cases: Vec<usize> = class
                .cases()
                .iter()
                .enumerate()
                .filter(|(_, case)| {
                    state.enabled.contains(case.status) && matches_query(&needle, suite, case)
                })
                .map(|(i, _)| i)
                .collect();
            if cases.is_empty() {
                continue;
            }
            let cases = order(
                cases,
                state.sort,
                |&i| i,
                |&i| {
                    let case = &class.cases()[i];
                    SortFields {
                        severity: case.status.severity(),
                        duration: case.duration,
                        name: case.name.to_lowercase(),
                    }
                },
            );
            classes.push(ClassView { index: ci, cases });
        }
        if classes.is_empty() {
            continue;
        }
        let classes = order(
            classes,
            state.sort,
            |c| c.index,
            |c| {
                let class = &suite.classes()[c.index];
                SortFields {
                    severity: node_severity(class.counts()),
                    duration: class.duration(),
                    name: class.classname().to_lowercase(),
                }
            },
        );
        suites.push(SuiteView { index: si, classes });
    }

    let suites = order(
        suites,
        state.sort,
        |s| s.index,
        |s| {
            let suite = &report.suites()[s.index];
            SortFields {
                severity: node_severity(suite.counts()),
                duration: suite.duration(),
                name: suite.name().to_lowercase(),
            }
        },
    );

    Projection { suites }
}
