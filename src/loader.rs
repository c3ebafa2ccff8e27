//! Input loader: expands paths and patterns, reads and parses each file

use crate::builder::ParsedFile;
use crate::config::is_ignored;
use crate::parser::ResultParser;
use globset::GlobSet;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// What to do when one input cannot be read or parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Skip the bad input, keep going, fail only when nothing loaded
    #[default]
    BestEffort,
    /// Abort on the first bad input
    Strict,
}

/// An input that was excluded from the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl InputFailure {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for InputFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Result of a load pass
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub files: Vec<ParsedFile>,
    pub failures: Vec<InputFailure>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no input files given")]
    NoInputs,

    #[error("{path}: {reason}")]
    Aborted { path: PathBuf, reason: String },

    #[error("none of the {attempted} input(s) could be loaded")]
    NothingLoaded {
        attempted: usize,
        failures: Vec<InputFailure>,
    },
}

impl From<InputFailure> for LoadError {
    fn from(failure: InputFailure) -> Self {
        LoadError::Aborted {
            path: failure.path,
            reason: failure.reason,
        }
    }
}

fn is_glob_pattern(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
}

/// Turn CLI arguments into concrete file paths.
///
/// Each argument is a glob pattern, a directory (walked for `*.xml`), or a
/// literal path. A pattern matching nothing is recorded as a failure; literal
/// paths are passed through so the read step can report them. Paths matched by
/// `ignore` are dropped. Duplicates keep their first position.
pub fn expand_inputs(
    patterns: &[String],
    ignore: Option<&GlobSet>,
) -> (Vec<PathBuf>, Vec<InputFailure>) {
    let mut paths = Vec::new();
    let mut failures = Vec::new();
    let mut seen = HashSet::new();

    let mut push = |path: PathBuf, paths: &mut Vec<PathBuf>| {
        if ignore.is_some_and(|set| is_ignored(&path, set)) {
            debug!(path = %path.display(), "ignored by config");
            return;
        }
        if seen.insert(path.clone()) {
            paths.push(path);
        }
    };

    for arg in patterns {
        if is_glob_pattern(arg) {
            let entries = match glob::glob(arg) {
                Ok(entries) => entries,
                Err(e) => {
                    failures.push(InputFailure::new(arg, format!("invalid pattern: {}", e)));
                    continue;
                }
            };
            let mut matched: Vec<PathBuf> = entries
                .filter_map(|entry| match entry {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!(pattern = %arg, error = %e, "unreadable path while expanding pattern");
                        None
                    }
                })
                .filter(|p| p.is_file())
                .collect();
            if matched.is_empty() {
                failures.push(InputFailure::new(arg, "pattern matched no files"));
                continue;
            }
            matched.sort();
            for path in matched {
                push(path, &mut paths);
            }
        } else {
            let path = PathBuf::from(arg);
            if path.is_dir() {
                let mut found: Vec<PathBuf> = WalkDir::new(&path)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file() && is_xml(e.path()))
                    .map(|e| e.into_path())
                    .collect();
                if found.is_empty() {
                    failures.push(InputFailure::new(&path, "directory contains no .xml files"));
                    continue;
                }
                found.sort();
                for file in found {
                    push(file, &mut paths);
                }
            } else {
                push(path, &mut paths);
            }
        }
    }

    (paths, failures)
}

/// Name a file contributes when a suite carries none of its own
fn source_name(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read and parse one file
pub fn load_file(path: &Path, parser: &dyn ResultParser) -> Result<ParsedFile, InputFailure> {
    let bytes = fs::read(path).map_err(|e| InputFailure::new(path, e.to_string()))?;
    let suites = parser
        .parse(&bytes, &source_name(path))
        .map_err(|e| InputFailure::new(path, e.to_string()))?;
    Ok(ParsedFile::new(path, suites))
}

/// Load every path in order under the given failure policy.
///
/// `prior` carries failures already recorded during expansion; under
/// [`FailurePolicy::Strict`] the first of them aborts the load.
pub fn load_inputs(
    paths: &[PathBuf],
    prior: Vec<InputFailure>,
    parser: &dyn ResultParser,
    policy: FailurePolicy,
) -> Result<LoadOutcome, LoadError> {
    if paths.is_empty() && prior.is_empty() {
        return Err(LoadError::NoInputs);
    }
    if policy == FailurePolicy::Strict {
        if let Some(first) = prior.into_iter().next() {
            return Err(first.into());
        }
        let mut outcome = LoadOutcome::default();
        for path in paths {
            outcome.files.push(load_file(path, parser)?);
        }
        return Ok(outcome);
    }

    let attempted = paths.len() + prior.len();
    let mut outcome = LoadOutcome {
        files: Vec::with_capacity(paths.len()),
        failures: prior,
    };
    for path in paths {
        match load_file(path, parser) {
            Ok(file) => outcome.files.push(file),
            Err(failure) => {
                debug!(path = %failure.path.display(), reason = %failure.reason, "skipping input");
                outcome.failures.push(failure);
            }
        }
    }
    if outcome.files.is_empty() {
        return Err(LoadError::NothingLoaded {
            attempted,
            failures: outcome.failures,
        });
    }
    Ok(outcome)
}
