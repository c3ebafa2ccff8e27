//! Config schema and deserialization

use crate::loader::FailurePolicy;
use crate::DEFAULT_TITLE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output path used when neither the CLI nor the config names one
pub const DEFAULT_OUTPUT: &str = "junit-report.html";

/// Root config structure for .junit2htmlrc.json
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Report title shown in the page header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Output HTML path (relative to the working directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Abort on the first unreadable or malformed input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,

    /// Exit 1 when the report contains failed or errored tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on_failures: Option<bool>,

    /// Glob patterns for input files to leave out
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Values given on the command line; `None` / `false` defers to config
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub title: Option<String>,
    pub output: Option<PathBuf>,
    pub strict: bool,
    pub fail_on_failures: bool,
}

/// Final settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub title: String,
    pub output: PathBuf,
    pub policy: FailurePolicy,
    pub fail_on_failures: bool,
    pub ignore: Vec<String>,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(self, cli: CliOverrides) -> ResolvedOptions {
        let strict = cli.strict || self.strict.unwrap_or(false);
        ResolvedOptions {
            title: cli
                .title
                .or(self.title)
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            output: cli
                .output
                .or_else(|| self.output.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            policy: if strict {
                FailurePolicy::Strict
            } else {
                FailurePolicy::BestEffort
            },
            fail_on_failures: cli.fail_on_failures || self.fail_on_failures.unwrap_or(false),
            ignore: self.ignore,
        }
    }

    /// Layer this config over the one it extends; fields set here win
    pub fn merge_from(&mut self, base: Config) {
        self.title = self.title.take().or(base.title);
        self.output = self.output.take().or(base.output);
        self.strict = self.strict.or(base.strict);
        self.fail_on_failures = self.fail_on_failures.or(base.fail_on_failures);

        // base patterns first
        let mut ignore = base.ignore;
        ignore.append(&mut self.ignore);
        self.ignore = ignore;
    }

    /// Starter config written by `junit2html init`
    pub fn starter() -> Self {
        Self {
            extends: None,
            title: Some(DEFAULT_TITLE.to_string()),
            output: Some(DEFAULT_OUTPUT.to_string()),
            strict: Some(false),
            fail_on_failures: Some(false),
            ignore: Vec::new(),
        }
    }
}
