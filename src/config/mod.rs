//! Configuration loading for junit2html

mod schema;

pub use schema::{CliOverrides, Config, ResolvedOptions, DEFAULT_OUTPUT};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILENAME: &str = ".junit2htmlrc.json";

/// Load the effective config for a run.
///
/// An explicit `custom_path` is resolved against `work_dir` and must exist.
/// Otherwise the nearest `.junit2htmlrc.json` in `work_dir` or one of its
/// ancestors is used; with none found the defaults apply. `extends` chains
/// are followed, each file layered over the one it extends.
pub fn load_config(work_dir: &Path, custom_path: Option<&Path>) -> Result<Config> {
    let Some(path) = locate(work_dir, custom_path)? else {
        return Ok(Config::default());
    };

    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut next = Some(path);
    while let Some(path) = next.take() {
        let key = path.canonicalize().unwrap_or_else(|_| path.clone());
        if !seen.insert(key) {
            anyhow::bail!("Circular extends detected in config: {}", path.display());
        }
        let mut config = read_config(&path)?;
        if let Some(base) = config.extends.take() {
            next = Some(extends_target(&path, &base)?);
        }
        chain.push(config);
    }

    Ok(chain
        .into_iter()
        .rev()
        .reduce(|base, mut child| {
            child.merge_from(base);
            child
        })
        .unwrap_or_default())
}

fn locate(work_dir: &Path, custom_path: Option<&Path>) -> Result<Option<PathBuf>> {
    match custom_path {
        Some(p) => {
            let path = work_dir.join(p);
            anyhow::ensure!(path.is_file(), "Config file not found: {}", path.display());
            Ok(Some(path))
        }
        None => Ok(work_dir
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .find(|candidate| candidate.is_file())),
    }
}

fn read_config(path: &Path) -> Result<Config> {
    debug!(path = %path.display(), "reading config");
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in config: {}", path.display()))
}

/// Relative `extends` values resolve against the referencing file; a missing
/// extension means `.json`
fn extends_target(from: &Path, extends: &str) -> Result<PathBuf> {
    let mut target = from.parent().unwrap_or(Path::new(".")).join(extends);
    if target.extension().is_none() {
        target.set_extension("json");
    }
    anyhow::ensure!(
        target.is_file(),
        "Extended config not found: {} (referenced from {})",
        target.display(),
        from.display()
    );
    Ok(target)
}

/// Compile config `ignore` patterns
pub fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid ignore pattern: {pattern}"))?);
    }
    builder.build().context("Failed to compile ignore patterns")
}

pub fn is_ignored(path: &Path, ignore_set: &GlobSet) -> bool {
    ignore_set.is_match(path)
}

/// Write a starter config into `dir`. Refuses to overwrite unless `force`.
pub fn write_starter(dir: &Path, force: bool) -> Result<Option<PathBuf>> {
    let path = dir.join(CONFIG_FILENAME);
    if path.exists() && !force {
        return Ok(None);
    }
    let json = serde_json::to_string_pretty(&Config::starter())
        .context("Failed to serialize starter config")?;
    fs::write(&path, json + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(Some(path))
}
