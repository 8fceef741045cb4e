//! Copy a plugin tree into a staging directory, leaving out excluded names.

use anyhow::{Context, Result};
use glob::Pattern;
use log::{debug, info};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::PackError;
use crate::profile::Exclusions;
use crate::runtime::{Runtime, is_path_under};

/// Name of the staging directory created inside the output directory.
pub const STAGING_DIR_NAME: &str = "temp_plugin";

/// What a staging pass copied and skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub files: usize,
    pub dirs: usize,
    pub skipped: usize,
}

/// Compiled exclusion patterns, matched against entry names.
#[derive(Debug)]
struct NameFilter {
    patterns: Vec<Pattern>,
}

impl NameFilter {
    fn new(exclusions: &Exclusions) -> Result<Self> {
        let patterns = exclusions
            .patterns()
            .map(|p| {
                Pattern::new(p).with_context(|| format!("Invalid exclusion pattern '{}'", p))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }
}

/// Copy `source` into `staging`, replacing anything already at `staging`.
///
/// Every entry whose name matches an exclusion pattern is skipped; a skipped
/// directory takes its whole subtree with it. `avoid` is never descended into,
/// which keeps an output directory nested in the source tree out of the copy.
#[tracing::instrument(skip(runtime, exclusions))]
pub fn stage_tree<R: Runtime>(
    runtime: &R,
    source: &Path,
    staging: &Path,
    exclusions: &Exclusions,
    avoid: Option<&Path>,
) -> Result<StageReport> {
    if !runtime.is_dir(source) {
        return Err(PackError::MissingPluginDir(source.to_path_buf()).into());
    }

    if exclusions.is_empty() {
        debug!("No exclusions, copying {:?} as is", source);
    }
    let filter = NameFilter::new(exclusions)?;

    if runtime.exists(staging) {
        debug!("Removing stale staging directory {:?}", staging);
        runtime.remove_dir_all(staging)?;
    }
    runtime.create_dir_all(staging)?;

    let mut report = StageReport::default();
    let keep = |entry: &DirEntry| -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if avoid.is_some_and(|dir| is_path_under(entry.path(), dir)) {
            return false;
        }
        !filter.is_excluded(&entry.file_name().to_string_lossy())
    };

    let mut walker = WalkDir::new(source).follow_links(true).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.with_context(|| format!("Failed to walk {:?}", source))?;
        if !keep(&entry) {
            debug!("Excluding {:?}", entry.path());
            report.skipped += 1;
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("{:?} is outside {:?}", entry.path(), source))?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target: PathBuf = staging.join(relative);

        if entry.file_type().is_dir() {
            runtime.create_dir_all(&target)?;
            report.dirs += 1;
        } else {
            runtime.copy(entry.path(), &target)?;
            report.files += 1;
        }
    }

    info!(
        "Staged {} file(s) in {} dir(s) to {:?}, {} excluded",
        report.files, report.dirs, staging, report.skipped
    );
    Ok(report)
}
