//! Flat text profile store.
//!
//! ```text
//! PLUGIN NAME: MyPlugin
//! PLUGIN DIRECTORY: /path/to/myplugin
//! OUTPUT DIRECTORY: /path/to/output
//! MAIN PLUGIN FILE: myplugin.php
//! EXCLUDE DIRS: .git,node_modules
//! EXCLUDE FILES: .DS_Store
//! ```
//!
//! Each `PLUGIN NAME:` line starts a new record.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use super::{Exclusions, Profile, parse_exclusion_list};
use crate::error::PackError;
use crate::runtime::Runtime;

/// Profile file looked up in the working directory when none is given.
pub const DEFAULT_PROFILE_FILE: &str = "plugin_profiles.txt";

const NAME_PREFIX: &str = "PLUGIN NAME:";
const PLUGIN_DIR_PREFIX: &str = "PLUGIN DIRECTORY:";
const OUTPUT_DIR_PREFIX: &str = "OUTPUT DIRECTORY:";
const MAIN_FILE_PREFIX: &str = "MAIN PLUGIN FILE:";
const EXCLUDE_DIRS_PREFIX: &str = "EXCLUDE DIRS:";
const EXCLUDE_FILES_PREFIX: &str = "EXCLUDE FILES:";

/// One stored record as written in the file.
///
/// Required fields stay optional here so that a broken record only fails when
/// it is picked, not when the file is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRecord {
    pub name: String,
    pub plugin_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub main_file: Option<String>,
    pub exclude_dirs: Option<Vec<String>>,
    pub exclude_files: Option<Vec<String>>,
}

impl ProfileRecord {
    fn named(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Turn the record into a usable profile, naming the first missing field.
    pub fn resolve(&self) -> Result<Profile, PackError> {
        let missing = |field: &'static str| PackError::IncompleteProfile {
            name: self.name.clone(),
            field,
        };

        let plugin_dir = self.plugin_dir.clone().ok_or_else(|| missing("PLUGIN DIRECTORY"))?;
        let output_dir = self.output_dir.clone().ok_or_else(|| missing("OUTPUT DIRECTORY"))?;
        let main_file = self.main_file.clone().ok_or_else(|| missing("MAIN PLUGIN FILE"))?;

        Ok(Profile {
            name: self.name.clone(),
            plugin_dir,
            output_dir,
            main_file,
            exclusions: Exclusions {
                dirs: self.exclude_dirs.clone().unwrap_or_default(),
                files: self.exclude_files.clone().unwrap_or_default(),
            },
        })
    }
}

fn field_value<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix).map(str::trim)
}

/// Parse profile records from the store's text.
///
/// Every `PLUGIN NAME:` line yields one record, complete or not.
pub fn parse_profiles(text: &str) -> Vec<ProfileRecord> {
    let mut records = Vec::new();
    let mut current: Option<ProfileRecord> = None;
    let mut orphan = ProfileRecord::default();
    let mut has_orphans = false;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();

        if let Some(name) = field_value(line, NAME_PREFIX) {
            records.extend(current.take());
            current = Some(ProfileRecord::named(name.to_string()));
            continue;
        }

        let record = match current.as_mut() {
            Some(record) => record,
            None => &mut orphan,
        };
        let known = if let Some(value) = field_value(line, PLUGIN_DIR_PREFIX) {
            record.plugin_dir = Some(PathBuf::from(value));
            true
        } else if let Some(value) = field_value(line, OUTPUT_DIR_PREFIX) {
            record.output_dir = Some(PathBuf::from(value));
            true
        } else if let Some(value) = field_value(line, MAIN_FILE_PREFIX) {
            record.main_file = Some(value.to_string());
            true
        } else if let Some(value) = field_value(line, EXCLUDE_DIRS_PREFIX) {
            record.exclude_dirs = Some(parse_exclusion_list(value));
            true
        } else if let Some(value) = field_value(line, EXCLUDE_FILES_PREFIX) {
            record.exclude_files = Some(parse_exclusion_list(value));
            true
        } else {
            if !line.is_empty() {
                debug!("Ignoring unrecognized profile line {}: {:?}", index + 1, line);
            }
            false
        };
        has_orphans |= known && current.is_none();
    }
    records.extend(current);

    if has_orphans {
        warn!("Ignoring profile fields that appear before the first '{}' line", NAME_PREFIX);
    }
    for record in &records {
        if let Err(err) = record.resolve() {
            warn!("{}", err);
        }
    }

    records
}

/// Load profile records from `path`. A missing file yields no records.
#[tracing::instrument(skip(runtime))]
pub fn load_profiles<R: Runtime>(runtime: &R, path: &Path) -> Result<Vec<ProfileRecord>> {
    if !runtime.exists(path) {
        warn!("Profile file {:?} not found", path);
        return Ok(Vec::new());
    }

    let text = runtime
        .read_to_string(path)
        .with_context(|| format!("Failed to read profile file {:?}", path))?;
    let records = parse_profiles(&text);
    debug!("Loaded {} profile(s) from {:?}", records.len(), path);
    Ok(records)
}
