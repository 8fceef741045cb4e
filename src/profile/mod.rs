//! Packaging profiles.
//!
//! A profile names a plugin tree, where its archive goes, which file carries
//! the version, and what to leave out.

mod selector;
mod store;

use std::path::{Path, PathBuf};

use crate::runtime::normalize_path;

pub use selector::{Choice, ManualEntry, find_profile, parse_choice, select_profile};
pub use store::{DEFAULT_PROFILE_FILE, ProfileRecord, load_profiles, parse_profiles};

/// Names to leave out of the staged tree.
///
/// Both lists are glob patterns matched against entry names at any depth.
/// Empty lists mean nothing is excluded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Exclusions {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

impl Exclusions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    /// All patterns, directory patterns first.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.dirs.iter().chain(self.files.iter()).map(String::as_str)
    }
}

/// Split a comma-separated exclusion value.
///
/// An empty value or a literal `none` yields an empty list.
pub fn parse_exclusion_list(value: &str) -> Vec<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Vec::new();
    }
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// A resolved packaging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub plugin_dir: PathBuf,
    pub output_dir: PathBuf,
    pub main_file: String,
    pub exclusions: Exclusions,
}

/// Last normal component of `path` after lexical normalization.
///
/// `/srv/my-plugin/` and `/srv/my-plugin/.` both give `my-plugin`.
pub fn dir_base_name(path: &Path) -> Option<String> {
    normalize_path(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
