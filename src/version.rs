//! Version extraction from the plugin's main file.
//!
//! The main file is expected to carry a header line such as
//! `Version: 1.4.2`; the first `X.Y.Z` after `Version:` wins.

use anyhow::{Context, Result};
use log::{debug, warn};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::PackError;
use crate::runtime::Runtime;

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version:\s*(\d+\.\d+\.\d+)").expect("valid regex"));

/// Label used in place of a version when the main file declares none.
pub const UNKNOWN_VERSION: &str = "unknown_version";

/// Version declared by a plugin's main file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginVersion {
    Known(String),
    /// The main file exists but has no `Version: X.Y.Z` line.
    Unknown,
}

impl PluginVersion {
    pub fn as_str(&self) -> &str {
        match self {
            PluginVersion::Known(version) => version,
            PluginVersion::Unknown => UNKNOWN_VERSION,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, PluginVersion::Known(_))
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Find the first `Version: X.Y.Z` declaration in `content`.
pub fn parse_version(content: &str) -> PluginVersion {
    VERSION_REGEX
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| PluginVersion::Known(m.as_str().to_string()))
        .unwrap_or(PluginVersion::Unknown)
}

/// Read `<plugin_dir>/<main_file>` and extract its version.
///
/// A missing main file is an error; a main file without a version is not.
#[tracing::instrument(skip(runtime))]
pub fn extract_version<R: Runtime>(
    runtime: &R,
    plugin_dir: &Path,
    main_file: &str,
) -> Result<PluginVersion> {
    let main_path = plugin_dir.join(main_file);
    if !runtime.is_file(&main_path) {
        return Err(PackError::MissingMainFile(main_path).into());
    }

    let content = runtime
        .read_to_string(&main_path)
        .with_context(|| format!("Failed to read main plugin file {:?}", main_path))?;

    let version = parse_version(&content);
    match &version {
        PluginVersion::Known(v) => debug!("Found version {} in {:?}", v, main_path),
        PluginVersion::Unknown => warn!("Version not found in the main plugin file {:?}", main_path),
    }
    Ok(version)
}
