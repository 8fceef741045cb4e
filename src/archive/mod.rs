mod zip;

use anyhow::Result;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;
use crate::version::PluginVersion;

pub use self::zip::ZipArchiver;

/// Minute-resolution timestamp embedded in archive names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";

/// Result of writing one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub path: PathBuf,
    pub entries: usize,
    pub bytes: usize,
}

/// Writer for one archive format.
pub trait ArchiveWriter {
    /// File extension of the produced archive, without the dot.
    fn extension(&self) -> &'static str;

    /// Pack every regular file under `staged_root` into `archive_path`.
    /// Entry names are relative to `staged_root`.
    fn write_archive<R: Runtime>(
        &self,
        runtime: &R,
        staged_root: &Path,
        archive_path: &Path,
    ) -> Result<ArchiveReport>;
}

/// `<base>_v<version>_<YYYYMMDDHHMM>.<extension>`
pub fn archive_file_name(
    base: &str,
    version: &PluginVersion,
    timestamp: NaiveDateTime,
    extension: &str,
) -> String {
    format!(
        "{}_v{}_{}.{}",
        base,
        version,
        timestamp.format(TIMESTAMP_FORMAT),
        extension
    )
}

/// Entry name for a path relative to the staged root, always `/`-separated.
pub fn archive_entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
