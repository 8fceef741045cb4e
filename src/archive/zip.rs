use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{ArchiveReport, ArchiveWriter, archive_entry_name};
use crate::cleanup::CleanupGuard;
use crate::runtime::Runtime;

/// Writer for deflate-compressed .zip archives
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl ArchiveWriter for ZipArchiver {
    fn extension(&self) -> &'static str {
        "zip"
    }

    #[tracing::instrument(skip(self, runtime))]
    fn write_archive<R: Runtime>(
        &self,
        runtime: &R,
        staged_root: &Path,
        archive_path: &Path,
    ) -> Result<ArchiveReport> {
        debug!("Packing {:?} into {:?}...", staged_root, archive_path);

        // ZipWriter needs Write + Seek, but Runtime::write takes a finished buffer,
        // so the archive is assembled in memory first.
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut entries = 0;

        for entry in WalkDir::new(staged_root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {:?}", staged_root))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = pathdiff::diff_paths(entry.path(), staged_root).ok_or_else(|| {
                anyhow!("{:?} is not inside {:?}", entry.path(), staged_root)
            })?;
            let name = archive_entry_name(&relative);

            #[allow(unused_mut)]
            let mut options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let metadata = entry
                    .metadata()
                    .with_context(|| format!("Failed to stat {:?}", entry.path()))?;
                options = options.unix_permissions(metadata.permissions().mode());
            }

            zip.start_file(name.as_str(), options)
                .with_context(|| format!("Failed to add {} to archive", name))?;
            let mut reader = runtime.open(entry.path())?;
            std::io::copy(&mut reader, &mut zip)
                .with_context(|| format!("Failed to compress {:?}", entry.path()))?;
            debug!("Added {}", name);
            entries += 1;
        }

        let bytes = zip
            .finish()
            .context("Failed to finalize ZIP archive")?
            .into_inner();

        // Written beside the target and renamed, so an archive already at
        // `archive_path` is either fully replaced or left untouched.
        let part_file = part_path(archive_path)?;
        let part = CleanupGuard::new(runtime, part_file.clone());
        runtime
            .write(&part_file, &bytes)
            .with_context(|| format!("Failed to write archive {:?}", archive_path))?;
        if runtime.exists(archive_path) {
            warn!("Replacing existing archive {:?}", archive_path);
        }
        runtime
            .rename(&part_file, archive_path)
            .with_context(|| format!("Failed to write archive {:?}", archive_path))?;
        part.success();

        info!("Wrote {} entries ({} bytes) to {:?}", entries, bytes.len(), archive_path);
        Ok(ArchiveReport {
            path: archive_path.to_path_buf(),
            entries,
            bytes: bytes.len(),
        })
    }
}

/// Hidden sibling of `archive_path` used while the archive is written.
fn part_path(archive_path: &Path) -> Result<PathBuf> {
    let name = archive_path
        .file_name()
        .ok_or_else(|| anyhow!("{:?} has no file name", archive_path))?;
    let mut part_name = OsString::from(".");
    part_name.push(name);
    part_name.push(".part");
    Ok(archive_path.with_file_name(part_name))
}
