//! Packaging run: profile → version → staging → archive → cleanup.

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDateTime};
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::archive::{ArchiveWriter, ZipArchiver, archive_file_name};
use crate::cleanup::CleanupGuard;
use crate::error::PackError;
use crate::profile::{
    DEFAULT_PROFILE_FILE, Profile, dir_base_name, find_profile, load_profiles, select_profile,
};
use crate::runtime::{Runtime, is_path_under, normalize_path};
use crate::stage::{STAGING_DIR_NAME, stage_tree};
use crate::version::extract_version;

/// Where profiles come from and which one to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub profiles_path: PathBuf,
    /// Use this stored profile instead of asking.
    pub profile_name: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            profiles_path: PathBuf::from(DEFAULT_PROFILE_FILE),
            profile_name: None,
        }
    }
}

/// Step of a packaging run, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SelectingProfile,
    ExtractingVersion,
    Staging,
    Archiving,
    CleaningUp,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            Phase::SelectingProfile => "selecting a profile",
            Phase::ExtractingVersion => "extracting the plugin version",
            Phase::Staging => "staging plugin files",
            Phase::Archiving => "writing the archive",
            Phase::CleaningUp => "removing the staging directory",
        };
        write!(f, "Failed while {}", step)
    }
}

/// Directory the staging walk must not enter.
///
/// Only relevant when the output directory sits inside the plugin tree; when
/// both are the same directory only the staging directory is skipped.
fn walk_exclusion<'p>(plugin_dir: &Path, output_dir: &'p Path, staging: &'p Path) -> Option<&'p Path> {
    if !is_path_under(output_dir, plugin_dir) {
        None
    } else if normalize_path(output_dir) == normalize_path(plugin_dir) {
        Some(staging)
    } else {
        Some(output_dir)
    }
}

/// Refuse a staging directory that would replace plugin content.
///
/// The plugin tree must not sit in the staging directory, and when the
/// archive goes into the plugin directory itself an existing `temp_plugin`
/// there belongs to the plugin.
fn check_staging<R: Runtime>(
    runtime: &R,
    plugin_dir: &Path,
    output_dir: &Path,
    staging: &Path,
) -> Result<(), PackError> {
    let overlaps = is_path_under(plugin_dir, staging)
        || (normalize_path(output_dir) == normalize_path(plugin_dir) && runtime.exists(staging));
    if overlaps {
        return Err(PackError::StagingOverlapsSource {
            staging: staging.to_path_buf(),
            plugin_dir: plugin_dir.to_path_buf(),
        });
    }
    Ok(())
}

pub struct Packager<'a, R: Runtime, A: ArchiveWriter> {
    runtime: &'a R,
    archiver: A,
}

impl<'a, R: Runtime, A: ArchiveWriter> Packager<'a, R, A> {
    pub fn new(runtime: &'a R, archiver: A) -> Self {
        Self { runtime, archiver }
    }

    /// Load stored profiles and pick one, by name or from the menu.
    #[tracing::instrument(skip(self))]
    pub fn resolve_profile(&self, options: &RunOptions) -> Result<Profile> {
        if !self.runtime.exists(&options.profiles_path) {
            println!("Profile file {} not found.", options.profiles_path.display());
        }
        let profiles = load_profiles(self.runtime, &options.profiles_path)?;

        match &options.profile_name {
            Some(name) => Ok(find_profile(&profiles, name)?),
            None => select_profile(self.runtime, &profiles),
        }
    }

    /// Package `profile` into an archive stamped with `timestamp`.
    ///
    /// The staging directory is gone when this returns, whatever the outcome.
    #[tracing::instrument(skip(self, profile), fields(profile = %profile.name))]
    pub fn package(&self, profile: &Profile, timestamp: NaiveDateTime) -> Result<PathBuf> {
        let runtime = self.runtime;

        let version = extract_version(runtime, &profile.plugin_dir, &profile.main_file)
            .context(Phase::ExtractingVersion)?;
        if !version.is_known() {
            println!("Version not found in the main plugin file.");
        }
        println!("Packaging plugin version: {}", version);

        let plugin_dir = normalize_path(&runtime.absolute(&profile.plugin_dir)?);
        let output_dir = normalize_path(&runtime.absolute(&profile.output_dir)?);
        let base_name = dir_base_name(&plugin_dir)
            .ok_or_else(|| anyhow!("Cannot derive a plugin name from {:?}", plugin_dir))?;

        let staging_dir = output_dir.join(STAGING_DIR_NAME);
        check_staging(runtime, &plugin_dir, &output_dir, &staging_dir).context(Phase::Staging)?;

        runtime.create_dir_all(&output_dir).context(Phase::Staging)?;
        let staging = CleanupGuard::new(runtime, staging_dir.clone());
        let avoid = walk_exclusion(&plugin_dir, &output_dir, &staging_dir);
        stage_tree(runtime, &plugin_dir, &staging_dir, &profile.exclusions, avoid)
            .context(Phase::Staging)?;

        let archive_name =
            archive_file_name(&base_name, &version, timestamp, self.archiver.extension());
        let archive_path = output_dir.join(archive_name);

        // Only a file this run creates is removed if archiving fails
        let partial = (!runtime.exists(&archive_path))
            .then(|| CleanupGuard::new(runtime, archive_path.clone()));
        let report = self
            .archiver
            .write_archive(runtime, staging.path(), &archive_path)
            .context(Phase::Archiving)?;
        if let Some(guard) = partial {
            guard.success();
        }

        staging.cleanup().context(Phase::CleaningUp)?;
        debug!("Removed staging directory {:?}", staging_dir);

        info!("Packaged {} ({} entries)", profile.name, report.entries);
        println!("Plugin packaged successfully: {}", report.path.display());
        Ok(report.path)
    }
}

/// Run one interactive (or profile-named) packaging pass with the zip archiver.
pub fn run<R: Runtime>(runtime: &R, options: &RunOptions) -> Result<PathBuf> {
    println!("*** WP Plugin Generator ***");

    let packager = Packager::new(runtime, ZipArchiver);
    let profile = packager
        .resolve_profile(options)
        .context(Phase::SelectingProfile)?;
    packager.package(&profile, Local::now().naive_local())
}
