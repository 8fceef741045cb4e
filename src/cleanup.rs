use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// RAII guard that removes a path when dropped.
///
/// Call [`CleanupGuard::cleanup`] to remove it now and see the error, or
/// [`CleanupGuard::success`] to keep it.
pub struct CleanupGuard<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    armed: bool,
}

impl<'a, R: Runtime> CleanupGuard<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        debug!("Registered for cleanup: {:?}", path);
        Self {
            runtime,
            path,
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the path; nothing is removed.
    pub fn success(mut self) {
        self.armed = false;
    }

    /// Remove the path now, reporting failures.
    pub fn cleanup(mut self) -> Result<()> {
        self.armed = false;
        remove_path(self.runtime, &self.path)
    }
}

impl<R: Runtime> Drop for CleanupGuard<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!("Cleaning up: {:?}", self.path);
        if let Err(e) = remove_path(self.runtime, &self.path) {
            debug!("Failed to clean up {:?}: {:#}", self.path, e);
        }
    }
}

fn remove_path<R: Runtime>(runtime: &R, path: &Path) -> Result<()> {
    if runtime.is_dir(path) {
        runtime.remove_dir_all(path)
    } else if runtime.exists(path) {
        runtime.remove_file(path)
    } else {
        Ok(())
    }
}
