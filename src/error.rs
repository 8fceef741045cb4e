use std::path::PathBuf;
use thiserror::Error;

/// Domain failures of a packaging run.
///
/// These travel inside `anyhow::Error`; callers that need to tell them apart
/// use `downcast_ref::<PackError>()`.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("Main plugin file {} does not exist", .0.display())]
    MissingMainFile(PathBuf),

    #[error("Plugin directory {} does not exist", .0.display())]
    MissingPluginDir(PathBuf),

    #[error(
        "Staging directory {} overlaps plugin directory {}; choose another output directory or remove it",
        .staging.display(),
        .plugin_dir.display()
    )]
    StagingOverlapsSource { staging: PathBuf, plugin_dir: PathBuf },

    #[error("Profile '{name}' is missing '{field}'")]
    IncompleteProfile { name: String, field: &'static str },

    #[error("Profile '{name}' not found. Available profiles: {available}")]
    UnknownProfile { name: String, available: String },

    #[error("Invalid choice '{0}': expected a number")]
    MalformedSelection(String),

    #[error("Input closed before an answer was given")]
    InputClosed,
}
