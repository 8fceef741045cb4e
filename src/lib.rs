pub mod archive;
pub mod cleanup;
pub mod error;
pub mod package;
pub mod profile;
pub mod runtime;
pub mod stage;
pub mod version;

pub use error::PackError;
pub use package::{Packager, Phase, RunOptions, run};
