use anyhow::Result;
use clap::Parser;
use plugpack::RunOptions;
use plugpack::profile::DEFAULT_PROFILE_FILE;
use std::path::PathBuf;

/// plugpack - WordPress plugin packager
///
/// Copy a plugin directory (minus excluded names) and zip it as
/// <plugin>_v<version>_<YYYYMMDDHHMM>.zip in the output directory.
///
/// Examples:
///   plugpack                       # Pick a profile from plugin_profiles.txt or enter one
///   plugpack --profile MyPlugin    # Package a stored profile without prompting
#[derive(Parser, Debug)]
#[command(author, version = env!("PLUGPACK_VERSION"), about)]
struct Cli {
    /// Profile store to read
    #[arg(long = "profiles", short = 'p', value_name = "PATH", default_value = DEFAULT_PROFILE_FILE)]
    profiles_path: PathBuf,

    /// Package this stored profile instead of showing the menu
    #[arg(long = "profile", short = 'n', value_name = "NAME")]
    profile_name: Option<String>,
}

impl From<Cli> for RunOptions {
    fn from(cli: Cli) -> Self {
        RunOptions {
            profiles_path: cli.profiles_path,
            profile_name: cli.profile_name,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = plugpack::runtime::RealRuntime;

    plugpack::run(&runtime, &cli.into())?;
    Ok(())
}
