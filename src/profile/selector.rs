use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use super::{Exclusions, Profile, ProfileRecord, dir_base_name, parse_exclusion_list};
use crate::error::PackError;
use crate::runtime::Runtime;

const PLUGIN_DIR_PROMPT: &str = "Path to the plugin directory (/path/to/your/plugin): ";
const OUTPUT_DIR_PROMPT: &str = "Location to save zip file (/path/to/output/directory): ";
const MAIN_FILE_PROMPT: &str = "Main plugin file name with extension: ";
const EXCLUDE_DIRS_PROMPT: &str = "Exclude directories (comma-separated or \"none\" for no exclusion): ";
const EXCLUDE_FILES_PROMPT: &str = "Exclude files (comma-separated or \"none\" for no exclusion): ";

/// Menu outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Zero-based index into the stored profiles.
    Stored(usize),
    Manual,
}

/// Interpret a 1-based menu answer. Integers outside the stored range, however
/// large, mean manual entry; anything that is not an integer is rejected.
pub fn parse_choice(input: &str, count: usize) -> Result<Choice, PackError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PackError::MalformedSelection(input.to_string()));
    }
    if negative {
        return Ok(Choice::Manual);
    }

    match digits.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Ok(Choice::Stored(n - 1)),
        _ => Ok(Choice::Manual),
    }
}

/// Answers to the manual-entry prompts, in the order they are asked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManualEntry {
    pub plugin_dir: String,
    pub output_dir: String,
    pub main_file: String,
    pub exclude_dirs: String,
    pub exclude_files: String,
}

impl ManualEntry {
    fn ask<R: Runtime>(runtime: &R) -> Result<Self> {
        Ok(Self {
            plugin_dir: runtime.prompt(PLUGIN_DIR_PROMPT)?,
            output_dir: runtime.prompt(OUTPUT_DIR_PROMPT)?,
            main_file: runtime.prompt(MAIN_FILE_PROMPT)?,
            exclude_dirs: runtime.prompt(EXCLUDE_DIRS_PROMPT)?,
            exclude_files: runtime.prompt(EXCLUDE_FILES_PROMPT)?,
        })
    }

    /// The profile name is the plugin directory's base name.
    pub fn into_profile(self) -> Profile {
        let plugin_dir = PathBuf::from(self.plugin_dir);
        let name = dir_base_name(&plugin_dir).unwrap_or_default();
        Profile {
            name,
            plugin_dir,
            output_dir: PathBuf::from(self.output_dir),
            main_file: self.main_file,
            exclusions: Exclusions {
                dirs: parse_exclusion_list(&self.exclude_dirs),
                files: parse_exclusion_list(&self.exclude_files),
            },
        }
    }
}

/// Show the profile menu and resolve one profile, falling back to manual entry.
///
/// A stored record missing a required field fails only once it is chosen.
#[tracing::instrument(skip(runtime, profiles))]
pub fn select_profile<R: Runtime>(runtime: &R, profiles: &[ProfileRecord]) -> Result<Profile> {
    println!("Select a plugin profile or enter information manually:");
    for (i, profile) in profiles.iter().enumerate() {
        println!("{}. {}", i + 1, profile.name);
    }
    println!("{}. Enter plugin information manually", profiles.len() + 1);

    let answer = runtime.prompt("Enter your choice: ")?;
    match parse_choice(&answer, profiles.len())? {
        Choice::Stored(index) => {
            debug!("Selected stored profile {}", profiles[index].name);
            Ok(profiles[index].resolve()?)
        }
        Choice::Manual => Ok(ManualEntry::ask(runtime)?.into_profile()),
    }
}

/// Pick a stored profile by exact name.
pub fn find_profile(profiles: &[ProfileRecord], name: &str) -> Result<Profile, PackError> {
    profiles
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| PackError::UnknownProfile {
            name: name.to_string(),
            available: if profiles.is_empty() {
                "(none)".to_string()
            } else {
                profiles
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        })?
        .resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::Sequence;
    use mockall::predicate::eq;

    fn stored(name: &str) -> ProfileRecord {
        ProfileRecord {
            name: name.to_string(),
            plugin_dir: Some(PathBuf::from(format!("/srv/{}", name))),
            output_dir: Some(PathBuf::from("/srv/dist")),
            main_file: Some(format!("{}.php", name)),
            ..Default::default()
        }
    }

    fn incomplete(name: &str) -> ProfileRecord {
        ProfileRecord {
            name: name.to_string(),
            plugin_dir: Some(PathBuf::from(format!("/srv/{}", name))),
            ..Default::default()
        }
    }

    fn expect_answer(runtime: &mut MockRuntime, seq: &mut Sequence, prompt: &'static str, answer: &'static str) {
        runtime
            .expect_prompt()
            .with(eq(prompt))
            .times(1)
            .in_sequence(seq)
            .returning(move |_| Ok(answer.to_string()));
    }

    #[test]
    fn test_parse_choice_in_range() {
        assert_eq!(parse_choice("1", 2).unwrap(), Choice::Stored(0));
        assert_eq!(parse_choice(" 2 ", 2).unwrap(), Choice::Stored(1));
    }

    #[test]
    fn test_parse_choice_out_of_range_is_manual() {
        assert_eq!(parse_choice("3", 2).unwrap(), Choice::Manual);
        assert_eq!(parse_choice("99", 2).unwrap(), Choice::Manual);
        assert_eq!(parse_choice("0", 2).unwrap(), Choice::Manual);
        assert_eq!(parse_choice("-4", 2).unwrap(), Choice::Manual);
        assert_eq!(parse_choice("1", 0).unwrap(), Choice::Manual);
    }

    #[test]
    fn test_parse_choice_huge_integer_is_manual() {
        assert_eq!(
            parse_choice("99999999999999999999", 1).unwrap(),
            Choice::Manual
        );
        assert_eq!(
            parse_choice("-99999999999999999999", 1).unwrap(),
            Choice::Manual
        );
        assert_eq!(parse_choice("+1", 1).unwrap(), Choice::Stored(0));
    }

    #[test]
    fn test_parse_choice_malformed() {
        for input in ["", "one", "1.5", "1a", "-", "+", "1 2"] {
            match parse_choice(input, 2) {
                Err(PackError::MalformedSelection(got)) => assert_eq!(got, input),
                other => panic!("Expected MalformedSelection for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_manual_entry_into_profile() {
        let entry = ManualEntry {
            plugin_dir: "/srv/plugins/my-plugin/".into(),
            output_dir: "/srv/dist".into(),
            main_file: "my-plugin.php".into(),
            exclude_dirs: ".git, node_modules".into(),
            exclude_files: "none".into(),
        };

        let profile = entry.into_profile();
        assert_eq!(profile.name, "my-plugin");
        assert_eq!(profile.plugin_dir, PathBuf::from("/srv/plugins/my-plugin/"));
        assert_eq!(profile.output_dir, PathBuf::from("/srv/dist"));
        assert_eq!(profile.main_file, "my-plugin.php");
        assert_eq!(profile.exclusions.dirs, vec![".git", "node_modules"]);
        assert!(profile.exclusions.files.is_empty());
    }

    #[test]
    fn test_select_stored_profile() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_prompt()
            .with(eq("Enter your choice: "))
            .times(1)
            .returning(|_| Ok("2".into()));

        let profiles = vec![stored("alpha"), stored("beta")];
        let profile = select_profile(&runtime, &profiles).unwrap();
        assert_eq!(profile, profiles[1].resolve().unwrap());
    }

    #[test]
    fn test_select_complete_profile_next_to_incomplete_one() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_prompt()
            .with(eq("Enter your choice: "))
            .times(1)
            .returning(|_| Ok("1".into()));

        let profiles = vec![stored("alpha"), incomplete("beta")];
        let profile = select_profile(&runtime, &profiles).unwrap();
        assert_eq!(profile.name, "alpha");
        assert_eq!(profile.plugin_dir, PathBuf::from("/srv/alpha"));
    }

    #[test]
    fn test_select_incomplete_profile_fails() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_prompt()
            .times(1)
            .returning(|_| Ok("2".into()));

        let err = select_profile(&runtime, &[stored("alpha"), incomplete("beta")]).unwrap_err();
        match err.downcast_ref::<PackError>() {
            Some(PackError::IncompleteProfile { name, field }) => {
                assert_eq!(name, "beta");
                assert_eq!(*field, "OUTPUT DIRECTORY");
            }
            other => panic!("Expected IncompleteProfile, got {:?}", other),
        }
    }

    #[test]
    fn test_select_manual_entry_asks_in_order() {
        let mut runtime = MockRuntime::new();
        let mut seq = Sequence::new();

        expect_answer(&mut runtime, &mut seq, "Enter your choice: ", "2");
        expect_answer(&mut runtime, &mut seq, PLUGIN_DIR_PROMPT, "/srv/gamma");
        expect_answer(&mut runtime, &mut seq, OUTPUT_DIR_PROMPT, "/srv/out");
        expect_answer(&mut runtime, &mut seq, MAIN_FILE_PROMPT, "gamma.php");
        expect_answer(&mut runtime, &mut seq, EXCLUDE_DIRS_PROMPT, ".git");
        expect_answer(&mut runtime, &mut seq, EXCLUDE_FILES_PROMPT, "*.log,.DS_Store");

        let profile = select_profile(&runtime, &[stored("alpha")]).unwrap();
        assert_eq!(profile.name, "gamma");
        assert_eq!(profile.plugin_dir, PathBuf::from("/srv/gamma"));
        assert_eq!(profile.output_dir, PathBuf::from("/srv/out"));
        assert_eq!(profile.main_file, "gamma.php");
        assert_eq!(profile.exclusions.dirs, vec![".git"]);
        assert_eq!(profile.exclusions.files, vec!["*.log", ".DS_Store"]);
    }

    #[test]
    fn test_select_malformed_choice_asks_nothing_more() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_prompt()
            .times(1)
            .returning(|_| Ok("first".into()));

        let err = select_profile(&runtime, &[stored("alpha")]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PackError>(),
            Some(PackError::MalformedSelection(_))
        ));
    }

    #[test]
    fn test_find_profile_by_name() {
        let profiles = vec![stored("alpha"), stored("beta")];
        assert_eq!(find_profile(&profiles, "beta").unwrap().name, "beta");

        match find_profile(&profiles, "gamma") {
            Err(PackError::UnknownProfile { name, available }) => {
                assert_eq!(name, "gamma");
                assert_eq!(available, "alpha, beta");
            }
            other => panic!("Expected UnknownProfile, got {:?}", other),
        }
    }

    #[test]
    fn test_find_incomplete_profile() {
        let profiles = vec![stored("alpha"), incomplete("beta")];
        assert!(matches!(
            find_profile(&profiles, "beta"),
            Err(PackError::IncompleteProfile { .. })
        ));
        assert!(find_profile(&profiles, "alpha").is_ok());
    }
}
