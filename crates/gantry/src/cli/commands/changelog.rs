//! Changelog command

use clap::Args;
use serde::Serialize;
use tracing::info;

use gantry_changelog::{generate_changelog, ChangelogOptions};
use gantry_core::config::{load_config_or_default, ChangelogConfig};
use gantry_git::GitRepo;

use crate::cli::{Cli, OutputFormat};

/// Print release notes since the last release tag
#[derive(Debug, Args)]
pub struct ChangelogCommand {
    /// Group entries by conventional commit type
    #[arg(long)]
    pub grouped: bool,

    /// Truncate to this many characters
    #[arg(long, value_name = "CHARS", conflicts_with = "no_limit")]
    pub max_length: Option<usize>,

    /// Do not truncate
    #[arg(long)]
    pub no_limit: bool,
}

#[derive(Debug, Serialize)]
struct ChangelogOutput<'a> {
    changelog: &'a str,
    grouped: bool,
    max_length: Option<usize>,
}

impl ChangelogCommand {
    /// Execute the changelog command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let root = cli.project_root(None)?;
        info!(root = %root.display(), grouped = self.grouped, "executing changelog command");

        let (config, _) = load_config_or_default(&root)?;
        let options = self.options(&config.changelog);
        let repo = GitRepo::discover(&root)?;
        let notes = generate_changelog(&repo, &options)?;

        match cli.format {
            OutputFormat::Json => {
                let out = ChangelogOutput {
                    changelog: &notes,
                    grouped: options.grouped,
                    max_length: options.max_length,
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            OutputFormat::Text => println!("{}", notes),
        }
        Ok(())
    }

    /// Configured options with command line flags applied on top
    fn options(&self, config: &ChangelogConfig) -> ChangelogOptions {
        let mut options = ChangelogOptions::from(config);
        options.grouped |= self.grouped;
        if self.no_limit {
            options.max_length = None;
        } else if let Some(max) = self.max_length {
            options.max_length = Some(max);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(grouped: bool, max_length: Option<usize>, no_limit: bool) -> ChangelogCommand {
        ChangelogCommand {
            grouped,
            max_length,
            no_limit,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let config = ChangelogConfig {
            grouped: false,
            max_length: Some(500),
            ..ChangelogConfig::default()
        };

        let options = command(true, Some(120), false).options(&config);
        assert!(options.grouped);
        assert_eq!(options.max_length, Some(120));

        let options = command(false, None, true).options(&config);
        assert!(!options.grouped);
        assert_eq!(options.max_length, None);

        let options = command(false, None, false).options(&config);
        assert_eq!(options.max_length, Some(500));
    }
}
