//! Version command

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::info;

use gantry_core::BumpKind;
use gantry_flutter::{bump_version, read_version, MANIFEST_FILE};

use crate::cli::{output, Cli, OutputFormat};

/// Show or bump the pubspec version
#[derive(Debug, Args)]
pub struct VersionCommand {
    #[command(subcommand)]
    pub action: Option<VersionAction>,
}

/// Version actions
#[derive(Debug, Subcommand)]
pub enum VersionAction {
    /// Print the current version (default)
    Show,

    /// Increment a version component and rewrite pubspec.yaml
    Bump {
        /// major, minor, patch or build
        kind: BumpKind,
    },
}

#[derive(Debug, Serialize)]
struct VersionOutput {
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous: Option<String>,
}

impl VersionCommand {
    /// Execute the version command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let root = cli.project_root(None)?;
        let pubspec = root.join(MANIFEST_FILE);
        info!(pubspec = %pubspec.display(), action = ?self.action, "executing version command");

        let out = self.apply(pubspec)?;
        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&out)?),
            OutputFormat::Text => match &out.previous {
                Some(previous) if !cli.quiet => {
                    output::success(&format!("{} -> {}", previous, out.version));
                }
                Some(_) => {}
                None => println!("{}", out.version),
            },
        }
        Ok(())
    }

    fn apply(&self, pubspec: PathBuf) -> anyhow::Result<VersionOutput> {
        match &self.action {
            None | Some(VersionAction::Show) => Ok(VersionOutput {
                version: read_version(&pubspec)?,
                previous: None,
            }),
            Some(VersionAction::Bump { kind }) => {
                let previous = read_version(&pubspec)?;
                let version = bump_version(&pubspec, *kind)?;
                Ok(VersionOutput {
                    version,
                    previous: Some(previous),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pubspec(version: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(MANIFEST_FILE);
        std::fs::write(&path, format!("name: demo_app\nversion: {version}\n")).unwrap();
        (temp, path)
    }

    #[test]
    fn test_show_is_default() {
        let (_temp, path) = pubspec("1.2.3+4");
        let out = VersionCommand { action: None }.apply(path).unwrap();
        assert_eq!(out.version, "1.2.3+4");
        assert!(out.previous.is_none());
    }

    #[test]
    fn test_bump_minor_rewrites_pubspec() {
        let (_temp, path) = pubspec("1.2.3+4");
        let cmd = VersionCommand {
            action: Some(VersionAction::Bump {
                kind: BumpKind::Minor,
            }),
        };
        let out = cmd.apply(path.clone()).unwrap();
        assert_eq!(out.previous.as_deref(), Some("1.2.3+4"));
        assert_eq!(out.version, "1.3.0+5");
        assert!(std::fs::read_to_string(&path).unwrap().contains("version: 1.3.0+5"));
    }

    #[test]
    fn test_missing_pubspec_fails() {
        let temp = TempDir::new().unwrap();
        let cmd = VersionCommand { action: None };
        assert!(cmd.apply(temp.path().join(MANIFEST_FILE)).is_err());
    }
}
