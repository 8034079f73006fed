//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use commands::{
    ChangelogCommand, CompletionsCommand, DoctorCommand, InitCommand, InspectCommand,
    LaneCommand, ModeCommand, SecretsCommand, VersionCommand,
};

/// Gantry - CI/CD scaffolding and lane runner for Flutter apps
///
/// With no subcommand, `gantry [PATH]` runs `init` against PATH.
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true, args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Project directory for commands that take no path
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Flutter project to set up (defaults to the current directory)
    pub path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate CI/CD files for a Flutter project
    Init(InitCommand),

    /// Show what gantry detects about a project
    Inspect(InspectCommand),

    /// Show the deployment mode for a project
    Mode(ModeCommand),

    /// Run a signing, build or upload lane
    Lane(LaneCommand),

    /// Show or bump the pubspec version
    Version(VersionCommand),

    /// Print release notes since the last release tag
    Changelog(ChangelogCommand),

    /// Check that the required tools are installed
    Doctor(DoctorCommand),

    /// Upload store credentials to GitHub Actions secrets
    Secrets(SecretsCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Init(ref cmd)) => cmd.execute(&self),
            Some(Commands::Inspect(ref cmd)) => cmd.execute(&self),
            Some(Commands::Mode(ref cmd)) => cmd.execute(&self),
            Some(Commands::Lane(ref cmd)) => cmd.execute(&self),
            Some(Commands::Version(ref cmd)) => cmd.execute(&self),
            Some(Commands::Changelog(ref cmd)) => cmd.execute(&self),
            Some(Commands::Doctor(ref cmd)) => cmd.execute(&self),
            Some(Commands::Secrets(ref cmd)) => cmd.execute(&self),
            Some(Commands::Completions(ref cmd)) => cmd.execute(&self),
            None => InitCommand::for_path(self.path.clone()).execute(&self),
        }
    }

    /// Project root: an explicit path, then `-C`, then the current directory
    pub fn project_root(&self, explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
        let root = match explicit.or(self.directory.as_deref()) {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir()?,
        };
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_path_runs_init() {
        let cli = Cli::try_parse_from(["gantry", "./my_app"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.path, Some(PathBuf::from("./my_app")));
    }

    #[test]
    fn test_subcommand_parses() {
        let cli = Cli::try_parse_from(["gantry", "lane", "-C", "app", "beta", "android"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Lane(_))));
        assert_eq!(cli.project_root(None).unwrap(), PathBuf::from("app"));
        assert_eq!(
            cli.project_root(Some(Path::new("other"))).unwrap(),
            PathBuf::from("other")
        );
    }
}
