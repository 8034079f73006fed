//! Lane command: signing, build and store upload

use std::path::PathBuf;

use clap::{Args, Subcommand};
use tracing::info;

use gantry_changelog::ChangelogOptions;
use gantry_core::config::load_config_or_default;
use gantry_core::{
    BuildProfile, CommandRunner, Environment, Platform, RecordingRunner, SystemRunner,
};
use gantry_lanes::{LaneInvoker, LaneKind, LaneOptions, LaneSummary, Rollout};

use crate::cli::{output, Cli};

/// Run a signing, build or upload lane
#[derive(Debug, Args)]
pub struct LaneCommand {
    /// Print the commands instead of running them; credentials are only validated
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub action: LaneAction,
}

/// Lanes
#[derive(Debug, Subcommand)]
pub enum LaneAction {
    /// Sign, build and upload to the testing track
    Beta(UploadArgs),

    /// Sign, build, upload to production and tag the release
    Release(UploadArgs),

    /// Promote the latest build between tracks
    Promote {
        /// Target platform
        platform: Platform,

        /// Source track (deploy.beta_track by default)
        #[arg(long)]
        from: Option<String>,

        /// Destination track (deploy.release_track by default)
        #[arg(long)]
        to: Option<String>,

        /// Staged rollout percentage (0-100)
        #[arg(long)]
        rollout: Option<Rollout>,
    },

    /// Decode signing credentials into the project and leave them there
    SetupSigning {
        /// Target platform
        platform: Platform,
    },

    /// Build the store artifact
    Build {
        /// Target platform
        platform: Platform,

        /// Build profile
        #[arg(long, default_value = "release")]
        profile: BuildProfile,
    },

    /// Remove build output and decoded credentials
    Clean {
        /// Target platform
        platform: Platform,
    },
}

/// Arguments shared by the upload lanes
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Target platform
    pub platform: Platform,

    /// Store track (deploy.beta_track / deploy.release_track by default)
    #[arg(long)]
    pub track: Option<String>,

    /// Release notes (generated from git history by default)
    #[arg(long)]
    pub changelog: Option<String>,

    /// Staged rollout percentage (0-100)
    #[arg(long)]
    pub rollout: Option<Rollout>,

    /// Build profile
    #[arg(long, default_value = "release")]
    pub profile: BuildProfile,
}

impl UploadArgs {
    fn options(&self) -> LaneOptions {
        LaneOptions {
            track: self.track.clone(),
            changelog: self.changelog.clone(),
            rollout: self.rollout.clone(),
            profile: self.profile,
        }
    }
}

impl LaneCommand {
    /// Execute the lane command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let env = Environment::capture();
        self.execute_with(cli, &env)
    }

    fn execute_with(&self, cli: &Cli, env: &Environment) -> anyhow::Result<()> {
        let root = cli.project_root(None)?;
        info!(root = %root.display(), dry_run = self.dry_run, action = ?self.action, "executing lane command");

        if self.dry_run {
            let runner = RecordingRunner::new();
            self.run_with(cli, &runner, root, env)?;
            if !cli.quiet {
                println!();
                println!("{}", output::header("Commands that would run:"));
                for line in runner.command_lines() {
                    println!("  {}", line);
                }
            }
            Ok(())
        } else {
            self.run_with(cli, &SystemRunner::new(), root, env)
        }
    }

    fn run_with<R: CommandRunner>(
        &self,
        cli: &Cli,
        runner: &R,
        root: PathBuf,
        env: &Environment,
    ) -> anyhow::Result<()> {
        let (config, _) = load_config_or_default(&root)?;
        let changelog = ChangelogOptions::from(&config.changelog);

        let mut invoker = LaneInvoker::new(runner, root, env)
            .with_deploy_config(config.deploy)
            .with_changelog_options(changelog)
            .dry_run(self.dry_run)
            .check_host(!self.dry_run);
        if !cli.quiet {
            invoker = invoker.with_reporter(|platform, step| {
                output::info(&format!("[{}] {}", platform, step));
            });
        }

        match &self.action {
            LaneAction::Beta(args) => {
                let summary = invoker.run(LaneKind::Beta, args.platform, &args.options())?;
                print_summary(cli, &summary);
            }
            LaneAction::Release(args) => {
                let summary = invoker.run(LaneKind::Release, args.platform, &args.options())?;
                print_summary(cli, &summary);
            }
            LaneAction::Promote {
                platform,
                from,
                to,
                rollout,
            } => {
                invoker.promote(*platform, from.as_deref(), to.as_deref(), rollout.as_ref())?;
                if !cli.quiet {
                    output::success(&format!("Promoted {} build", platform));
                }
            }
            LaneAction::SetupSigning { platform } => {
                let files = invoker.setup_signing(*platform)?.keep();
                if !cli.quiet {
                    for file in &files {
                        output::success(&format!("Wrote {}", output::path(file.display())));
                    }
                    if !files.is_empty() {
                        output::warning("These files contain secrets; run `gantry lane clean` when done");
                    }
                }
            }
            LaneAction::Build { platform, profile } => {
                let artifact = invoker.build(*platform, *profile)?;
                if !cli.quiet {
                    output::success(&format!("Built {}", output::path(artifact.display())));
                }
            }
            LaneAction::Clean { platform } => {
                let removed = invoker.clean(*platform);
                if !cli.quiet {
                    for path in &removed {
                        output::info(&format!("Removed {}", output::path(path.display())));
                    }
                    output::success(&format!("Cleaned {} ({} paths)", platform, removed.len()));
                }
            }
        }
        Ok(())
    }
}

fn print_summary(cli: &Cli, summary: &LaneSummary) {
    if cli.quiet {
        return;
    }
    println!();
    output::success(&format!(
        "{} {} uploaded to {} in {:.1}s",
        summary.platform,
        summary.lane,
        summary.track,
        summary.duration.as_secs_f64()
    ));
    println!("{}", output::key_value("Artifact", &summary.artifact.display().to_string()));
    if let Some(tag) = &summary.tag {
        println!("{}", output::key_value("Tag", tag));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use clap::Parser;
    use tempfile::TempDir;

    fn lane(args: &[&str]) -> (Cli, LaneCommand) {
        let mut argv = vec!["gantry", "lane"];
        argv.extend_from_slice(args);
        let mut cli = Cli::try_parse_from(argv).unwrap();
        match cli.command.take() {
            Some(Commands::Lane(cmd)) => (cli, cmd),
            other => panic!("expected lane command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_release_with_rollout() {
        let (_, cmd) = lane(&["--dry-run", "release", "ios", "--rollout", "25", "--track", "production"]);
        assert!(cmd.dry_run);
        match cmd.action {
            LaneAction::Release(args) => {
                assert_eq!(args.platform, Platform::Ios);
                assert_eq!(args.rollout.unwrap().as_str(), "25");
                assert_eq!(args.track.as_deref(), Some("production"));
                assert_eq!(args.profile, BuildProfile::Release);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_rollout_out_of_range_rejected() {
        let argv = ["gantry", "lane", "beta", "android", "--rollout", "150"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_unknown_platform_rejected() {
        assert!(Cli::try_parse_from(["gantry", "lane", "beta", "windows"]).is_err());
    }

    #[test]
    fn test_dry_run_beta_writes_nothing() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("pubspec.yaml"), "name: demo_app\nversion: 1.0.0+1\n").unwrap();
        let dir = temp.path().to_str().unwrap();

        let (cli, cmd) = lane(&["-C", dir, "--dry-run", "beta", "android", "--changelog", "Notes"]);
        let env = Environment::default()
            .with("ANDROID_KEYSTORE_BASE64", "amtz")
            .with("KEYSTORE_PASSWORD", "pw")
            .with("PLAY_STORE_JSON_KEY_DATA", "{}");

        cmd.execute_with(&cli, &env).unwrap();
        assert!(!temp.path().join("android/key.properties").exists());
        assert!(!temp.path().join("build").exists());
    }

    #[test]
    fn test_dry_run_still_checks_credentials() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_str().unwrap();
        let (cli, cmd) = lane(&["-C", dir, "--dry-run", "release", "android"]);

        let err = cmd.execute_with(&cli, &Environment::default()).unwrap_err();
        assert!(err.to_string().contains("ANDROID_KEYSTORE_BASE64"));
    }
}
