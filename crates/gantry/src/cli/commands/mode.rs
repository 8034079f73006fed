//! Mode command

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::info;

use gantry_core::config::load_config_or_default;
use gantry_core::DeploymentMode;
use gantry_git::GitRepo;

use crate::cli::{output, Cli, OutputFormat};

/// Show the deployment mode for a project
#[derive(Debug, Args)]
pub struct ModeCommand {
    /// Project directory (defaults to the current directory)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ModeOutput {
    mode: DeploymentMode,
    remote: Option<String>,
    forced: bool,
}

impl ModeCommand {
    /// Execute the mode command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let root = cli.project_root(self.path.as_deref())?;
        info!(root = %root.display(), "executing mode command");

        let (config, _) = load_config_or_default(&root)?;
        let remote = match GitRepo::open(&root) {
            Ok(repo) => repo.remote_url_or_first(&config.deploy.remote)?,
            Err(_) => None,
        };
        let mode = config
            .deploy
            .mode
            .unwrap_or_else(|| DeploymentMode::from_remote(remote.as_deref()));

        match cli.format {
            OutputFormat::Json => {
                let out = ModeOutput {
                    mode,
                    remote,
                    forced: config.deploy.mode.is_some(),
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            OutputFormat::Text => {
                println!("{}", output::header(mode.label()));
                println!("{}", output::key_value("Remote", remote.as_deref().unwrap_or("(none)")));
                if config.deploy.mode.is_some() {
                    println!("{}", output::key_value("Source", "deploy.mode in configuration"));
                }
            }
        }
        Ok(())
    }
}
