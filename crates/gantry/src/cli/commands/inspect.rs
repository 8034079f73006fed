//! Inspect command

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::info;

use gantry_core::config::{load_config_or_default, ProjectConfigFile, PROJECT_CONFIG_FILE};
use gantry_core::{DeploymentMode, ProjectDescriptor};
use gantry_flutter::Inspector;

use crate::cli::{output, Cli, OutputFormat};

/// Show what gantry detects about a project
#[derive(Debug, Args)]
pub struct InspectCommand {
    /// Flutter project directory (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Ignore gantry.toml and project.config overrides
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Serialize)]
struct InspectOutput {
    #[serde(flatten)]
    project: ProjectDescriptor,
    deployment_mode: DeploymentMode,
}

impl InspectCommand {
    /// Execute the inspect command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let root = cli.project_root(self.path.as_deref())?;
        info!(root = %root.display(), raw = self.raw, "executing inspect command");

        let (mut config, _) = load_config_or_default(&root)?;
        let mut project = Inspector::new()
            .with_remote(config.deploy.remote.clone())
            .inspect(&root)?;
        if !self.raw {
            if let Some(file) = ProjectConfigFile::load(&root.join(PROJECT_CONFIG_FILE))? {
                file.fill_gaps(&mut config.project);
            }
            project = project.with_overrides(&config.project);
        }
        let deployment_mode = config
            .deploy
            .mode
            .unwrap_or_else(|| DeploymentMode::from_remote(project.vcs_remote_url.as_deref()));

        match cli.format {
            OutputFormat::Json => {
                let out = InspectOutput {
                    project,
                    deployment_mode,
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            OutputFormat::Text => {
                println!("{}", output::header(&project.name));
                println!("{}", output::key_value("Version", &project.version));
                println!("{}", output::key_value("Android package", &project.android_package));
                println!("{}", output::key_value("iOS bundle id", &project.ios_bundle_id));
                println!(
                    "{}",
                    output::key_value("Remote", project.vcs_remote_url.as_deref().unwrap_or("(none)"))
                );
                println!("{}", output::key_value("Deployment", deployment_mode.label()));
            }
        }
        Ok(())
    }
}
