//! Init command: inspect, generate, customize, summarize

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use dialoguer::Input;
use tracing::{info, warn};

use gantry_core::config::{load_config_or_default, Config, ProjectConfigFile, PROJECT_CONFIG_FILE};
use gantry_core::templates::remote::{should_fetch, FetchReport};
use gantry_core::{
    DeploymentMode, ProjectDescriptor, RemoteFetcher, RenderOutcome, Renderer, SubstitutionMap,
    TemplateRegistry, TemplateSources,
};
use gantry_flutter::Inspector;

use crate::cli::{output, Cli};

/// Generate CI/CD files for a Flutter project
#[derive(Debug, Args, Default)]
pub struct InitCommand {
    /// Flutter project directory (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Never download templates
    #[arg(long)]
    pub offline: bool,

    /// Do not prompt for missing values
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Directory with template overrides
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,
}

impl InitCommand {
    /// Init against `path` with default flags, for bare `gantry [PATH]`
    pub fn for_path(path: Option<PathBuf>) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let root = cli.project_root(self.path.as_deref())?;
        let stdin_is_tty = std::io::stdin().is_terminal();
        let interactive = stdin_is_tty && !self.yes;
        info!(root = %root.display(), interactive, offline = self.offline, "executing init command");

        if !cli.quiet {
            output::info(&format!("Inspecting {}", output::path(root.display())));
        }
        let (mut config, config_path) = load_config_or_default(&root)?;
        if let Some(path) = &config_path {
            if !cli.quiet {
                output::info(&format!("Using configuration {}", output::path(path.display())));
            }
        }

        if let Some(file) = ProjectConfigFile::load(&root.join(PROJECT_CONFIG_FILE))? {
            file.fill_gaps(&mut config.project);
        }

        let descriptor = Inspector::new()
            .with_remote(config.deploy.remote.clone())
            .inspect(&root)?
            .with_overrides(&config.project);

        if interactive {
            prompt_identity(&mut config)?;
        }

        let mode = config
            .deploy
            .mode
            .unwrap_or_else(|| DeploymentMode::from_remote(descriptor.vcs_remote_url.as_deref()));

        if !cli.quiet {
            print_descriptor(&descriptor, mode);
        }

        let registry = TemplateRegistry::new();
        let fetched = self.fetch_templates(cli, &config, &registry, stdin_is_tty);
        let sources = TemplateSources {
            dir: self
                .templates
                .clone()
                .or_else(|| config.templates.dir.clone())
                .map(|dir| if dir.is_absolute() { dir } else { root.join(dir) }),
            fetched: fetched.as_ref().map(|report| report.path().to_path_buf()),
        };

        let map = SubstitutionMap::for_project(&descriptor, &config.project, &config.deploy, mode);
        if !cli.quiet {
            output::info("Generating files");
        }
        let reports = Renderer::with_registry(registry, sources).render_all(&root, &map);
        drop(fetched);

        let mut failures = 0;
        for report in &reports {
            let rel = report
                .destination
                .strip_prefix(&root)
                .unwrap_or(&report.destination)
                .display()
                .to_string();
            match &report.outcome {
                RenderOutcome::Written => {
                    if !cli.quiet {
                        output::success(&format!("Created {} ({})", rel, report.origin));
                    }
                }
                RenderOutcome::Skipped => {
                    if !cli.quiet {
                        output::info(&format!("Kept existing {}", rel));
                    }
                }
                RenderOutcome::Appended(n) => {
                    if !cli.quiet {
                        output::success(&format!("Added {} lines to {}", n, rel));
                    }
                }
                RenderOutcome::Failed(e) => {
                    failures += 1;
                    output::error(&format!("{}: {}", rel, e));
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{} of {} files could not be generated", failures, reports.len());
        }

        if !cli.quiet {
            print_next_steps(&root, mode);
        }
        Ok(())
    }

    /// Download templates when running unattended; failures only warn
    fn fetch_templates(
        &self,
        cli: &Cli,
        config: &Config,
        registry: &TemplateRegistry,
        stdin_is_tty: bool,
    ) -> Option<FetchReport> {
        let offline = self.offline || config.templates.offline;
        if !should_fetch(stdin_is_tty, offline) {
            return None;
        }

        let fetcher = match RemoteFetcher::new(config.templates.remote_base_url.clone()) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                warn!(error = %e, "remote fetcher unavailable");
                output::warning(&format!("Using embedded templates: {}", e));
                return None;
            }
        };

        if !cli.quiet {
            output::info(&format!(
                "Fetching templates from {}",
                config.templates.remote_base_url
            ));
        }
        match fetcher.fetch_all(&registry.source_files()) {
            Ok(report) => {
                for failure in &report.failures {
                    output::warning(&format!("{} (using embedded copy)", failure));
                }
                Some(report)
            }
            Err(e) => {
                output::warning(&format!("Using embedded templates: {}", e));
                None
            }
        }
    }
}

fn prompt_identity(config: &mut Config) -> anyhow::Result<()> {
    if config.project.team_id.is_none() {
        let value: String = Input::new()
            .with_prompt("Apple Developer Team ID (leave empty to fill in later)")
            .allow_empty(true)
            .interact_text()?;
        config.project.team_id = non_empty(value);
    }
    if config.project.apple_id.is_none() {
        let value: String = Input::new()
            .with_prompt("Apple ID email (leave empty to fill in later)")
            .allow_empty(true)
            .interact_text()?;
        config.project.apple_id = non_empty(value);
    }
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn print_descriptor(descriptor: &ProjectDescriptor, mode: DeploymentMode) {
    println!();
    println!("{}", output::header("Project"));
    println!("{}", output::key_value("Name", &descriptor.name));
    println!("{}", output::key_value("Version", &descriptor.version));
    println!("{}", output::key_value("Android package", &descriptor.android_package));
    println!("{}", output::key_value("iOS bundle id", &descriptor.ios_bundle_id));
    println!(
        "{}",
        output::key_value(
            "Remote",
            descriptor.vcs_remote_url.as_deref().unwrap_or("(none)")
        )
    );
    println!("{}", output::key_value("Deployment", mode.label()));
    println!();
}

fn print_next_steps(root: &Path, mode: DeploymentMode) {
    println!();
    output::success(&format!("CI/CD files ready in {}", output::path(root.display())));
    println!();
    println!("Next steps:");
    println!(
        "  1. Fill in the {} values in {}",
        style("YOUR_...").yellow(),
        PROJECT_CONFIG_FILE
    );
    match mode {
        DeploymentMode::GitHubActions => {
            println!(
                "  2. Run {} to upload store credentials as repository secrets",
                style("gantry secrets").cyan()
            );
            println!(
                "  3. Run {} to tag a release and trigger the workflow",
                style("make tester").cyan()
            );
        }
        DeploymentMode::Local => {
            println!(
                "  2. Export the signing variables (see {})",
                style("gantry doctor").cyan()
            );
            println!(
                "  3. Run {} to upload a beta build",
                style("make tester").cyan()
            );
        }
    }
}
