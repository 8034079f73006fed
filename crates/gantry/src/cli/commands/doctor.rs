//! Doctor command - check the host for the tools and credentials lanes need

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use gantry_core::config::{find_config, PROJECT_CONFIG_FILE};
use gantry_core::{CommandRunner, CommandSpec, Environment, Platform, SystemRunner};
use gantry_flutter::MANIFEST_FILE;
use gantry_lanes::{AndroidCredentials, IosCredentials};

use crate::cli::{Cli, OutputFormat};

/// Check that the required tools are installed
#[derive(Debug, Args)]
pub struct DoctorCommand {
    /// Show suggestions for fixing issues
    #[arg(long)]
    pub fix: bool,

    /// Only check specific categories
    #[arg(long, value_delimiter = ',')]
    pub only: Option<Vec<CheckCategory>>,
}

/// Categories of checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CheckCategory {
    /// flutter, git, bundler, fastlane, gh
    Tools,
    /// Xcode and CocoaPods (macOS only)
    Platform,
    /// Signing and store credentials in the environment
    Credentials,
    /// pubspec.yaml, project.config, gantry.toml
    Project,
}

impl CheckCategory {
    fn all() -> Vec<Self> {
        vec![Self::Tools, Self::Platform, Self::Credentials, Self::Project]
    }
}

/// Result of a single check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: Option<String>,
    pub version: Option<String>,
    pub fix_suggestion: Option<String>,
}

/// Status of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
    Skip,
}

/// Summary of all checks
#[derive(Debug, Serialize)]
pub struct DoctorSummary {
    pub checks: Vec<CheckResult>,
    pub ok_count: usize,
    pub warn_count: usize,
    pub fail_count: usize,
    pub skip_count: usize,
}

impl DoctorSummary {
    fn new(checks: Vec<CheckResult>) -> Self {
        let count = |status| checks.iter().filter(|c| c.status == status).count();
        Self {
            ok_count: count(CheckStatus::Ok),
            warn_count: count(CheckStatus::Warn),
            fail_count: count(CheckStatus::Fail),
            skip_count: count(CheckStatus::Skip),
            checks,
        }
    }
}

/// A tool looked up on PATH
struct Tool {
    name: &'static str,
    binary: &'static str,
    version_args: &'static [&'static str],
    /// Missing means `Fail` rather than `Warn`
    required: bool,
    fix: &'static str,
}

const TOOLS: &[Tool] = &[
    Tool {
        name: "Flutter",
        binary: "flutter",
        version_args: &["--version"],
        required: true,
        fix: "Install Flutter from https://flutter.dev",
    },
    Tool {
        name: "Git",
        binary: "git",
        version_args: &["--version"],
        required: true,
        fix: "Install git from https://git-scm.com",
    },
    Tool {
        name: "Bundler",
        binary: "bundle",
        version_args: &["--version"],
        required: true,
        fix: "Run 'gem install bundler'",
    },
    Tool {
        name: "Fastlane",
        binary: "fastlane",
        version_args: &["--version"],
        required: false,
        fix: "Run 'bundle install' in the project; lanes use 'bundle exec fastlane'",
    },
    Tool {
        name: "GitHub CLI",
        binary: "gh",
        version_args: &["--version"],
        required: false,
        fix: "Install gh from https://cli.github.com (needed for 'gantry secrets')",
    },
];

const MACOS_TOOLS: &[Tool] = &[
    Tool {
        name: "Xcode",
        binary: "xcodebuild",
        version_args: &["-version"],
        required: true,
        fix: "Install Xcode from the App Store",
    },
    Tool {
        name: "CocoaPods",
        binary: "pod",
        version_args: &["--version"],
        required: false,
        fix: "Run 'gem install cocoapods'",
    },
];

impl DoctorCommand {
    /// Execute the doctor command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(fix = self.fix, "executing doctor command");
        let root = cli.project_root(None)?;
        let env = Environment::capture();
        let runner = SystemRunner::new();

        if !cli.quiet && cli.format == OutputFormat::Text {
            println!("{}", style("Checking environment...").bold());
            println!();
        }

        let mut checks = Vec::new();
        for category in self.only.clone().unwrap_or_else(CheckCategory::all) {
            match category {
                CheckCategory::Tools => checks.extend(check_tools(&runner, TOOLS)),
                CheckCategory::Platform => checks.extend(self.check_platform(&runner)),
                CheckCategory::Credentials => checks.extend(check_credentials(&env)),
                CheckCategory::Project => checks.extend(check_project(&root)),
            }
        }
        let summary = DoctorSummary::new(checks);

        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            OutputFormat::Text => {
                if !cli.quiet {
                    print_results(&summary.checks);
                    print_summary(&summary);
                }
                if self.fix && (summary.fail_count > 0 || summary.warn_count > 0) {
                    println!();
                    println!("{}", style("Suggested fixes:").bold());
                    for check in &summary.checks {
                        if matches!(check.status, CheckStatus::Fail | CheckStatus::Warn) {
                            if let Some(fix) = &check.fix_suggestion {
                                println!("  {} {}: {}", status_icon(check.status), style(&check.name).bold(), fix);
                            }
                        }
                    }
                }
            }
        }

        if summary.fail_count > 0 {
            anyhow::bail!("{} check(s) failed", summary.fail_count);
        }
        Ok(())
    }

    fn check_platform(&self, runner: &SystemRunner) -> Vec<CheckResult> {
        if cfg!(target_os = "macos") {
            check_tools(runner, MACOS_TOOLS)
        } else {
            vec![CheckResult {
                name: "Xcode".to_string(),
                status: CheckStatus::Skip,
                message: Some("iOS builds need a macOS host".to_string()),
                version: None,
                fix_suggestion: None,
            }]
        }
    }
}

fn check_tools<R: CommandRunner>(runner: &R, tools: &[Tool]) -> Vec<CheckResult> {
    tools
        .iter()
        .map(|tool| {
            let version = which::which(tool.binary).ok().map(|_| {
                tool_version(runner, tool).unwrap_or_else(|| "installed".to_string())
            });
            tool_result(tool, version)
        })
        .collect()
}

fn tool_result(tool: &Tool, version: Option<String>) -> CheckResult {
    match version {
        Some(version) => CheckResult {
            name: tool.name.to_string(),
            status: CheckStatus::Ok,
            message: Some(version.clone()),
            version: Some(version),
            fix_suggestion: None,
        },
        None => CheckResult {
            name: tool.name.to_string(),
            status: if tool.required {
                CheckStatus::Fail
            } else {
                CheckStatus::Warn
            },
            message: Some("Not found".to_string()),
            version: None,
            fix_suggestion: Some(tool.fix.to_string()),
        },
    }
}

/// First line of `<tool> --version`; some tools print it on stderr
fn tool_version<R: CommandRunner>(runner: &R, tool: &Tool) -> Option<String> {
    let spec = CommandSpec::new(tool.binary)
        .args(tool.version_args.iter().copied())
        .captured();
    let output = runner.run(&spec).ok().filter(|o| o.success())?;
    let text = if output.stdout.trim().is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    text.lines().next().map(|l| l.trim().to_string())
}

fn check_credentials(env: &Environment) -> Vec<CheckResult> {
    Platform::all()
        .iter()
        .map(|&platform| {
            let outcome = match platform {
                Platform::Android => AndroidCredentials::from_env(env).map(drop),
                Platform::Ios => IosCredentials::from_env(env).map(drop),
            };
            let name = format!("{} signing credentials", platform);
            match outcome {
                Ok(()) => CheckResult {
                    name,
                    status: CheckStatus::Ok,
                    message: Some("Complete".to_string()),
                    version: None,
                    fix_suggestion: None,
                },
                Err(e) => CheckResult {
                    name,
                    status: CheckStatus::Warn,
                    message: Some(e.to_string()),
                    version: None,
                    fix_suggestion: Some(format!(
                        "Export the {} variables listed in {} before running lanes",
                        platform, PROJECT_CONFIG_FILE
                    )),
                },
            }
        })
        .collect()
}

fn check_project(root: &std::path::Path) -> Vec<CheckResult> {
    let file_check = |name: &str, path: Option<PathBuf>, missing: CheckStatus, fix: &str| match path {
        Some(path) => CheckResult {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: Some(path.display().to_string()),
            version: None,
            fix_suggestion: None,
        },
        None => CheckResult {
            name: name.to_string(),
            status: missing,
            message: Some("Not found".to_string()),
            version: None,
            fix_suggestion: Some(fix.to_string()),
        },
    };
    let existing = |name: &str| Some(root.join(name)).filter(|p| p.is_file());

    vec![
        file_check(
            MANIFEST_FILE,
            existing(MANIFEST_FILE),
            CheckStatus::Warn,
            "Run gantry from a Flutter project directory or pass -C",
        ),
        file_check(
            PROJECT_CONFIG_FILE,
            existing(PROJECT_CONFIG_FILE),
            CheckStatus::Warn,
            "Run 'gantry init' to generate it",
        ),
        file_check(
            "gantry.toml",
            find_config(root),
            CheckStatus::Skip,
            "Optional; defaults are used without it",
        ),
    ]
}

fn print_results(checks: &[CheckResult]) {
    for check in checks {
        let icon = status_icon(check.status);
        let msg = style(check.message.as_deref().unwrap_or("")).dim();
        let name = match check.status {
            CheckStatus::Ok => style(&check.name).green(),
            CheckStatus::Warn => style(&check.name).yellow(),
            CheckStatus::Fail => style(&check.name).red(),
            CheckStatus::Skip => style(&check.name).dim(),
        };
        println!("  {} {} {}", icon, name, msg);
    }
}

fn print_summary(summary: &DoctorSummary) {
    println!();
    let total = summary.ok_count + summary.warn_count + summary.fail_count + summary.skip_count;

    if summary.fail_count == 0 && summary.warn_count == 0 {
        println!("{} All {} checks passed!", style("✓").green().bold(), summary.ok_count);
        return;
    }

    println!(
        "Summary: {} ok, {} warnings, {} failed, {} skipped (out of {})",
        style(summary.ok_count).green(),
        style(summary.warn_count).yellow(),
        style(summary.fail_count).red(),
        style(summary.skip_count).dim(),
        total
    );
    println!();
    println!(
        "{} {} issue(s) found. Run '{}' for suggestions.",
        style("!").yellow().bold(),
        summary.fail_count + summary.warn_count,
        style("gantry doctor --fix").cyan()
    );
}

fn status_icon(status: CheckStatus) -> console::StyledObject<&'static str> {
    match status {
        CheckStatus::Ok => style("[OK]").green(),
        CheckStatus::Warn => style("[WARN]").yellow(),
        CheckStatus::Fail => style("[FAIL]").red(),
        CheckStatus::Skip => style("[SKIP]").dim(),
    }
}
