//! Secrets command: copy store credentials into GitHub Actions secrets

use std::time::Duration;

use clap::Args;
use tracing::{info, warn};

use gantry_core::{CommandRunner, CommandSpec, Environment, Platform, SystemRunner};
use gantry_lanes::FORWARDED_ENV;

use crate::cli::{output, Cli};

/// Variables the Android jobs read
pub const ANDROID_SECRETS: &[&str] = &[
    "ANDROID_KEYSTORE_BASE64",
    "KEYSTORE_PASSWORD",
    "KEY_ALIAS",
    "KEY_PASSWORD",
    "PLAY_STORE_JSON_BASE64",
    "PLAY_STORE_JSON_KEY_DATA",
];

/// Variables the iOS jobs read
pub const IOS_SECRETS: &[&str] = &[
    "APP_STORE_KEY_ID",
    "APP_STORE_ISSUER_ID",
    "APP_STORE_KEY_CONTENT",
    "USE_FASTLANE_MATCH",
    "MATCH_PASSWORD",
    "IOS_DIST_CERT_BASE64",
    "IOS_CERT_PASSWORD",
    "IOS_PROVISIONING_PROFILE_BASE64",
];

/// Pause after `gh auth login --web` so the browser flow can finish
const LOGIN_WAIT: Duration = Duration::from_secs(5);

/// Upload store credentials to GitHub Actions secrets
#[derive(Debug, Args)]
pub struct SecretsCommand {
    /// Only upload secrets for one platform
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Target repository (OWNER/REPO); gh picks the current one otherwise
    #[arg(long)]
    pub repo: Option<String>,

    /// List the secrets that would be set without uploading
    #[arg(long)]
    pub dry_run: bool,
}

/// What an upload did
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    /// Unset variables, skipped
    pub missing: Vec<String>,
}

impl SecretsCommand {
    /// Execute the secrets command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(platform = ?self.platform, repo = ?self.repo, dry_run = self.dry_run, "executing secrets command");
        let env = Environment::capture();
        let report = self.upload(&SystemRunner::new(), &env, LOGIN_WAIT)?;

        if !cli.quiet {
            let verb = if self.dry_run { "Would set" } else { "Set" };
            for name in &report.uploaded {
                output::success(&format!("{} {}", verb, name));
            }
            for name in &report.missing {
                output::warning(&format!("{} is not set, skipped", name));
            }
        }
        if report.uploaded.is_empty() {
            anyhow::bail!("no credential variables are set in the environment");
        }
        Ok(())
    }

    /// Secret names for the selected platforms, then the optional forwarded ones
    fn secret_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.platform != Some(Platform::Ios) {
            names.extend_from_slice(ANDROID_SECRETS);
        }
        if self.platform != Some(Platform::Android) {
            names.extend_from_slice(IOS_SECRETS);
        }
        names.extend_from_slice(FORWARDED_ENV);
        names
    }

    fn upload<R: CommandRunner>(
        &self,
        runner: &R,
        env: &Environment,
        login_wait: Duration,
    ) -> anyhow::Result<UploadReport> {
        if !self.dry_run {
            ensure_gh_auth(runner, login_wait)?;
        }

        let mut report = UploadReport::default();
        for name in self.secret_names() {
            let Some(value) = env.get(name) else {
                report.missing.push(name.to_string());
                continue;
            };
            if !self.dry_run {
                runner.run_checked(&secret_set_command(name, value, self.repo.as_deref()))?;
                info!(secret = name, "secret uploaded");
            }
            report.uploaded.push(name.to_string());
        }
        Ok(report)
    }
}

/// `gh secret set NAME [--repo R]` with the value on stdin
pub fn secret_set_command(name: &str, value: &str, repo: Option<&str>) -> CommandSpec {
    let mut spec = CommandSpec::new("gh").args(["secret", "set", name]);
    if let Some(repo) = repo {
        spec = spec.args(["--repo", repo]);
    }
    spec.stdin(value).captured()
}

/// Log in through the browser when `gh auth status` fails
fn ensure_gh_auth<R: CommandRunner>(runner: &R, login_wait: Duration) -> anyhow::Result<()> {
    let status = CommandSpec::new("gh").args(["auth", "status"]).captured();
    if runner.run(&status)?.success() {
        return Ok(());
    }

    warn!("gh is not authenticated, starting browser login");
    output::info("Logging in to GitHub");
    runner.run_checked(&CommandSpec::new("gh").args(["auth", "login", "--web"]))?;
    std::thread::sleep(login_wait);

    if !runner.run(&status)?.success() {
        anyhow::bail!("GitHub CLI is still not authenticated; run 'gh auth login'");
    }
    Ok(())
}
