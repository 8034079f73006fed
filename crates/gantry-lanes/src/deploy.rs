//! Store upload through Fastlane, promotion and release tagging

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::{info, instrument, warn};

use gantry_core::config::DeployConfig;
use gantry_core::error::{ConfigError, GantryError, Result};
use gantry_core::{CommandRunner, CommandSpec, Environment, Platform};
use gantry_git::{push_tag_command, release_tag_name, GitRepo};

/// Optional variables passed through to every Fastlane lane
pub const FORWARDED_ENV: &[&str] = &[
    "SLACK_WEBHOOK_URL",
    "DISCORD_WEBHOOK_URL",
    "AUTO_SUBMIT_FOR_REVIEW",
    "AUTO_RELEASE_AFTER_REVIEW",
];

/// Variables the iOS `setup` lane reads
pub const IOS_SETUP_ENV: &[&str] = &["USE_FASTLANE_MATCH", "MATCH_PASSWORD", "IOS_CERT_PASSWORD"];

/// Upload lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneKind {
    /// Testing track / TestFlight
    Beta,
    /// Production / App Store
    Release,
}

impl LaneKind {
    /// Fastlane lane name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beta => "beta",
            Self::Release => "release",
        }
    }

    /// Track used when none is given
    pub fn default_track<'c>(&self, config: &'c DeployConfig) -> &'c str {
        match self {
            Self::Beta => &config.beta_track,
            Self::Release => &config.release_track,
        }
    }
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Staged rollout percentage, kept as typed
#[derive(Debug, Clone, PartialEq)]
pub struct Rollout(String);

impl Rollout {
    /// The percentage as given
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Rollout {
    type Err = GantryError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let invalid = |message: String| ConfigError::InvalidValue {
            field: "rollout".to_string(),
            message,
        };
        let value: f64 = raw
            .parse()
            .map_err(|_| invalid(format!("'{raw}' is not a number")))?;
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid(format!("{raw} is outside 0-100")).into());
        }
        Ok(Self(raw.to_string()))
    }
}

impl fmt::Display for Rollout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One upload
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub platform: Platform,
    pub lane: LaneKind,
    pub track: String,
    /// Release notes
    pub changelog: String,
    pub rollout: Option<Rollout>,
}

fn fastlane(root: &Path, platform: Platform, lane: &str, env: &Environment) -> CommandSpec {
    CommandSpec::new("bundle")
        .args(["exec", "fastlane", lane])
        .current_dir(root.join(platform.project_dir()))
        .envs(env.subset(FORWARDED_ENV))
}

/// `bundle exec fastlane <lane> track:<t> changelog:<text> [rollout:<p>]`
pub fn deploy_command(root: &Path, request: &DeployRequest, env: &Environment) -> CommandSpec {
    let mut spec = fastlane(root, request.platform, request.lane.as_str(), env)
        .arg(format!("track:{}", request.track))
        .arg(format!("changelog:{}", request.changelog));
    if let Some(rollout) = &request.rollout {
        spec = spec.arg(format!("rollout:{rollout}"));
    }
    spec
}

/// `bundle exec fastlane setup` for iOS certificate installation
pub fn ios_setup_command(root: &Path, env: &Environment) -> CommandSpec {
    fastlane(root, Platform::Ios, "setup", env).envs(env.subset(IOS_SETUP_ENV))
}

/// Upload the built artifact
#[instrument(
    skip(runner, env, request),
    fields(platform = %request.platform, lane = %request.lane, track = %request.track)
)]
pub fn deploy<R: CommandRunner + ?Sized>(
    runner: &R,
    root: &Path,
    env: &Environment,
    request: &DeployRequest,
) -> Result<()> {
    let output = runner.run_checked(&deploy_command(root, request, env))?;
    info!(
        duration_ms = output.duration.as_millis() as u64,
        rollout = request.rollout.as_ref().map(|r| r.as_str()),
        "upload finished"
    );
    Ok(())
}

/// `bundle exec fastlane promote from_track:<a> to_track:<b> [rollout:<p>]`
pub fn promote_command(
    root: &Path,
    platform: Platform,
    from: &str,
    to: &str,
    rollout: Option<&Rollout>,
    env: &Environment,
) -> CommandSpec {
    let mut spec = fastlane(root, platform, "promote", env)
        .arg(format!("from_track:{from}"))
        .arg(format!("to_track:{to}"));
    if let Some(rollout) = rollout {
        spec = spec.arg(format!("rollout:{rollout}"));
    }
    spec
}

/// Promote the current build between tracks without uploading an artifact
#[instrument(skip(runner, env, rollout), fields(platform = %platform))]
pub fn promote<R: CommandRunner + ?Sized>(
    runner: &R,
    root: &Path,
    env: &Environment,
    platform: Platform,
    from: &str,
    to: &str,
    rollout: Option<&Rollout>,
) -> Result<()> {
    runner.run_checked(&promote_command(root, platform, from, to, rollout, env))?;
    info!(from, to, "promotion finished");
    Ok(())
}

/// Tag HEAD `v<version>` and push the tag when `AUTO_PUSH_GIT_TAGS` is set
///
/// Returns the tag name, or `None` when tagging was skipped (no repository,
/// or the tag already exists).
#[instrument(skip(runner, env, config), fields(root = %root.display()))]
pub fn tag_release<R: CommandRunner + ?Sized>(
    runner: &R,
    root: &Path,
    env: &Environment,
    config: &DeployConfig,
    version: &str,
) -> Result<Option<String>> {
    let repo = match GitRepo::open(root) {
        Ok(repo) => repo,
        Err(e) => {
            warn!(error = %e, "not tagging release");
            return Ok(None);
        }
    };

    let name = release_tag_name(version);
    if repo.find_tag(&name)?.is_some() {
        info!(tag = %name, "tag already exists, skipping");
        return Ok(None);
    }
    repo.create_tag(&name, Some(&format!("Release {version}")))?;

    if env.flag("AUTO_PUSH_GIT_TAGS") {
        runner.run_checked(&push_tag_command(root, &config.remote, &name))?;
        info!(tag = %name, remote = %config.remote, "pushed tag");
    }
    Ok(Some(name))
}
