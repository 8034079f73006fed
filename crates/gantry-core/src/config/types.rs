//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::DeploymentMode;

/// Main configuration for gantry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project identity overrides
    pub project: ProjectConfig,

    /// Template sources
    pub templates: TemplatesConfig,

    /// Deployment settings
    pub deploy: DeployConfig,

    /// Release notes settings
    pub changelog: ChangelogConfig,
}

/// Values that override or complete what the inspector detects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Apple developer team id
    pub team_id: Option<String>,

    /// Apple ID used by Fastlane
    pub apple_id: Option<String>,

    /// App Store Connect team id
    pub itc_team_id: Option<String>,

    /// Force an Android application id
    pub android_package: Option<String>,

    /// Force an iOS bundle identifier
    pub ios_bundle_id: Option<String>,
}

/// Default base URL for auxiliary templates
pub const DEFAULT_REMOTE_BASE_URL: &str =
    "https://raw.githubusercontent.com/example/gantry/main/crates/gantry-core/templates";

/// Where templates come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Local directory with template overrides
    pub dir: Option<PathBuf>,

    /// Base URL for non-interactive fetches
    pub remote_base_url: String,

    /// Never fetch remote templates
    pub offline: bool,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: None,
            remote_base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
            offline: false,
        }
    }
}

/// Deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Force a deployment mode instead of inspecting the remote
    pub mode: Option<DeploymentMode>,

    /// Git remote to inspect and push tags to
    pub remote: String,

    /// Play track used by the beta lane
    pub beta_track: String,

    /// Play track used by the release lane
    pub release_track: String,

    /// Tag `v<version>` after a successful upload
    pub tag_releases: bool,

    /// Flutter version installed by the workflow
    pub flutter_version: String,

    /// Ruby version installed by the workflow
    pub ruby_version: String,

    /// Java version installed by the Android job
    pub java_version: String,

    /// Fastlane version pinned in the Gemfile
    pub fastlane_version: String,

    /// CocoaPods version pinned in the Gemfile
    pub cocoapods_version: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            mode: None,
            remote: "origin".to_string(),
            beta_track: "internal".to_string(),
            release_track: "production".to_string(),
            tag_releases: true,
            flutter_version: "3.24.5".to_string(),
            ruby_version: "3.2".to_string(),
            java_version: "17".to_string(),
            fastlane_version: "2.225".to_string(),
            cocoapods_version: "1.15".to_string(),
        }
    }
}

/// Release notes configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Group entries by conventional commit type
    pub grouped: bool,

    /// Truncate notes to this many characters
    pub max_length: Option<usize>,

    /// Text used when no commits are found
    pub fallback: String,
}

/// Google Play's release notes limit
pub const PLAY_STORE_NOTES_LIMIT: usize = 500;

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            grouped: false,
            max_length: Some(PLAY_STORE_NOTES_LIMIT),
            fallback: "Bug fixes and improvements".to_string(),
        }
    }
}
