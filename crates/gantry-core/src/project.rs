//! Project identity shared by the inspector, renderer and lanes

use serde::{Deserialize, Serialize};

use crate::config::ProjectConfig;

/// Version used when the manifest has no `version:` line
pub const DEFAULT_VERSION: &str = "1.0.0+1";

/// What the inspector learned about a Flutter project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    /// Manifest `name:` (or the directory name)
    pub name: String,
    /// Full version string, e.g. `1.2.3+4`
    pub version: String,
    /// Android application id
    pub android_package: String,
    /// iOS bundle identifier
    pub ios_bundle_id: String,
    /// URL of the VCS remote, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_remote_url: Option<String>,
}

impl ProjectDescriptor {
    /// Create a descriptor with the iOS bundle id defaulting to the Android package
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        android_package: impl Into<String>,
    ) -> Self {
        let android_package = android_package.into();
        Self {
            name: name.into(),
            version: version.into(),
            ios_bundle_id: android_package.clone(),
            android_package,
            vcs_remote_url: None,
        }
    }

    /// Set the iOS bundle identifier
    pub fn with_ios_bundle_id(mut self, bundle_id: impl Into<String>) -> Self {
        self.ios_bundle_id = bundle_id.into();
        self
    }

    /// Set the remote URL
    pub fn with_remote(mut self, url: impl Into<String>) -> Self {
        self.vcs_remote_url = Some(url.into());
        self
    }

    /// Version without the build number (`1.2.3`)
    pub fn version_name(&self) -> &str {
        self.version
            .split_once('+')
            .map(|(name, _)| name)
            .unwrap_or(&self.version)
    }

    /// Build number after `+`, if any
    pub fn build_number(&self) -> Option<&str> {
        self.version
            .split_once('+')
            .map(|(_, build)| build)
            .filter(|b| !b.is_empty())
    }

    /// Apply identity overrides from configuration
    pub fn with_overrides(mut self, overrides: &ProjectConfig) -> Self {
        if let Some(package) = &overrides.android_package {
            self.android_package = package.clone();
        }
        if let Some(bundle_id) = &overrides.ios_bundle_id {
            self.ios_bundle_id = bundle_id.clone();
        }
        self
    }
}
