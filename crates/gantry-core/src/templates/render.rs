//! Placeholder substitution
//!
//! Templates use `{{KEY}}` placeholders where `KEY` is upper snake case.
//! Tokens with spaces or a leading `$` (GitHub `${{ secrets.X }}`) are not
//! placeholders and pass through untouched.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::{DeployConfig, ProjectConfig};
use crate::error::TemplateError;
use crate::project::ProjectDescriptor;
use crate::types::DeploymentMode;

use super::TemplateSpec;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$?)\{\{([A-Z][A-Z0-9_]*)\}\}").expect("valid placeholder regex")
});

static LEGACY_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Z][A-Z0-9_]*)\}|([A-Z][A-Z0-9_]*))").expect("valid legacy regex")
});

/// Every key the built-in templates may reference
pub const PLACEHOLDER_KEYS: &[&str] = &[
    "PROJECT_NAME",
    "VERSION",
    "VERSION_NAME",
    "BUILD_NUMBER",
    "PACKAGE_NAME",
    "BUNDLE_ID",
    "TEAM_ID",
    "APPLE_ID",
    "ITC_TEAM_ID",
    "FLUTTER_VERSION",
    "RUBY_VERSION",
    "JAVA_VERSION",
    "FASTLANE_VERSION",
    "COCOAPODS_VERSION",
    "BETA_TRACK",
    "RELEASE_TRACK",
    "DEPLOYMENT_MODE",
    "TESTER_COMMAND",
    "LIVE_COMMAND",
    "GIT_REMOTE",
];

/// Value rendered for a key with no entry, e.g. `YOUR_TEAM_ID`
pub fn sentinel(key: &str) -> String {
    format!("YOUR_{key}")
}

/// Placeholder name to literal value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionMap {
    values: BTreeMap<String, String>,
}

impl SubstitutionMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the map for a project
    ///
    /// Optional identity values (team id, Apple ID) are only present when
    /// configured; rendering falls back to their sentinels.
    pub fn for_project(
        project: &ProjectDescriptor,
        overrides: &ProjectConfig,
        deploy: &DeployConfig,
        mode: DeploymentMode,
    ) -> Self {
        let mut map = Self::new()
            .with("PROJECT_NAME", &project.name)
            .with("VERSION", &project.version)
            .with("VERSION_NAME", project.version_name())
            .with("BUILD_NUMBER", project.build_number().unwrap_or("1"))
            .with("PACKAGE_NAME", &project.android_package)
            .with("BUNDLE_ID", &project.ios_bundle_id)
            .with("FLUTTER_VERSION", &deploy.flutter_version)
            .with("RUBY_VERSION", &deploy.ruby_version)
            .with("JAVA_VERSION", &deploy.java_version)
            .with("FASTLANE_VERSION", &deploy.fastlane_version)
            .with("COCOAPODS_VERSION", &deploy.cocoapods_version)
            .with("BETA_TRACK", &deploy.beta_track)
            .with("RELEASE_TRACK", &deploy.release_track)
            .with("DEPLOYMENT_MODE", mode.as_str())
            .with("GIT_REMOTE", &deploy.remote);

        let (tester, live) = make_wiring(mode, &deploy.remote);
        map.insert("TESTER_COMMAND", tester);
        map.insert("LIVE_COMMAND", live);

        for (key, value) in [
            ("TEAM_ID", &overrides.team_id),
            ("APPLE_ID", &overrides.apple_id),
            ("ITC_TEAM_ID", &overrides.itc_team_id),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                map.insert(key, value);
            }
        }

        map
    }

    /// Set a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Set a value (builder style)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    /// Whether the map has a value for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys from `keys` with no entry
    pub fn missing<'k>(&self, keys: &[&'k str]) -> Vec<&'k str> {
        keys.iter()
            .copied()
            .filter(|k| !self.contains(k))
            .collect()
    }

    /// Iterate over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Makefile recipes for the `tester` and `live` targets
fn make_wiring(mode: DeploymentMode, remote: &str) -> (String, String) {
    match mode {
        DeploymentMode::Local => (
            "gantry lane beta android && gantry lane beta ios".to_string(),
            "gantry lane release android && gantry lane release ios".to_string(),
        ),
        DeploymentMode::GitHubActions => (
            format!(
                "git tag -a \"v$(VERSION)-beta\" -m \"Beta $(VERSION)\" && git push {remote} \"v$(VERSION)-beta\""
            ),
            format!(
                "git tag -a \"v$(VERSION)\" -m \"Release $(VERSION)\" && git push {remote} \"v$(VERSION)\""
            ),
        ),
    }
}

/// Substitute every `{{KEY}}` in `content`
///
/// Keys with no entry in the map render as their sentinel.
pub fn render_template(content: &str, map: &SubstitutionMap) -> String {
    PLACEHOLDER
        .replace_all(content, |caps: &Captures<'_>| {
            if !caps[1].is_empty() {
                return caps[0].to_string();
            }
            let key = &caps[2];
            map.get(key)
                .map(str::to_string)
                .unwrap_or_else(|| sentinel(key))
        })
        .into_owned()
}

/// Rewrite shell-style `$KEY` / `${KEY}` tokens for the given keys as `{{KEY}}`
///
/// Other `$` tokens (`$(VERSION)`, `${{ secrets.X }}`, unknown variables)
/// are left alone.
pub fn normalize_legacy(content: &str, keys: &[&str]) -> String {
    LEGACY_PLACEHOLDER
        .replace_all(content, |caps: &Captures<'_>| {
            let key = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if keys.contains(&key) {
                format!("{{{{{key}}}}}")
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Placeholder names still present in `content`, sorted and deduplicated
pub fn unresolved_placeholders(content: &str) -> Vec<String> {
    let mut names: Vec<String> = PLACEHOLDER
        .captures_iter(content)
        .filter(|caps| caps[1].is_empty())
        .map(|caps| caps[2].to_string())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Check that a template only references the placeholders it declares
pub fn verify_placeholders(spec: &TemplateSpec, content: &str) -> Result<(), TemplateError> {
    let undeclared: Vec<String> = unresolved_placeholders(content)
        .into_iter()
        .filter(|name| !spec.required_placeholders.contains(&name.as_str()))
        .collect();

    if undeclared.is_empty() {
        Ok(())
    } else {
        Err(TemplateError::Unreplaced {
            template: spec.name.to_string(),
            placeholders: undeclared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> ProjectDescriptor {
        ProjectDescriptor::new("demo_app", "1.0.0+1", "com.acme.demo")
    }

    #[test]
    fn test_render_replaces_known_keys() {
        let map = SubstitutionMap::new()
            .with("PROJECT_NAME", "demo_app")
            .with("PACKAGE_NAME", "com.acme.demo");
        let out = render_template("{{PROJECT_NAME}} ({{PACKAGE_NAME}})", &map);
        assert_eq!(out, "demo_app (com.acme.demo)");
    }

    #[test]
    fn test_render_missing_keys_use_sentinels() {
        let out = render_template(
            "team_id(\"{{TEAM_ID}}\") apple_id(\"{{APPLE_ID}}\") {{ITC_TEAM_ID}}",
            &SubstitutionMap::new(),
        );
        assert_eq!(
            out,
            "team_id(\"YOUR_TEAM_ID\") apple_id(\"YOUR_APPLE_ID\") YOUR_ITC_TEAM_ID"
        );
    }

    #[test]
    fn test_render_leaves_github_expressions() {
        let map = SubstitutionMap::new().with("FLUTTER_VERSION", "3.24.5");
        let content = "v: '{{FLUTTER_VERSION}}'\nk: ${{ secrets.KEY }}\nf: ${{FLUTTER_VERSION}}\nx: {{ not a key }}";
        let out = render_template(content, &map);
        assert_eq!(
            out,
            "v: '3.24.5'\nk: ${{ secrets.KEY }}\nf: ${{FLUTTER_VERSION}}\nx: {{ not a key }}"
        );
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let map = SubstitutionMap::new().with("PROJECT_NAME", "{{PACKAGE_NAME}}");
        assert_eq!(render_template("{{PROJECT_NAME}}", &map), "{{PACKAGE_NAME}}");
    }

    #[test]
    fn test_normalize_legacy() {
        let content = "name=$PROJECT_NAME id=${PACKAGE_NAME} v=$(VERSION) s=${{ secrets.X }} o=$HOME p=$PROJECT_NAME_SUFFIX";
        let out = normalize_legacy(content, &["PROJECT_NAME", "PACKAGE_NAME", "VERSION"]);
        assert_eq!(
            out,
            "name={{PROJECT_NAME}} id={{PACKAGE_NAME}} v=$(VERSION) s=${{ secrets.X }} o=$HOME p=$PROJECT_NAME_SUFFIX"
        );
    }

    #[test]
    fn test_unresolved_placeholders() {
        let content = "{{B}} {{A}} {{B}} ${{ secrets.C }} ${{D}} {{lower}}";
        assert_eq!(unresolved_placeholders(content), vec!["A", "B"]);
    }

    #[test]
    fn test_for_project_local_wiring() {
        let map = SubstitutionMap::for_project(
            &demo(),
            &ProjectConfig::default(),
            &DeployConfig::default(),
            DeploymentMode::Local,
        );
        assert_eq!(map.get("PROJECT_NAME"), Some("demo_app"));
        assert_eq!(map.get("BUNDLE_ID"), Some("com.acme.demo"));
        assert_eq!(map.get("VERSION_NAME"), Some("1.0.0"));
        assert_eq!(map.get("BUILD_NUMBER"), Some("1"));
        assert_eq!(map.get("DEPLOYMENT_MODE"), Some("local"));
        assert!(map.get("TESTER_COMMAND").unwrap().contains("gantry lane beta android"));
        assert!(map.get("LIVE_COMMAND").unwrap().contains("gantry lane release ios"));
        assert_eq!(map.missing(&["TEAM_ID", "APPLE_ID", "PROJECT_NAME"]), vec!["TEAM_ID", "APPLE_ID"]);
    }

    #[test]
    fn test_for_project_github_wiring() {
        let overrides = ProjectConfig {
            team_id: Some("ABCDE12345".to_string()),
            apple_id: Some("  ".to_string()),
            ..Default::default()
        };
        let map = SubstitutionMap::for_project(
            &demo(),
            &overrides,
            &DeployConfig::default(),
            DeploymentMode::GitHubActions,
        );
        assert_eq!(map.get("TEAM_ID"), Some("ABCDE12345"));
        assert!(!map.contains("APPLE_ID"));
        assert_eq!(
            map.get("TESTER_COMMAND"),
            Some("git tag -a \"v$(VERSION)-beta\" -m \"Beta $(VERSION)\" && git push origin \"v$(VERSION)-beta\"")
        );
        assert!(map.get("LIVE_COMMAND").unwrap().ends_with("git push origin \"v$(VERSION)\""));
    }
}
