//! Built-in template table

use super::{TemplateSpec, WritePolicy};

const IDENTITY: &[&str] = &["PROJECT_NAME", "PACKAGE_NAME", "BUNDLE_ID"];

static BUILTIN: &[TemplateSpec] = &[
    TemplateSpec {
        name: "makefile",
        source_file: "Makefile.template",
        destination: "Makefile",
        required_placeholders: &[
            "PROJECT_NAME",
            "PACKAGE_NAME",
            "BUNDLE_ID",
            "DEPLOYMENT_MODE",
            "TESTER_COMMAND",
            "LIVE_COMMAND",
        ],
        policy: WritePolicy::SkipIfExists,
        executable: true,
        embedded: include_str!("../../templates/Makefile.template"),
    },
    TemplateSpec {
        name: "gemfile",
        source_file: "Gemfile.template",
        destination: "Gemfile",
        required_placeholders: &[
            "PROJECT_NAME",
            "PACKAGE_NAME",
            "FASTLANE_VERSION",
            "COCOAPODS_VERSION",
        ],
        policy: WritePolicy::SkipIfExists,
        executable: false,
        embedded: include_str!("../../templates/Gemfile.template"),
    },
    TemplateSpec {
        name: "android-appfile",
        source_file: "android-Appfile.template",
        destination: "android/fastlane/Appfile",
        required_placeholders: &["PROJECT_NAME", "PACKAGE_NAME"],
        policy: WritePolicy::SkipIfExists,
        executable: false,
        embedded: include_str!("../../templates/android-Appfile.template"),
    },
    TemplateSpec {
        name: "android-fastfile",
        source_file: "android-Fastfile.template",
        destination: "android/fastlane/Fastfile",
        required_placeholders: &["PROJECT_NAME", "PACKAGE_NAME", "BETA_TRACK", "RELEASE_TRACK"],
        policy: WritePolicy::SkipIfExists,
        executable: false,
        embedded: include_str!("../../templates/android-Fastfile.template"),
    },
    TemplateSpec {
        name: "ios-appfile",
        source_file: "ios-Appfile.template",
        destination: "ios/fastlane/Appfile",
        required_placeholders: &["PROJECT_NAME", "BUNDLE_ID", "TEAM_ID", "APPLE_ID", "ITC_TEAM_ID"],
        policy: WritePolicy::SkipIfExists,
        executable: false,
        embedded: include_str!("../../templates/ios-Appfile.template"),
    },
    TemplateSpec {
        name: "ios-fastfile",
        source_file: "ios-Fastfile.template",
        destination: "ios/fastlane/Fastfile",
        required_placeholders: IDENTITY,
        policy: WritePolicy::SkipIfExists,
        executable: false,
        embedded: include_str!("../../templates/ios-Fastfile.template"),
    },
    TemplateSpec {
        name: "ios-export-options",
        source_file: "ExportOptions.plist.template",
        destination: "ios/ExportOptions.plist",
        required_placeholders: &["PROJECT_NAME", "BUNDLE_ID", "TEAM_ID"],
        policy: WritePolicy::SkipIfExists,
        executable: false,
        embedded: include_str!("../../templates/ExportOptions.plist.template"),
    },
    TemplateSpec {
        name: "workflow",
        source_file: "deploy.yml.template",
        destination: ".github/workflows/deploy.yml",
        required_placeholders: &[
            "PROJECT_NAME",
            "PACKAGE_NAME",
            "BUNDLE_ID",
            "FLUTTER_VERSION",
            "RUBY_VERSION",
            "JAVA_VERSION",
        ],
        policy: WritePolicy::Overwrite,
        executable: false,
        embedded: include_str!("../../templates/deploy.yml.template"),
    },
    TemplateSpec {
        name: "project-config",
        source_file: "project.config.template",
        destination: "project.config",
        required_placeholders: &[
            "PROJECT_NAME",
            "VERSION",
            "PACKAGE_NAME",
            "BUNDLE_ID",
            "TEAM_ID",
            "APPLE_ID",
            "ITC_TEAM_ID",
            "DEPLOYMENT_MODE",
        ],
        policy: WritePolicy::SkipIfExists,
        executable: false,
        embedded: include_str!("../../templates/project.config.template"),
    },
    TemplateSpec {
        name: "gitignore",
        source_file: "gitignore.template",
        destination: ".gitignore",
        required_placeholders: &[],
        policy: WritePolicy::AppendMissingLines,
        executable: false,
        embedded: include_str!("../../templates/gitignore.template"),
    },
];

/// Registry of template specs
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<TemplateSpec>,
}

impl TemplateRegistry {
    /// Create a registry with all built-in templates
    pub fn new() -> Self {
        Self {
            templates: BUILTIN.to_vec(),
        }
    }

    /// Get a template by name or destination
    pub fn get(&self, name: &str) -> Option<&TemplateSpec> {
        self.templates
            .iter()
            .find(|t| t.name == name || t.destination == name)
    }

    /// All registered templates, in write order
    pub fn all(&self) -> &[TemplateSpec] {
        &self.templates
    }

    /// Source file names, as fetched from the remote base URL
    pub fn source_files(&self) -> Vec<&'static str> {
        self.templates.iter().map(|t| t.source_file).collect()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins() {
        let registry = TemplateRegistry::new();
        assert_eq!(registry.all().len(), 10);
        assert_eq!(
            registry.get("Makefile").map(|t| t.name),
            Some("makefile")
        );
        assert_eq!(
            registry.get("workflow").unwrap().policy,
            WritePolicy::Overwrite
        );
        assert!(registry.get("makefile").unwrap().executable);
        assert!(registry.source_files().contains(&"deploy.yml.template"));
    }

    #[test]
    fn test_policies() {
        let registry = TemplateRegistry::new();
        for name in ["makefile", "gemfile", "android-fastfile", "ios-appfile", "project-config"] {
            assert_eq!(registry.get(name).unwrap().policy, WritePolicy::SkipIfExists);
        }
        assert_eq!(
            registry.get(".gitignore").unwrap().policy,
            WritePolicy::AppendMissingLines
        );
    }
}
