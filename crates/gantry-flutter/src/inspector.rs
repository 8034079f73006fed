//! Flutter project inspection
//!
//! Builds a [`ProjectDescriptor`] from `pubspec.yaml`, the Android Gradle
//! scripts or manifest, the iOS `Info.plist` / Xcode project, and the git
//! remote.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use gantry_core::error::{GantryError, Result};
use gantry_core::project::{ProjectDescriptor, DEFAULT_VERSION};
use gantry_git::GitRepo;

/// Flutter manifest file name
pub const MANIFEST_FILE: &str = "pubspec.yaml";

static NAME_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^name:[ \t]*(.*?)\s*$").expect("Invalid regex"));
static VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^version:[ \t]*(.*?)\s*$").expect("Invalid regex"));

static KTS_APPLICATION_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bapplicationId\s*=\s*"([^"]+)""#).expect("Invalid regex")
});
static KTS_NAMESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bnamespace\s*=\s*"([^"]+)""#).expect("Invalid regex"));
static GROOVY_APPLICATION_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bapplicationId\s*=?\s*["']([^"']+)["']"#).expect("Invalid regex")
});
static MANIFEST_PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bpackage\s*=\s*"([^"]+)""#).expect("Invalid regex"));
static PBX_BUNDLE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"PRODUCT_BUNDLE_IDENTIFIER\s*=\s*"?([^";]+?)"?\s*;"#).expect("Invalid regex")
});

/// Reads project identity from a Flutter project directory
#[derive(Debug, Clone)]
pub struct Inspector {
    remote_name: String,
}

impl Default for Inspector {
    fn default() -> Self {
        Self {
            remote_name: "origin".to_string(),
        }
    }
}

/// Inspect a project with the default settings
pub fn inspect(path: &Path) -> Result<ProjectDescriptor> {
    Inspector::default().inspect(path)
}

impl Inspector {
    /// Create an inspector
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this remote's URL (falling back to the first remote)
    pub fn with_remote(mut self, name: impl Into<String>) -> Self {
        self.remote_name = name.into();
        self
    }

    /// Inspect the project at `path`
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn inspect(&self, path: &Path) -> Result<ProjectDescriptor> {
        let manifest_path = path.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(GantryError::NotAFlutterProject(path.to_path_buf()));
        }
        let manifest = std::fs::read_to_string(&manifest_path)?;

        let name = manifest_value(&NAME_LINE, &manifest).unwrap_or_else(|| directory_name(path));
        let version =
            manifest_value(&VERSION_LINE, &manifest).unwrap_or_else(|| DEFAULT_VERSION.to_string());

        let android_package = detect_android_package(path)
            .unwrap_or_else(|| format!("com.example.{}", name.to_lowercase()));
        let ios_bundle_id = detect_ios_bundle_id(path).unwrap_or_else(|| android_package.clone());

        let mut project = ProjectDescriptor::new(name, version, android_package)
            .with_ios_bundle_id(ios_bundle_id);
        if let Some(url) = self.detect_remote(path) {
            project = project.with_remote(url);
        }

        info!(
            name = %project.name,
            version = %project.version,
            android_package = %project.android_package,
            ios_bundle_id = %project.ios_bundle_id,
            remote = ?project.vcs_remote_url,
            "inspected project"
        );
        Ok(project)
    }

    fn detect_remote(&self, path: &Path) -> Option<String> {
        if !path.join(".git").exists() {
            return None;
        }
        match GitRepo::open(path).and_then(|repo| repo.remote_url_or_first(&self.remote_name)) {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "could not read git remote");
                None
            }
        }
    }
}

/// First match of a top-level manifest key, without quotes or trailing comment
fn manifest_value(pattern: &Regex, manifest: &str) -> Option<String> {
    pattern.captures_iter(manifest).find_map(|caps| {
        let raw = caps.get(1)?.as_str();
        let raw = raw.split(" #").next().unwrap_or(raw);
        let value = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn directory_name(path: &Path) -> String {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "app".to_string())
}

fn first_capture(pattern: &Regex, content: &str) -> Option<String> {
    pattern
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .find(|v| !v.is_empty())
}

fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read file");
            None
        }
    }
}

/// Android application id, in priority order
fn detect_android_package(root: &Path) -> Option<String> {
    let app = root.join("android/app");

    if let Some(kts) = read_optional(&app.join("build.gradle.kts")) {
        if let Some(id) =
            first_capture(&KTS_APPLICATION_ID, &kts).or_else(|| first_capture(&KTS_NAMESPACE, &kts))
        {
            debug!(source = "build.gradle.kts", id = %id, "found android package");
            return Some(id);
        }
    }

    if let Some(groovy) = read_optional(&app.join("build.gradle")) {
        if let Some(id) = first_capture(&GROOVY_APPLICATION_ID, &groovy) {
            debug!(source = "build.gradle", id = %id, "found android package");
            return Some(id);
        }
    }

    let manifest = read_optional(&app.join("src/main/AndroidManifest.xml"))?;
    let id = first_capture(&MANIFEST_PACKAGE, &manifest)?;
    debug!(source = "AndroidManifest.xml", id = %id, "found android package");
    Some(id)
}

/// iOS bundle identifier from `Info.plist`, resolving Xcode build variables
fn detect_ios_bundle_id(root: &Path) -> Option<String> {
    let plist_path: PathBuf = root.join("ios/Runner/Info.plist");
    if !plist_path.is_file() {
        return None;
    }

    let value = match plist::Value::from_file(&plist_path) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %plist_path.display(), error = %e, "could not parse Info.plist");
            return None;
        }
    };

    let bundle_id = value
        .as_dictionary()
        .and_then(|dict| dict.get("CFBundleIdentifier"))
        .and_then(|v| v.as_string())
        .map(str::trim)
        .filter(|v| !v.is_empty())?;

    if bundle_id.contains("$(") {
        let pbxproj = read_optional(&root.join("ios/Runner.xcodeproj/project.pbxproj"))?;
        let resolved = PBX_BUNDLE_ID
            .captures_iter(&pbxproj)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
            .find(|id| !id.is_empty() && !id.contains("RunnerTests") && !id.contains("$("));
        debug!(variable = bundle_id, resolved = ?resolved, "resolved bundle id from Xcode project");
        return resolved;
    }

    Some(bundle_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    const INFO_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleDisplayName</key>
	<string>Demo</string>
	<key>CFBundleIdentifier</key>
	<string>BUNDLE</string>
</dict>
</plist>
"#;

    #[test]
    fn test_missing_manifest() {
        let temp = TempDir::new().unwrap();
        let err = inspect(temp.path()).unwrap_err();
        assert!(matches!(err, GantryError::NotAFlutterProject(_)));
    }

    #[test]
    fn test_end_to_end_groovy_project() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pubspec.yaml", "name: demo_app\nversion: 1.0.0+1\n");
        write(
            temp.path(),
            "android/app/build.gradle",
            "android {\n    defaultConfig {\n        applicationId \"com.acme.demo\"\n    }\n}\n",
        );

        let project = inspect(temp.path()).unwrap();
        assert_eq!(
            project,
            ProjectDescriptor::new("demo_app", "1.0.0+1", "com.acme.demo")
        );
        assert_eq!(project.ios_bundle_id, "com.acme.demo");
        assert!(project.vcs_remote_url.is_none());
    }

    #[test]
    fn test_manifest_defaults() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("MyApp");
        write(&root, "pubspec.yaml", "description: no name here\n");

        let project = inspect(&root).unwrap();
        assert_eq!(project.name, "MyApp");
        assert_eq!(project.version, DEFAULT_VERSION);
        assert_eq!(project.android_package, "com.example.myapp");
        assert_eq!(project.ios_bundle_id, "com.example.myapp");
    }

    #[test]
    fn test_manifest_values_are_trimmed() {
        let manifest = "name: \"quoted_app\"  # the app\nversion: '2.1.0+7'\ndependencies:\n  version: 9.9.9\n";
        assert_eq!(manifest_value(&NAME_LINE, manifest).as_deref(), Some("quoted_app"));
        assert_eq!(manifest_value(&VERSION_LINE, manifest).as_deref(), Some("2.1.0+7"));
    }

    #[test]
    fn test_kotlin_script_wins() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pubspec.yaml", "name: demo_app\n");
        write(
            temp.path(),
            "android/app/build.gradle.kts",
            "android {\n    namespace = \"com.acme.ns\"\n    defaultConfig {\n        applicationId = \"com.acme.kts\"\n    }\n}\n",
        );
        write(temp.path(), "android/app/build.gradle", "applicationId \"com.acme.groovy\"\n");

        assert_eq!(inspect(temp.path()).unwrap().android_package, "com.acme.kts");
    }

    #[test]
    fn test_kotlin_namespace_fallback() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pubspec.yaml", "name: demo_app\n");
        write(
            temp.path(),
            "android/app/build.gradle.kts",
            "android {\n    namespace = \"com.acme.ns\"\n}\n",
        );
        assert_eq!(inspect(temp.path()).unwrap().android_package, "com.acme.ns");
    }

    #[test]
    fn test_android_manifest_fallback() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pubspec.yaml", "name: demo_app\n");
        write(temp.path(), "android/app/build.gradle", "android { }\n");
        write(
            temp.path(),
            "android/app/src/main/AndroidManifest.xml",
            "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\"\n    package=\"com.acme.manifest\">\n</manifest>\n",
        );
        assert_eq!(inspect(temp.path()).unwrap().android_package, "com.acme.manifest");
    }

    #[test]
    fn test_ios_bundle_id_from_plist() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pubspec.yaml", "name: demo_app\n");
        write(temp.path(), "ios/Runner/Info.plist", &INFO_PLIST.replace("BUNDLE", "com.acme.ios"));

        let project = inspect(temp.path()).unwrap();
        assert_eq!(project.ios_bundle_id, "com.acme.ios");
        assert_eq!(project.android_package, "com.example.demo_app");
    }

    #[test]
    fn test_ios_bundle_id_from_xcode_project() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pubspec.yaml", "name: demo_app\n");
        write(
            temp.path(),
            "ios/Runner/Info.plist",
            &INFO_PLIST.replace("BUNDLE", "$(PRODUCT_BUNDLE_IDENTIFIER)"),
        );
        write(
            temp.path(),
            "ios/Runner.xcodeproj/project.pbxproj",
            "\t\t\t\tPRODUCT_BUNDLE_IDENTIFIER = com.acme.demo.RunnerTests;\n\t\t\t\tPRODUCT_BUNDLE_IDENTIFIER = \"com.acme.demo\";\n",
        );

        assert_eq!(inspect(temp.path()).unwrap().ios_bundle_id, "com.acme.demo");
    }

    #[test]
    fn test_unresolved_variable_falls_back_to_package() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pubspec.yaml", "name: demo_app\n");
        write(temp.path(), "android/app/build.gradle", "applicationId \"com.acme.demo\"\n");
        write(
            temp.path(),
            "ios/Runner/Info.plist",
            &INFO_PLIST.replace("BUNDLE", "$(PRODUCT_BUNDLE_IDENTIFIER)"),
        );

        assert_eq!(inspect(temp.path()).unwrap().ios_bundle_id, "com.acme.demo");
    }

    #[test]
    fn test_reads_git_remote() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pubspec.yaml", "name: demo_app\n");
        let repo = git2::Repository::init(temp.path()).unwrap();
        repo.remote("origin", "git@github.com:acme/demo.git").unwrap();

        let project = inspect(temp.path()).unwrap();
        assert_eq!(
            project.vcs_remote_url.as_deref(),
            Some("git@github.com:acme/demo.git")
        );
    }

    #[test]
    fn test_git_without_remote() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pubspec.yaml", "name: demo_app\n");
        git2::Repository::init(temp.path()).unwrap();
        assert!(inspect(temp.path()).unwrap().vcs_remote_url.is_none());
    }
}
