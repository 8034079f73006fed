//! Build output locations

use std::path::{Path, PathBuf};

use tracing::debug;

use gantry_core::error::{GantryError, Result};
use gantry_core::types::{BuildProfile, Platform};

/// `build/app/outputs/bundle/<profile>/app-<profile>.aab`
pub fn android_bundle_path(root: &Path, profile: BuildProfile) -> PathBuf {
    root.join("build/app/outputs/bundle")
        .join(profile.as_str())
        .join(format!("app-{}.aab", profile.as_str()))
}

/// Directory `flutter build ipa` writes to
pub fn ipa_dir(root: &Path) -> PathBuf {
    root.join("build/ios/ipa")
}

/// First `.ipa` in the IPA directory, by file name
pub fn find_ipa(root: &Path) -> Option<PathBuf> {
    let mut ipas: Vec<PathBuf> = std::fs::read_dir(ipa_dir(root))
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.extension().map(|e| e == "ipa").unwrap_or(false))
        .collect();
    ipas.sort();
    ipas.into_iter().next()
}

/// Artifact a build for `platform` must produce
pub fn locate_artifact(root: &Path, platform: Platform, profile: BuildProfile) -> Result<PathBuf> {
    let found = match platform {
        Platform::Android => {
            let path = android_bundle_path(root, profile);
            path.is_file().then_some(path)
        }
        Platform::Ios => find_ipa(root),
    };

    match found {
        Some(path) => {
            debug!(platform = %platform, path = %path.display(), "found artifact");
            Ok(path)
        }
        None => Err(GantryError::ArtifactNotFound {
            expected_path: match platform {
                Platform::Android => android_bundle_path(root, profile),
                Platform::Ios => ipa_dir(root).join("*.ipa"),
            },
        }),
    }
}

/// Build output directories removed by `clean`
pub fn build_output_dirs(root: &Path, platform: Platform) -> Vec<PathBuf> {
    let rel: &[&str] = match platform {
        Platform::Android => &["build/app", "android/app/build", "android/build", "android/.gradle"],
        Platform::Ios => &["build/ios", "ios/build", "ios/DerivedData"],
    };
    rel.iter().map(|r| root.join(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_android_bundle_path() {
        let path = android_bundle_path(Path::new("/p"), BuildProfile::Release);
        assert_eq!(path, PathBuf::from("/p/build/app/outputs/bundle/release/app-release.aab"));
    }

    #[test]
    fn test_missing_artifact() {
        let temp = TempDir::new().unwrap();
        let err = locate_artifact(temp.path(), Platform::Android, BuildProfile::Release).unwrap_err();
        match err {
            GantryError::ArtifactNotFound { expected_path } => {
                assert!(expected_path.ends_with("bundle/release/app-release.aab"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(locate_artifact(temp.path(), Platform::Ios, BuildProfile::Release).is_err());
    }

    #[test]
    fn test_finds_first_ipa() {
        let temp = TempDir::new().unwrap();
        let dir = ipa_dir(temp.path());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Runner.ipa"), b"ipa").unwrap();
        std::fs::write(dir.join("ExportOptions.plist"), b"plist").unwrap();
        std::fs::write(dir.join("Demo.ipa"), b"ipa").unwrap();

        let found = locate_artifact(temp.path(), Platform::Ios, BuildProfile::Release).unwrap();
        assert_eq!(found, dir.join("Demo.ipa"));
    }

    #[test]
    fn test_build_output_dirs_are_per_platform() {
        let root = Path::new("/p");
        assert!(build_output_dirs(root, Platform::Android).contains(&root.join("build/app")));
        assert!(!build_output_dirs(root, Platform::Ios).contains(&root.join("build/app")));
    }
}
