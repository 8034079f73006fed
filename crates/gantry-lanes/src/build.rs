//! `flutter build` for store artifacts

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use gantry_core::error::Result;
use gantry_core::{BuildProfile, CommandRunner, CommandSpec, Platform};
use gantry_flutter::locate_artifact;

/// Export options passed to `flutter build ipa`
pub const EXPORT_OPTIONS_ARG: &str = "--export-options-plist=ios/ExportOptions.plist";

/// The `flutter build` command for a platform
pub fn build_command(root: &Path, platform: Platform, profile: BuildProfile) -> CommandSpec {
    let spec = CommandSpec::new("flutter").arg("build").current_dir(root);
    match platform {
        Platform::Android => spec.args(["appbundle", profile.flag()]),
        Platform::Ios => spec.args(["ipa", profile.flag(), EXPORT_OPTIONS_ARG]),
    }
}

/// Build and return the artifact path
///
/// Fails with `ArtifactNotFound` when flutter exits zero but the bundle or
/// IPA is not where it should be.
#[instrument(skip(runner), fields(root = %root.display(), platform = %platform, profile = %profile))]
pub fn build<R: CommandRunner + ?Sized>(
    runner: &R,
    root: &Path,
    platform: Platform,
    profile: BuildProfile,
) -> Result<PathBuf> {
    let output = runner.run_checked(&build_command(root, platform, profile))?;
    let artifact = locate_artifact(root, platform, profile)?;
    info!(
        artifact = %artifact.display(),
        duration_ms = output.duration.as_millis() as u64,
        "build finished"
    );
    Ok(artifact)
}
