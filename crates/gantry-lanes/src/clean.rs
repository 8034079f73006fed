//! Best-effort removal of build output and leftover credentials

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use gantry_core::Platform;
use gantry_flutter::build_output_dirs;

use crate::signing::{restore_backup, ANDROID_SECRET_FILES, IOS_SECRET_FILES};

fn credential_files(root: &Path, platform: Platform) -> Vec<PathBuf> {
    match platform {
        Platform::Android => ANDROID_SECRET_FILES.iter().map(|r| root.join(r)).collect(),
        Platform::Ios => {
            let mut files: Vec<PathBuf> = IOS_SECRET_FILES.iter().map(|r| root.join(r)).collect();
            if let Ok(entries) = std::fs::read_dir(root.join("ios/fastlane")) {
                files.extend(entries.flatten().map(|e| e.path()).filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with("AuthKey_") && n.ends_with(".p8"))
                        .unwrap_or(false)
                }));
            }
            files
        }
    }
}

/// Remove build output dirs and credential files; returns what was removed
///
/// Missing paths are skipped and removal errors only warn. Operator files
/// set aside by a kept signing setup are moved back into place.
pub fn clean(root: &Path, platform: Platform) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    for dir in build_output_dirs(root, platform) {
        if !dir.is_dir() {
            continue;
        }
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => removed.push(dir),
            Err(e) => warn!(path = %dir.display(), error = %e, "could not remove directory"),
        }
    }

    for file in credential_files(root, platform) {
        if file.is_file() {
            match std::fs::remove_file(&file) {
                Ok(()) => {
                    debug!(path = %file.display(), "removed credential file");
                    removed.push(file.clone());
                }
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "could not remove file");
                    continue;
                }
            }
        }
        match restore_backup(&file) {
            Ok(true) => info!(path = %file.display(), "restored original file"),
            Ok(false) => {}
            Err(e) => warn!(path = %file.display(), error = %e, "could not restore original file"),
        }
    }

    info!(platform = %platform, count = removed.len(), "clean finished");
    removed
}
