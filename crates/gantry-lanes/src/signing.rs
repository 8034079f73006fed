//! Signing setup and the transient secret file guard

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use gantry_core::error::{GantryError, Result};
use gantry_core::{Environment, Platform};

use crate::credentials::{AndroidCredentials, IosCredentials};

/// Keystore file name, relative to `android/app`
pub const KEYSTORE_FILE: &str = "upload-keystore.jks";

/// Files `setup_signing(Android)` writes, relative to the project root
pub const ANDROID_SECRET_FILES: &[&str] = &[
    "android/app/upload-keystore.jks",
    "android/key.properties",
    "android/fastlane/play-store-credentials.json",
];

/// Fixed-name files `setup_signing(Ios)` writes; `AuthKey_<id>.p8` comes on top
pub const IOS_SECRET_FILES: &[&str] = &[
    "ios/fastlane/api_key.json",
    "ios/fastlane/dist-cert.p12",
    "ios/fastlane/profile.mobileprovision",
];

/// Suffix for operator files set aside while gantry's copy is in place
pub const BACKUP_SUFFIX: &str = ".gantry-backup";

/// `<path>.gantry-backup`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Deletes the secret files it wrote when dropped
///
/// A file that already existed at a destination is moved to its backup path
/// first and moved back on drop, so operator-managed signing files survive
/// the lane.
#[derive(Debug, Default)]
#[must_use = "secret files are removed as soon as the guard is dropped"]
pub struct SecretFiles {
    paths: Vec<PathBuf>,
    /// Destinations whose original content sits at `backup_path`
    backups: Vec<PathBuf>,
}

impl SecretFiles {
    /// Create an empty guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `content` to `path` and take ownership of the file
    pub fn write(&mut self, path: PathBuf, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if path.symlink_metadata().is_ok() {
            let backup = backup_path(&path);
            if backup.symlink_metadata().is_ok() {
                return Err(GantryError::other(format!(
                    "{} exists from an earlier run; restore or remove it first",
                    backup.display()
                )));
            }
            std::fs::rename(&path, &backup)?;
            info!(path = %path.display(), backup = %backup.display(), "set aside existing file");
            self.backups.push(path.clone());
        }

        self.paths.push(path.clone());
        write_private(&path, content)?;
        debug!(path = %path.display(), "wrote secret file");
        Ok(())
    }

    /// Files currently owned by the guard
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Release the files so they outlive the guard
    ///
    /// Originals that were set aside stay at their backup path until
    /// [`crate::clean`] restores them.
    pub fn keep(mut self) -> Vec<PathBuf> {
        for path in std::mem::take(&mut self.backups) {
            warn!(
                path = %path.display(),
                backup = %backup_path(&path).display(),
                "original file stays set aside until clean"
            );
        }
        std::mem::take(&mut self.paths)
    }
}

impl Drop for SecretFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "removed secret file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove secret file"),
            }
        }
        for path in &self.backups {
            if let Err(e) = restore_backup(path) {
                warn!(path = %path.display(), error = %e, "failed to restore original file");
            }
        }
    }
}

/// Move `<path>.gantry-backup` back to `path`; false when there is no backup
pub(crate) fn restore_backup(path: &Path) -> std::io::Result<bool> {
    let backup = backup_path(path);
    if backup.symlink_metadata().is_err() {
        return Ok(false);
    }
    std::fs::rename(&backup, path)?;
    debug!(path = %path.display(), "restored original file");
    Ok(true)
}

/// Create `path` readable by the owner only; the mode is set at creation
fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(content)?;
    Ok(())
}

#[derive(Serialize)]
struct ApiKeyFile<'a> {
    key_id: &'a str,
    issuer_id: &'a str,
    key: &'a str,
    in_house: bool,
}

/// `ios/fastlane/AuthKey_<id>.p8`
pub fn auth_key_path(root: &Path, key_id: &str) -> PathBuf {
    root.join("ios/fastlane").join(format!("AuthKey_{key_id}.p8"))
}

/// Decode credentials from `env` and write the platform's signing files
///
/// All variables are checked before the first file is written.
#[instrument(skip(env), fields(root = %root.display(), platform = %platform))]
pub fn setup_signing(root: &Path, platform: Platform, env: &Environment) -> Result<SecretFiles> {
    let mut files = SecretFiles::new();

    match platform {
        Platform::Android => {
            let creds = AndroidCredentials::from_env(env)?;
            files.write(root.join(ANDROID_SECRET_FILES[0]), &creds.keystore)?;
            files.write(
                root.join(ANDROID_SECRET_FILES[1]),
                creds.key_properties(KEYSTORE_FILE).as_bytes(),
            )?;
            files.write(root.join(ANDROID_SECRET_FILES[2]), &creds.play_store_json)?;
        }
        Platform::Ios => {
            let creds = IosCredentials::from_env(env)?;
            let api_key = serde_json::to_string_pretty(&ApiKeyFile {
                key_id: &creds.key_id,
                issuer_id: &creds.issuer_id,
                key: &creds.key_content,
                in_house: false,
            })?;

            files.write(auth_key_path(root, &creds.key_id), creds.key_content.as_bytes())?;
            files.write(root.join(IOS_SECRET_FILES[0]), api_key.as_bytes())?;
            if let Some(cert) = &creds.dist_cert {
                files.write(root.join(IOS_SECRET_FILES[1]), cert)?;
            }
            if let Some(profile) = &creds.provisioning_profile {
                files.write(root.join(IOS_SECRET_FILES[2]), profile)?;
            }
        }
    }

    info!(count = files.paths().len(), "signing files written");
    Ok(files)
}
