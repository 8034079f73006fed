//! Pubspec version handling
//!
//! Flutter versions are `MAJOR.MINOR.PATCH+BUILD`. The build number feeds
//! `versionCode` / `CFBundleVersion`, so every bump increments it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use semver::Version;
use tracing::{info, instrument};

use gantry_core::error::{Result, VersionError};
use gantry_core::types::BumpKind;

/// A parsed pubspec version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlutterVersion {
    /// `MAJOR.MINOR.PATCH` (pre-release kept, build metadata unused)
    pub version: Version,
    /// Build number after `+`; absent counts as 0
    pub build: u64,
}

impl FlutterVersion {
    /// Return the bumped version
    pub fn bump(&self, kind: BumpKind) -> Self {
        let mut version = self.version.clone();
        match kind {
            BumpKind::Major => {
                version.major += 1;
                version.minor = 0;
                version.patch = 0;
                version.pre = semver::Prerelease::EMPTY;
            }
            BumpKind::Minor => {
                version.minor += 1;
                version.patch = 0;
                version.pre = semver::Prerelease::EMPTY;
            }
            BumpKind::Patch => {
                version.patch += 1;
                version.pre = semver::Prerelease::EMPTY;
            }
            BumpKind::Build => {}
        }

        Self {
            version,
            build: self.build + 1,
        }
    }
}

impl FromStr for FlutterVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (core, build) = match s.split_once('+') {
            Some((core, build)) => (core, Some(build)),
            None => (s, None),
        };

        let version = Version::parse(core)?;
        let build = match build {
            Some(b) => b
                .parse::<u64>()
                .map_err(|e| VersionError::ParseFailed(s.to_string(), e.to_string()))?,
            None => 0,
        };

        Ok(Self { version, build })
    }
}

impl fmt::Display for FlutterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.version, self.build)
    }
}

/// Top-level `version:` key only; indented ones belong to dependencies
fn is_version_line(line: &str) -> bool {
    line.starts_with("version:")
}

fn version_value(line: &str) -> &str {
    let value = line.trim_start_matches("version:");
    let value = value.split(" #").next().unwrap_or(value);
    value.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// Read the version string from a pubspec
pub fn read_version(pubspec: &Path) -> Result<String> {
    let content = std::fs::read_to_string(pubspec)?;
    content
        .lines()
        .find(|l| is_version_line(l))
        .map(|l| version_value(l).to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| VersionError::MissingVersion(pubspec.to_path_buf()).into())
}

/// Rewrite the top-level version line, keeping its line ending
pub fn set_version(pubspec: &Path, version: &str) -> Result<()> {
    let content = std::fs::read_to_string(pubspec)?;

    let mut new_content = String::with_capacity(content.len());
    let mut found = false;

    for line in content.split_inclusive('\n') {
        if !found && is_version_line(line) {
            let ending = if line.ends_with("\r\n") {
                "\r\n"
            } else if line.ends_with('\n') {
                "\n"
            } else {
                ""
            };
            new_content.push_str("version: ");
            new_content.push_str(version);
            new_content.push_str(ending);
            found = true;
        } else {
            new_content.push_str(line);
        }
    }

    if !found {
        return Err(VersionError::MissingVersion(pubspec.to_path_buf()).into());
    }

    std::fs::write(pubspec, new_content)?;
    Ok(())
}

/// Bump the pubspec version and return the new version string
#[instrument(fields(pubspec = %pubspec.display(), kind = %kind))]
pub fn bump_version(pubspec: &Path, kind: BumpKind) -> Result<String> {
    let current: FlutterVersion = read_version(pubspec)?.parse()?;
    let next = current.bump(kind).to_string();
    set_version(pubspec, &next)?;
    info!(from = %current, to = %next, "bumped version");
    Ok(next)
}
