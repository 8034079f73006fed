//! `project.config` - flat `KEY=VALUE` identity file
//!
//! Written once by the renderer, then edited by the operator. Later runs read
//! it back so values filled in by hand (team id, Apple ID) survive.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use super::types::ProjectConfig;
use crate::error::{ConfigError, Result};

/// Parsed `project.config`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectConfigFile {
    entries: BTreeMap<String, String>,
}

impl ProjectConfigFile {
    /// Parse file content
    ///
    /// Blank lines and `#` comments are ignored, surrounding quotes are
    /// stripped from values, and an optional leading `export ` is accepted.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut entries = BTreeMap::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::MalformedLine {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    content: raw.to_string(),
                }
                .into());
            };

            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(ConfigError::MalformedLine {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    content: raw.to_string(),
                }
                .into());
            }

            entries.insert(key.to_string(), unquote(value.trim()).to_string());
        }

        Ok(Self { entries })
    }

    /// Load from disk; a missing file is `Ok(None)`
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let file = Self::parse(&content, path)?;
        debug!(path = %path.display(), entries = file.entries.len(), "loaded project.config");
        Ok(Some(file))
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    /// Get a value that the operator has actually filled in
    ///
    /// Empty values and `YOUR_...` sentinels count as unset.
    pub fn get_filled(&self, key: &str) -> Option<&str> {
        self.get(key)
            .filter(|v| !v.is_empty() && !v.starts_with("YOUR_"))
    }

    /// Fill identity values that `config` leaves unset
    pub fn fill_gaps(&self, config: &mut ProjectConfig) {
        for (key, slot) in [
            ("TEAM_ID", &mut config.team_id),
            ("APPLE_ID", &mut config.apple_id),
            ("ITC_TEAM_ID", &mut config.itc_team_id),
            ("PACKAGE_NAME", &mut config.android_package),
            ("BUNDLE_ID", &mut config.ios_bundle_id),
        ] {
            if slot.is_none() {
                *slot = self.get_filled(key).map(str::to_string);
            }
        }
    }

    /// All entries
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let content = r#"
# Project identity
PROJECT_NAME=demo_app
PACKAGE_NAME="com.acme.demo"
export TEAM_ID='ABCDE12345'
APPLE_ID=YOUR_APPLE_ID
EMPTY=
"#;
        let file = ProjectConfigFile::parse(content, Path::new("project.config")).unwrap();
        assert_eq!(file.get("PROJECT_NAME"), Some("demo_app"));
        assert_eq!(file.get("PACKAGE_NAME"), Some("com.acme.demo"));
        assert_eq!(file.get_filled("TEAM_ID"), Some("ABCDE12345"));
        assert_eq!(file.get("APPLE_ID"), Some("YOUR_APPLE_ID"));
        assert!(file.get_filled("APPLE_ID").is_none());
        assert!(file.get_filled("EMPTY").is_none());
        assert_eq!(file.entries().count(), 5);
    }

    #[test]
    fn test_malformed_line() {
        let err = ProjectConfigFile::parse("NAME=ok\njust words\n", Path::new("project.config"))
            .unwrap_err();
        assert!(err.to_string().contains("project.config:2"));
    }

    #[test]
    fn test_fill_gaps_keeps_explicit_config() {
        let file = ProjectConfigFile::parse(
            "TEAM_ID=FROMFILE\nAPPLE_ID=YOUR_APPLE_ID\nITC_TEAM_ID=42\n",
            Path::new("project.config"),
        )
        .unwrap();
        let mut config = ProjectConfig {
            team_id: Some("FROMTOML".to_string()),
            ..Default::default()
        };
        file.fill_gaps(&mut config);
        assert_eq!(config.team_id.as_deref(), Some("FROMTOML"));
        assert_eq!(config.apple_id, None);
        assert_eq!(config.itc_team_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_load_missing() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(ProjectConfigFile::load(&temp.path().join("project.config"))
            .unwrap()
            .is_none());
    }
}
