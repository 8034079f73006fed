//! Error types for gantry

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using GantryError
pub type Result<T> = std::result::Result<T, GantryError>;

/// Main error type for gantry operations
#[derive(Debug, Error)]
pub enum GantryError {
    /// The target directory has no `pubspec.yaml`
    #[error("Not a Flutter project: no pubspec.yaml found in {0}")]
    NotAFlutterProject(PathBuf),

    /// A required environment variable is absent
    #[error("Missing required {platform} credential: {variable} is not set")]
    MissingCredential { platform: String, variable: String },

    /// A credential is present but cannot be used (bad base64, empty value)
    #[error("Invalid {platform} credential {variable}: {reason}")]
    InvalidCredential {
        platform: String,
        variable: String,
        reason: String,
    },

    /// Build finished but the expected output is missing
    #[error("Expected artifact not found at {expected_path}")]
    ArtifactNotFound { expected_path: PathBuf },

    /// Remote template download failed
    #[error("Failed to fetch {url}: {reason}")]
    NetworkFetchFailed { url: String, reason: String },

    /// A shelled-out command exited non-zero or could not be spawned
    #[error("Command failed: {command} (exit code {})", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()))]
    ExternalToolFailure {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Operation is not available on the platform
    #[error("{operation} is not supported on {platform}")]
    UnsupportedPlatform { operation: String, platform: String },

    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Template-related errors
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Malformed line in a `KEY=VALUE` file
    #[error("{path}:{line}: expected KEY=VALUE, found '{content}'")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found
    #[error("Git repository not found at {0}")]
    RepositoryNotFound(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// No commits found
    #[error("No commits found in repository")]
    NoCommits,

    /// Tag already exists
    #[error("Tag already exists: {0}")]
    TagExists(String),

    /// Failed to push
    #[error("Failed to push to remote: {0}")]
    PushFailed(String),

    /// Remote not found
    #[error("Remote not found: {0}")]
    RemoteNotFound(String),

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Manifest has no version line
    #[error("No version field found in {0}")]
    MissingVersion(PathBuf),

    /// Failed to parse version
    #[error("Failed to parse version '{0}': {1}")]
    ParseFailed(String, String),

    /// Invalid bump kind
    #[error("Invalid bump kind: {0} (expected major, minor, patch or build)")]
    InvalidBumpKind(String),

    /// Semver error
    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),
}

/// Template-related errors
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template registered under this name
    #[error("Unknown template: {0}")]
    Unknown(String),

    /// Rendered output still contains placeholders
    #[error("Unreplaced placeholders in {template}: {placeholders:?}")]
    Unreplaced {
        template: String,
        placeholders: Vec<String>,
    },

    /// Failed to write the rendered file
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GantryError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Create a missing credential error
    pub fn missing_credential(platform: impl Into<String>, variable: impl Into<String>) -> Self {
        Self::MissingCredential {
            platform: platform.into(),
            variable: variable.into(),
        }
    }

    /// Whether the pipeline should carry on after this error with a warning
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NetworkFetchFailed { .. })
    }
}
