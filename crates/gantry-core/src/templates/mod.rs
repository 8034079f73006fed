//! CI/CD file templates
//!
//! Generates the Fastlane, Makefile, GitHub Actions and signing files a
//! Flutter project needs. Each file kind is a [`TemplateSpec`]; the
//! [`Renderer`] resolves its source, substitutes placeholders and writes it
//! according to its [`WritePolicy`].

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::error::{GantryError, Result, TemplateError};

mod registry;
pub mod remote;
mod render;

pub use registry::TemplateRegistry;
pub use remote::{should_fetch, FetchReport, RemoteFetcher};
pub use render::{
    normalize_legacy, render_template, sentinel, unresolved_placeholders, verify_placeholders,
    SubstitutionMap, PLACEHOLDER_KEYS,
};

/// What to do when the destination already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Operator-editable file; never touched once present
    SkipIfExists,
    /// Regenerated on every run
    Overwrite,
    /// Line-based file; missing lines are appended
    AppendMissingLines,
}

/// A generated file kind
#[derive(Debug, Clone, Copy)]
pub struct TemplateSpec {
    /// Short name, e.g. `android-fastfile`
    pub name: &'static str,
    /// File name in template directories and at the remote base URL
    pub source_file: &'static str,
    /// Destination relative to the project root
    pub destination: &'static str,
    /// Placeholders the template may reference
    pub required_placeholders: &'static [&'static str],
    /// Write policy
    pub policy: WritePolicy,
    /// Mark the written file executable
    pub executable: bool,
    /// Built-in content
    pub embedded: &'static str,
}

/// Where a template's content came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOrigin {
    /// Operator template directory
    Directory(PathBuf),
    /// Downloaded this run
    Remote,
    /// Compiled into the binary
    Embedded,
}

impl fmt::Display for TemplateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(dir) => write!(f, "{}", dir.display()),
            Self::Remote => write!(f, "remote"),
            Self::Embedded => write!(f, "built-in"),
        }
    }
}

/// Result of writing one file
#[derive(Debug)]
pub enum RenderOutcome {
    /// File created or overwritten
    Written,
    /// Destination existed and was left alone
    Skipped,
    /// This many missing lines were appended
    Appended(usize),
    /// Writing failed; the rest of the batch still ran
    Failed(GantryError),
}

impl RenderOutcome {
    /// Whether this file failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Per-file report from [`Renderer::render_all`]
#[derive(Debug)]
pub struct FileReport {
    /// Template name
    pub template: &'static str,
    /// Absolute destination path
    pub destination: PathBuf,
    /// Content source
    pub origin: TemplateOrigin,
    /// What happened
    pub outcome: RenderOutcome,
}

/// Directories searched before the embedded templates
#[derive(Debug, Clone, Default)]
pub struct TemplateSources {
    /// Operator template directory
    pub dir: Option<PathBuf>,
    /// Directory holding files fetched this run
    pub fetched: Option<PathBuf>,
}

/// Renders the registered templates into a project
#[derive(Debug, Default)]
pub struct Renderer {
    registry: TemplateRegistry,
    sources: TemplateSources,
}

impl Renderer {
    /// Create a renderer over the built-in templates
    pub fn new(sources: TemplateSources) -> Self {
        Self {
            registry: TemplateRegistry::new(),
            sources,
        }
    }

    /// Create a renderer with a custom registry
    pub fn with_registry(registry: TemplateRegistry, sources: TemplateSources) -> Self {
        Self { registry, sources }
    }

    /// The registry in use
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Load a template's source text
    ///
    /// External copies have legacy `$KEY` tokens normalized. Unreadable
    /// external files fall through to the next source.
    pub fn resolve(&self, spec: &TemplateSpec) -> (String, TemplateOrigin) {
        let candidates = [
            self.sources
                .dir
                .as_ref()
                .map(|d| (d.join(spec.source_file), TemplateOrigin::Directory(d.clone()))),
            self.sources
                .fetched
                .as_ref()
                .map(|d| (d.join(spec.source_file), TemplateOrigin::Remote)),
        ];

        for (path, origin) in candidates.into_iter().flatten() {
            if !path.is_file() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    debug!(template = spec.name, source = %path.display(), "using external template");
                    return (normalize_legacy(&content, spec.required_placeholders), origin);
                }
                Err(e) => {
                    warn!(
                        template = spec.name,
                        path = %path.display(),
                        error = %e,
                        "unreadable template, falling back"
                    )
                }
            }
        }

        (spec.embedded.to_string(), TemplateOrigin::Embedded)
    }

    /// Render a single template to a string
    pub fn render(&self, name: &str, map: &SubstitutionMap) -> Result<String> {
        let spec = self
            .registry
            .get(name)
            .ok_or_else(|| TemplateError::Unknown(name.to_string()))?;
        let (source, _) = self.resolve(spec);
        Ok(render_template(&source, map))
    }

    /// Render every template into `target`
    ///
    /// One file failing does not stop the others.
    #[instrument(skip(self, map), fields(target = %target.display()))]
    pub fn render_all(&self, target: &Path, map: &SubstitutionMap) -> Vec<FileReport> {
        self.registry
            .all()
            .iter()
            .map(|spec| {
                let (source, origin) = self.resolve(spec);
                let destination = target.join(spec.destination);
                let content = render_template(&source, map);
                let outcome = match write_rendered(spec, &destination, &content) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(template = spec.name, error = %e, "failed to write template");
                        RenderOutcome::Failed(e)
                    }
                };
                info!(template = spec.name, outcome = ?outcome, "template processed");
                FileReport {
                    template: spec.name,
                    destination,
                    origin,
                    outcome,
                }
            })
            .collect()
    }
}

fn write_failed(path: &Path, source: std::io::Error) -> GantryError {
    TemplateError::WriteFailed {
        path: path.to_path_buf(),
        source,
    }
    .into()
}

/// Write rendered content according to the spec's policy
pub fn write_rendered(spec: &TemplateSpec, path: &Path, content: &str) -> Result<RenderOutcome> {
    let exists = path.exists();

    let outcome = match (spec.policy, exists) {
        (WritePolicy::SkipIfExists, true) => return Ok(RenderOutcome::Skipped),
        (WritePolicy::AppendMissingLines, true) => {
            let added = append_missing_lines(path, content)?;
            return Ok(if added == 0 {
                RenderOutcome::Skipped
            } else {
                RenderOutcome::Appended(added)
            });
        }
        _ => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| write_failed(path, e))?;
            }
            std::fs::write(path, content).map_err(|e| write_failed(path, e))?;
            RenderOutcome::Written
        }
    };

    if spec.executable {
        set_executable(path)?;
    }

    Ok(outcome)
}

fn append_missing_lines(path: &Path, content: &str) -> Result<usize> {
    let existing = std::fs::read_to_string(path).map_err(|e| write_failed(path, e))?;
    let present: HashSet<&str> = existing.lines().map(str::trim).collect();

    let missing: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !present.contains(line))
        .collect();

    if missing.is_empty() {
        return Ok(0);
    }

    let mut updated = existing.clone();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    for line in &missing {
        updated.push_str(line);
        updated.push('\n');
    }
    std::fs::write(path, updated).map_err(|e| write_failed(path, e))?;
    Ok(missing.len())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| write_failed(path, e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
