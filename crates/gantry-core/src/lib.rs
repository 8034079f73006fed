//! Gantry Core - shared plumbing for the gantry Flutter CI/CD tool
//!
//! This crate provides the error taxonomy, configuration, environment
//! snapshot, external command runner and template renderer used by the
//! other gantry crates.

pub mod config;
pub mod env;
pub mod error;
pub mod process;
pub mod project;
pub mod templates;
pub mod types;

pub use config::Config;
pub use env::Environment;
pub use error::{ConfigError, GantryError, GitError, Result, TemplateError, VersionError};
pub use process::{CommandOutput, CommandRunner, CommandSpec, RecordingRunner, SystemRunner};
pub use project::{ProjectDescriptor, DEFAULT_VERSION};
pub use templates::{
    FileReport, RemoteFetcher, RenderOutcome, Renderer, SubstitutionMap, TemplateOrigin,
    TemplateRegistry, TemplateSources, TemplateSpec, WritePolicy,
};
pub use types::{BuildProfile, BumpKind, DeploymentMode, Platform};
