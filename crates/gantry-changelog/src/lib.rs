//! Gantry Changelog - release notes from git history
//!
//! Turns the commits since the last `v*` tag into store release notes, either
//! as a flat list or grouped by conventional commit type.

pub mod formatter;
pub mod generator;
pub mod parser;
pub mod types;

pub use generator::{generate_changelog, ChangelogGenerator, ChangelogOptions};
pub use parser::ConventionalParser;
pub use types::{ChangelogEntry, CommitType, Section};
