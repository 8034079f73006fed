//! Gantry Git - repository access for gantry
//!
//! Reads remotes, tags and commit history with `git2`, creates release tags,
//! and builds the `git push` command used to publish them.

mod commits;
mod remote;
mod repository;
mod tags;
pub mod types;

pub use remote::push_tag_command;
pub use repository::{GitRepo, Result};
pub use tags::{release_tag_name, RELEASE_TAG_PATTERN};
pub use types::{CommitInfo, TagInfo};
