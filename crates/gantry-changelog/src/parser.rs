//! Conventional Commits parser
//!
//! Parses commits following the Conventional Commits specification:
//! https://www.conventionalcommits.org/
//! Subjects that do not follow it still produce an entry of type
//! [`CommitType::Other`].

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{ChangelogEntry, CommitType};
use gantry_git::CommitInfo;

static CONVENTIONAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<type>[a-zA-Z]+)(?:\((?P<scope>[^)]+)\))?(?P<breaking>!)?: (?P<description>.+)$",
    )
    .expect("Invalid regex")
});

static BREAKING_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^BREAKING[ -]CHANGE: ").expect("Invalid regex"));

/// Parser for Conventional Commits format
#[derive(Debug, Clone, Default)]
pub struct ConventionalParser {
    include_merges: bool,
}

impl ConventionalParser {
    /// Create a parser that skips merge commits
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep merge commits
    pub fn with_merges(mut self, include: bool) -> Self {
        self.include_merges = include;
        self
    }

    /// Parse a commit; `None` for skipped merges and empty subjects
    pub fn parse(&self, commit: &CommitInfo) -> Option<ChangelogEntry> {
        if !self.include_merges && commit.is_merge() {
            return None;
        }

        let subject = commit.message.trim();
        if subject.is_empty() {
            return None;
        }

        let footer_breaking = commit
            .body
            .as_deref()
            .map(|b| BREAKING_FOOTER.is_match(b))
            .unwrap_or(false);

        let parsed = CONVENTIONAL_REGEX.captures(subject).and_then(|caps| {
            let commit_type = caps.name("type")?.as_str().parse::<CommitType>().ok()?;
            Some((
                commit_type,
                caps.name("scope").map(|m| m.as_str().to_string()),
                caps.name("breaking").is_some(),
                caps.name("description")?.as_str().trim().to_string(),
            ))
        });

        let (commit_type, scope, breaking, description) =
            parsed.unwrap_or((CommitType::Other, None, false, subject.to_string()));

        Some(ChangelogEntry {
            subject: subject.to_string(),
            description,
            commit_type,
            scope,
            breaking: breaking || footer_breaking,
            author: commit.author.clone(),
        })
    }
}
