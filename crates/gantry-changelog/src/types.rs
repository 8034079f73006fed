//! Changelog types

use serde::{Deserialize, Serialize};

/// Conventional commit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    /// New feature
    Feat,
    /// Bug fix
    Fix,
    /// Performance improvement
    Perf,
    /// Reverting changes
    Revert,
    /// Documentation
    Docs,
    /// Refactoring
    Refactor,
    /// Code style (formatting, etc.)
    Style,
    /// Tests
    Test,
    /// Build system
    Build,
    /// CI configuration
    Ci,
    /// Chores (maintenance)
    Chore,
    /// Unrecognized or non-conventional
    Other,
}

impl CommitType {
    /// Section title for this type
    pub fn section_title(&self) -> &'static str {
        match self {
            Self::Feat => "Features",
            Self::Fix => "Bug Fixes",
            Self::Perf => "Performance Improvements",
            Self::Revert => "Reverts",
            Self::Docs => "Documentation",
            Self::Refactor => "Code Refactoring",
            Self::Style => "Styles",
            Self::Test => "Tests",
            Self::Build => "Build System",
            Self::Ci => "Continuous Integration",
            Self::Chore => "Chores",
            Self::Other => "Other Changes",
        }
    }
}

impl std::str::FromStr for CommitType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "feat" | "feature" => Ok(Self::Feat),
            "fix" | "bugfix" => Ok(Self::Fix),
            "perf" | "performance" => Ok(Self::Perf),
            "revert" => Ok(Self::Revert),
            "docs" | "doc" => Ok(Self::Docs),
            "refactor" => Ok(Self::Refactor),
            "style" => Ok(Self::Style),
            "test" | "tests" => Ok(Self::Test),
            "build" => Ok(Self::Build),
            "ci" => Ok(Self::Ci),
            "chore" => Ok(Self::Chore),
            _ => Err(()),
        }
    }
}

/// One commit as it appears in release notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Original commit subject
    pub subject: String,
    /// Subject without the conventional prefix
    pub description: String,
    /// Conventional type
    pub commit_type: CommitType,
    /// Scope in parentheses, if any
    pub scope: Option<String>,
    /// Marked breaking with `!` or a footer
    pub breaking: bool,
    /// Author name
    pub author: String,
}

/// A titled group of entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Section title
    pub title: String,
    /// Entries in commit order
    pub entries: Vec<ChangelogEntry>,
}

impl Section {
    /// Create a new section
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    /// Check if section is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
