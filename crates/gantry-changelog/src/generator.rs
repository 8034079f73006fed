//! Release notes generation

use gantry_core::config::ChangelogConfig;
use gantry_core::error::Result;
use gantry_git::{CommitInfo, GitRepo};
use tracing::{debug, info, instrument};

use crate::formatter::{truncate_notes, FlatFormatter, GroupedFormatter, NotesFormatter};
use crate::parser::ConventionalParser;
use crate::types::ChangelogEntry;

/// Options for [`generate_changelog`]
#[derive(Debug, Clone)]
pub struct ChangelogOptions {
    /// Group by conventional commit type
    pub grouped: bool,
    /// Truncate to this many characters
    pub max_length: Option<usize>,
    /// Text returned when there is nothing to list
    pub fallback: String,
}

impl Default for ChangelogOptions {
    fn default() -> Self {
        Self::from(&ChangelogConfig::default())
    }
}

impl From<&ChangelogConfig> for ChangelogOptions {
    fn from(config: &ChangelogConfig) -> Self {
        Self {
            grouped: config.grouped,
            max_length: config.max_length,
            fallback: config.fallback.clone(),
        }
    }
}

/// Release notes generator
pub struct ChangelogGenerator {
    parser: ConventionalParser,
    formatter: Box<dyn NotesFormatter>,
    options: ChangelogOptions,
}

impl ChangelogGenerator {
    /// Create a generator; the formatter follows `options.grouped`
    pub fn new(options: ChangelogOptions) -> Self {
        let formatter: Box<dyn NotesFormatter> = if options.grouped {
            Box::new(GroupedFormatter)
        } else {
            Box::new(FlatFormatter)
        };
        Self {
            parser: ConventionalParser::new(),
            formatter,
            options,
        }
    }

    /// Use a custom formatter
    pub fn with_formatter<F: NotesFormatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Parse commits into entries, oldest first
    ///
    /// Commits arrive newest first from the revwalk.
    pub fn entries(&self, commits: &[CommitInfo]) -> Vec<ChangelogEntry> {
        commits
            .iter()
            .rev()
            .filter_map(|c| self.parser.parse(c))
            .collect()
    }

    /// Format commits into release notes
    #[instrument(skip_all, fields(commit_count = commits.len(), grouped = self.options.grouped))]
    pub fn generate(&self, commits: &[CommitInfo]) -> String {
        let entries = self.entries(commits);
        if entries.is_empty() {
            debug!("no commits to list, using fallback");
            return self.options.fallback.clone();
        }

        let notes = self.formatter.format(&entries);
        let notes = match self.options.max_length {
            Some(max) => truncate_notes(&notes, max),
            None => notes,
        };

        info!(
            entry_count = entries.len(),
            length = notes.chars().count(),
            "release notes generated"
        );
        notes
    }
}

/// Release notes for the commits since the latest `v*` tag
pub fn generate_changelog(repo: &GitRepo, options: &ChangelogOptions) -> Result<String> {
    let commits = if repo.has_commits() {
        repo.commits_since_last_release()?
    } else {
        Vec::new()
    };
    Ok(ChangelogGenerator::new(options.clone()).generate(&commits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use git2::{Repository, Signature};
    use std::path::Path;
    use tempfile::TempDir;

    fn make_commit(message: &str, author: &str) -> CommitInfo {
        CommitInfo::new("abc1234567890", message, author, "dev@example.com", Utc::now())
    }

    fn setup_repo() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        (temp, repo)
    }

    fn commit(repo: &Repository, path: &Path, message: &str) -> git2::Oid {
        let file = path.join("CHANGES.txt");
        let mut content = std::fs::read_to_string(&file).unwrap_or_default();
        content.push_str(message);
        content.push('\n');
        std::fs::write(&file, content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Ada", "ada@example.com").unwrap();
        let parents: Vec<git2::Commit> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn test_generate_flat_oldest_first() {
        let generator = ChangelogGenerator::new(ChangelogOptions {
            grouped: false,
            max_length: None,
            fallback: "none".to_string(),
        });
        // newest first, like the revwalk
        let commits = vec![
            make_commit("fix: crash on start", "Bob"),
            make_commit("Merge branch 'develop'", "Bob"),
            make_commit("feat: add login", "Ada"),
        ];
        assert_eq!(
            generator.generate(&commits),
            "- feat: add login (Ada)\n- fix: crash on start (Bob)"
        );
    }

    #[test]
    fn test_fallback_when_empty() {
        let generator = ChangelogGenerator::new(ChangelogOptions::default());
        assert_eq!(generator.generate(&[]), "Bug fixes and improvements");

        let only_merges = vec![make_commit("Merge pull request #4 from a/b", "Ada")];
        assert_eq!(generator.generate(&only_merges), "Bug fixes and improvements");
    }

    #[test]
    fn test_default_truncates_to_play_store_limit() {
        let generator = ChangelogGenerator::new(ChangelogOptions::default());
        let commits: Vec<CommitInfo> = (0..60)
            .map(|i| make_commit(&format!("fix: issue number {i}"), "Ada"))
            .collect();
        let notes = generator.generate(&commits);
        assert!(notes.chars().count() <= 500);
        assert!(notes.lines().all(|l| l.ends_with("(Ada)")));
    }

    #[test]
    fn test_generate_changelog_since_tag() {
        let (temp, repo) = setup_repo();
        let first = commit(&repo, temp.path(), "feat: initial screen");
        let obj = repo.find_object(first, None).unwrap();
        repo.tag_lightweight("v1.0.0", &obj, false).unwrap();
        commit(&repo, temp.path(), "fix: button color");
        commit(&repo, temp.path(), "feat: settings page");

        let git = GitRepo::open(temp.path()).unwrap();
        let options = ChangelogOptions {
            grouped: true,
            max_length: None,
            fallback: "n/a".to_string(),
        };
        let notes = generate_changelog(&git, &options).unwrap();
        assert_eq!(
            notes,
            "Features:\n- settings page (Ada)\n\nBug Fixes:\n- button color (Ada)"
        );
    }

    #[test]
    fn test_generate_changelog_without_tags_uses_all_history() {
        let (temp, repo) = setup_repo();
        commit(&repo, temp.path(), "Initial commit");
        commit(&repo, temp.path(), "feat: add login");

        let git = GitRepo::open(temp.path()).unwrap();
        let options = ChangelogOptions {
            max_length: None,
            ..ChangelogOptions::default()
        };
        let notes = generate_changelog(&git, &options).unwrap();
        assert_eq!(notes, "- Initial commit (Ada)\n- feat: add login (Ada)");
    }

    #[test]
    fn test_generate_changelog_empty_repo() {
        let (temp, _repo) = setup_repo();
        let git = GitRepo::open(temp.path()).unwrap();
        let notes = generate_changelog(&git, &ChangelogOptions::default()).unwrap();
        assert_eq!(notes, "Bug fixes and improvements");
    }
}
