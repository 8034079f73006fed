//! Commit history operations

use chrono::{TimeZone, Utc};
use git2::{Oid, Sort};
use tracing::{debug, instrument};

use crate::repository::{GitRepo, Result};
use crate::types::CommitInfo;

impl GitRepo {
    /// Get commits reachable from HEAD but not from `since`
    pub fn commits_since_oid(&self, since: Oid) -> Result<Vec<CommitInfo>> {
        self.walk(Some(since))
    }

    /// Get commits since a tag
    pub fn commits_since_tag(&self, tag_name: &str) -> Result<Vec<CommitInfo>> {
        let tag_ref = format!("refs/tags/{}", tag_name);
        let reference = self.repo.find_reference(&tag_ref)?;
        let target = reference.peel_to_commit()?;

        self.commits_since_oid(target.id())
    }

    /// Get all commits on the current branch
    pub fn all_commits(&self) -> Result<Vec<CommitInfo>> {
        self.walk(None)
    }

    /// Commits since the latest release tag, or all history when untagged
    #[instrument(skip(self))]
    pub fn commits_since_last_release(&self) -> Result<Vec<CommitInfo>> {
        match self.find_latest_release_tag()? {
            Some(tag) => {
                debug!(tag = %tag.name, "collecting commits since release tag");
                self.commits_since_tag(&tag.name)
            }
            None => {
                debug!("no release tag, collecting full history");
                self.all_commits()
            }
        }
    }

    fn walk(&self, hide: Option<Oid>) -> Result<Vec<CommitInfo>> {
        let head = self.head_commit()?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head.id())?;
        if let Some(oid) = hide {
            revwalk.hide(oid)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(commit_to_info(&commit));
        }

        Ok(commits)
    }
}

/// Convert a git2 Commit to CommitInfo
fn commit_to_info(commit: &git2::Commit<'_>) -> CommitInfo {
    let author = commit.author();

    let message = commit.summary().unwrap_or("(no message)").to_string();

    let timestamp = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_else(Utc::now);

    CommitInfo::new(
        commit.id().to_string(),
        message,
        author.name().unwrap_or("Unknown"),
        author.email().unwrap_or("unknown@example.com"),
        timestamp,
    )
    .with_body(commit.body().unwrap_or_default())
    .with_parent_count(commit.parent_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Repository, Signature};
    use std::path::Path;
    use tempfile::TempDir;

    fn commit(repo: &Repository, message: &str, author: &str) -> Oid {
        let sig = Signature::now(author, "dev@example.com").unwrap();
        let file = format!("{}.txt", repo.head().map(|_| "next").unwrap_or("first"));
        std::fs::write(repo.workdir().unwrap().join(&file), message).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(&file)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let parents: Vec<_> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<_> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    fn setup_repo() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        (temp, repo)
    }

    #[test]
    fn test_all_commits_newest_first() {
        let (temp, repo) = setup_repo();
        commit(&repo, "Initial commit", "Ada");
        commit(&repo, "feat: add file", "Grace");

        let git = GitRepo::open(temp.path()).unwrap();
        let commits = git.all_commits().unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].message, "feat: add file");
        assert_eq!(commits[0].author, "Grace");
        assert_eq!(commits[1].author, "Ada");
    }

    #[test]
    fn test_commits_since_last_release() {
        let (temp, repo) = setup_repo();
        let first = commit(&repo, "Initial commit", "Ada");
        repo.tag_lightweight("v1.0.0", &repo.find_object(first, None).unwrap(), false)
            .unwrap();
        commit(&repo, "fix: crash on launch", "Ada");
        commit(&repo, "feat: dark mode", "Grace");

        let git = GitRepo::open(temp.path()).unwrap();
        let commits = git.commits_since_last_release().unwrap();
        let subjects: Vec<_> = commits.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(subjects, vec!["feat: dark mode", "fix: crash on launch"]);
    }

    #[test]
    fn test_untagged_history_is_complete() {
        let (temp, repo) = setup_repo();
        commit(&repo, "Initial commit", "Ada");
        commit(&repo, "fix: typo", "Ada");

        let git = GitRepo::open(temp.path()).unwrap();
        assert_eq!(git.commits_since_last_release().unwrap().len(), 2);
    }
}
