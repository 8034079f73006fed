//! Remote operations

use tracing::debug;

use gantry_core::error::GitError;
use gantry_core::process::CommandSpec;

use crate::repository::{GitRepo, Result};

impl GitRepo {
    /// Get list of remote names
    pub fn remotes(&self) -> Result<Vec<String>> {
        let remotes = self.repo.remotes()?;
        Ok(remotes
            .iter()
            .filter_map(|r| r.map(|s| s.to_string()))
            .collect())
    }

    /// Check if a remote exists
    pub fn has_remote(&self, name: &str) -> Result<bool> {
        Ok(self.remotes()?.iter().any(|r| r == name))
    }

    /// Get the URL for a remote
    pub fn remote_url(&self, name: &str) -> Result<Option<String>> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(|s| s.to_string())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                Err(GitError::RemoteNotFound(name.to_string()))
            }
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// URL of `preferred`, or of the first configured remote
    ///
    /// A repository without remotes yields `Ok(None)`.
    pub fn remote_url_or_first(&self, preferred: &str) -> Result<Option<String>> {
        match self.remote_url(preferred) {
            Ok(url) => return Ok(url),
            Err(GitError::RemoteNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        for name in self.remotes()? {
            if let Some(url) = self.remote_url(&name)? {
                debug!(remote = %name, preferred, "using first configured remote");
                return Ok(Some(url));
            }
        }
        Ok(None)
    }
}

/// `git push <remote> <tag>` in the repository directory
///
/// Pushing goes through the git CLI so the operator's credential helpers
/// apply.
pub fn push_tag_command(repo_dir: &std::path::Path, remote: &str, tag: &str) -> CommandSpec {
    CommandSpec::new("git")
        .args(["push", remote, tag])
        .current_dir(repo_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Repository;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup_repo() -> (TempDir, GitRepo) {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();
        let git_repo = GitRepo::open(temp.path()).unwrap();
        (temp, git_repo)
    }

    #[test]
    fn test_remotes_empty() {
        let (_temp, repo) = setup_repo();
        assert!(repo.remotes().unwrap().is_empty());
        assert!(!repo.has_remote("origin").unwrap());
        assert_eq!(repo.remote_url_or_first("origin").unwrap(), None);
    }

    #[test]
    fn test_remote_not_found() {
        let (_temp, repo) = setup_repo();
        let result = repo.remote_url("nonexistent");
        assert!(matches!(result, Err(GitError::RemoteNotFound(_))));
    }

    #[test]
    fn test_remote_url_prefers_named_remote() {
        let (_temp, repo) = setup_repo();
        repo.inner()
            .remote("upstream", "https://gitlab.com/acme/demo.git")
            .unwrap();
        repo.inner()
            .remote("origin", "git@github.com:acme/demo.git")
            .unwrap();

        assert_eq!(
            repo.remote_url_or_first("origin").unwrap().as_deref(),
            Some("git@github.com:acme/demo.git")
        );
    }

    #[test]
    fn test_remote_url_falls_back_to_first() {
        let (_temp, repo) = setup_repo();
        repo.inner()
            .remote("upstream", "https://gitlab.com/acme/demo.git")
            .unwrap();

        assert_eq!(
            repo.remote_url_or_first("origin").unwrap().as_deref(),
            Some("https://gitlab.com/acme/demo.git")
        );
    }

    #[test]
    fn test_push_tag_command() {
        let spec = push_tag_command(Path::new("/work/demo"), "origin", "v1.2.3");
        assert_eq!(spec.display(), "git push origin v1.2.3");
        assert_eq!(spec.cwd.as_deref(), Some(Path::new("/work/demo")));
    }
}
