//! Revision queries against a git repository.

use std::path::{Path, PathBuf};

use churn_core::ChurnError;
use git2::{Repository, StatusOptions};

/// The repository questions the range resolver needs answered.
pub trait RevisionQuery {
    /// Whether `name` resolves to an object.
    fn ref_exists(&self, name: &str) -> bool;

    /// Whether the working tree has staged, unstaged or untracked changes.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Git`] if the status cannot be read.
    fn worktree_dirty(&self) -> Result<bool, ChurnError>;

    /// Full hex id of the best common ancestor of `a` and `b`.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Git`] if either side does not resolve to a
    /// commit or the two histories are unrelated.
    fn merge_base(&self, a: &str, b: &str) -> Result<String, ChurnError>;
}

/// [`RevisionQuery`] backed by a git2 repository handle.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Find the repository containing `path`, searching parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Git`] if `path` is not inside a repository.
    pub fn discover(path: &Path) -> Result<Self, ChurnError> {
        let repo = Repository::discover(path)
            .map_err(|e| ChurnError::Git(format!("failed to open repository: {e}")))?;
        tracing::debug!(git_dir = %repo.path().display(), "opened repository");
        Ok(Self { repo })
    }

    /// Root of the working tree, or `None` for a bare repository.
    pub fn workdir(&self) -> Option<PathBuf> {
        self.repo.workdir().map(Path::to_path_buf)
    }

    fn commit_id(&self, name: &str) -> Result<git2::Oid, ChurnError> {
        let commit = self
            .repo
            .revparse_single(name)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| ChurnError::Git(format!("failed to resolve '{name}': {e}")))?;
        Ok(commit.id())
    }
}

impl RevisionQuery for GitRepository {
    fn ref_exists(&self, name: &str) -> bool {
        self.repo.revparse_single(name).is_ok()
    }

    fn worktree_dirty(&self) -> Result<bool, ChurnError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .include_ignored(false)
            .recurse_untracked_dirs(false)
            .exclude_submodules(true);
        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| ChurnError::Git(format!("failed to read working tree status: {e}")))?;
        Ok(!statuses.is_empty())
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<String, ChurnError> {
        let one = self.commit_id(a)?;
        let two = self.commit_id(b)?;
        let base = self.repo.merge_base(one, two).map_err(|e| {
            ChurnError::Git(format!("failed to find merge base of '{a}' and '{b}': {e}"))
        })?;
        Ok(base.to_string())
    }
}
