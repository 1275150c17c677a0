use crate::agents::change_publisher::CommitIdentity;
use crate::error::Result;
use std::path::{Path, PathBuf};

pub mod factory;
pub use factory::RepositoryFactory;

/// A local working copy bound to its remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    pub remote_url: String,
    pub local_path: PathBuf,
}

impl RepositoryHandle {
    pub fn new(remote_url: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            remote_url: remote_url.into(),
            local_path: local_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.local_path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSpec {
    pub name: String,
    pub is_main: bool,
}

impl BranchSpec {
    pub fn main(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_main: true,
        }
    }

    pub fn proposal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_main: false,
        }
    }
}

/// Operations the workflow needs from a git-compatible checkout.
///
/// Every call blocks until the underlying operation finishes. Failures are
/// reported as [`crate::error::OtcbotError::GitOperation`]; the stages decide
/// which typed error they turn into.
pub trait VersionControlClient {
    /// Whether `path` already holds a checkout.
    fn is_checkout(&self, path: &Path) -> bool;

    /// Clone `remote_url` into `path` with `branch` checked out.
    fn clone_repository(&self, remote_url: &str, path: &Path, branch: &str) -> Result<()>;

    /// Refresh the remote tracking refs of `remote`.
    fn fetch(&self, repo: &RepositoryHandle, remote: &str) -> Result<()>;

    /// Switch to `branch`; with `force` local modifications are discarded.
    fn checkout(&self, repo: &RepositoryHandle, branch: &str, force: bool) -> Result<()>;

    /// Move the current branch, index and working tree to `target`.
    fn reset_hard(&self, repo: &RepositoryHandle, target: &str) -> Result<()>;

    fn branch_exists(&self, repo: &RepositoryHandle, branch: &str) -> Result<bool>;

    fn delete_branch(&self, repo: &RepositoryHandle, branch: &str) -> Result<()>;

    /// Create `branch` pointing at the current HEAD without switching to it.
    fn create_branch(&self, repo: &RepositoryHandle, branch: &str) -> Result<()>;

    /// Stage a path relative to the repository root.
    fn stage(&self, repo: &RepositoryHandle, path: &Path) -> Result<()>;

    /// Commit the index, returning the new commit id.
    fn commit(
        &self,
        repo: &RepositoryHandle,
        message: &str,
        identity: &CommitIdentity,
    ) -> Result<String>;

    fn push(&self, repo: &RepositoryHandle, remote: &str, branch: &str) -> Result<()>;

    /// Commit id `revision` resolves to.
    fn resolve(&self, repo: &RepositoryHandle, revision: &str) -> Result<String>;
}
