use crate::error::{OtcbotError, Result};
use crate::repository::{RepositoryHandle, VersionControlClient};
use crate::utils::reporter::Reporter;
use std::path::Path;

/// Makes sure the checkout directory holds an up-to-date clone of the remote.
pub struct RepositorySynchronizer<'a> {
    vcs: &'a dyn VersionControlClient,
    reporter: &'a dyn Reporter,
    remote: &'a str,
}

impl<'a> RepositorySynchronizer<'a> {
    pub fn new(
        vcs: &'a dyn VersionControlClient,
        reporter: &'a dyn Reporter,
        remote: &'a str,
    ) -> Self {
        Self {
            vcs,
            reporter,
            remote,
        }
    }

    /// Clones `remote_url` into `local_path` unless a checkout is already
    /// there, then refreshes the remote tracking state.
    pub fn ensure(
        &self,
        remote_url: &str,
        local_path: &Path,
        main_branch: &str,
    ) -> Result<RepositoryHandle> {
        if self.vcs.is_checkout(local_path) {
            self.reporter
                .detail(&format!("Reusing checkout at {}", local_path.display()));
        } else {
            self.reporter.detail(&format!(
                "Cloning {} into {}",
                remote_url,
                local_path.display()
            ));
            self.vcs
                .clone_repository(remote_url, local_path, main_branch)
                .map_err(|e| OtcbotError::Synchronization(e.to_string()))?;
        }

        let handle = RepositoryHandle::new(remote_url, local_path);
        self.vcs
            .fetch(&handle, self.remote)
            .map_err(|e| OtcbotError::Synchronization(e.to_string()))?;

        Ok(handle)
    }
}
