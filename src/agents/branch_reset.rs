use crate::error::{OtcbotError, Result};
use crate::repository::{BranchSpec, RepositoryHandle, VersionControlClient};
use crate::utils::reporter::Reporter;

/// Recreates the proposal branch from the latest remote main branch.
///
/// After a successful [`BranchResetter::reset`] the proposal branch is checked
/// out and points at exactly the tip of `<remote>/<main>`. When any step fails
/// the run must stop: the resetter returns [`OtcbotError::Reset`] after a
/// best-effort forced checkout of the main branch, so the working copy is
/// never left on a half-built proposal branch.
pub struct BranchResetter<'a> {
    vcs: &'a dyn VersionControlClient,
    reporter: &'a dyn Reporter,
    remote: &'a str,
}

impl<'a> BranchResetter<'a> {
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

    pub fn reset(
        &self,
        repo: &RepositoryHandle,
        main_branch: &BranchSpec,
        proposal_branch: &BranchSpec,
    ) -> Result<()> {
        if !main_branch.is_main
            || proposal_branch.is_main
            || main_branch.name == proposal_branch.name
        {
            return Err(OtcbotError::Reset(format!(
                "Proposal branch '{}' cannot be the main branch",
                proposal_branch.name
            )));
        }

        self.vcs
            .fetch(repo, self.remote)
            .map_err(|e| OtcbotError::Reset(e.to_string()))?;

        // Nothing below runs unless main is checked out, so a failure here
        // leaves whatever the previous run left behind.
        self.vcs
            .checkout(repo, &main_branch.name, true)
            .map_err(|e| OtcbotError::Reset(e.to_string()))?;

        if let Err(err) = self.recreate_proposal(repo, main_branch, proposal_branch) {
            self.restore_main(repo, main_branch);
            return Err(OtcbotError::Reset(err.to_string()));
        }

        Ok(())
    }

    fn recreate_proposal(
        &self,
        repo: &RepositoryHandle,
        main_branch: &BranchSpec,
        proposal_branch: &BranchSpec,
    ) -> Result<()> {
        let upstream = format!("{}/{}", self.remote, main_branch.name);
        self.vcs.reset_hard(repo, &upstream)?;
        self.reporter
            .detail(&format!("{} now matches {}", main_branch.name, upstream));

        if self.vcs.branch_exists(repo, &proposal_branch.name)? {
            self.reporter
                .detail(&format!("Deleting stale branch {}", proposal_branch.name));
            self.vcs.delete_branch(repo, &proposal_branch.name)?;
        }

        self.vcs.create_branch(repo, &proposal_branch.name)?;
        self.vcs.checkout(repo, &proposal_branch.name, false)?;
        Ok(())
    }

    fn restore_main(&self, repo: &RepositoryHandle, main_branch: &BranchSpec) {
        if let Err(err) = self.vcs.checkout(repo, &main_branch.name, true) {
            self.reporter.warn(&format!(
                "Could not return to {} after failed reset: {}",
                main_branch.name, err
            ));
        }
    }
}
