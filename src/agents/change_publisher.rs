use crate::agents::dependency_patcher::{ChangeSet, ReplacementRule};
use crate::error::{OtcbotError, Result};
use crate::repository::{BranchSpec, RepositoryHandle, VersionControlClient};
use crate::utils::reporter::Reporter;
use serde::{Deserialize, Serialize};

pub const BOT_NAME: &str = "otcbot";
pub const BOT_EMAIL: &str = "52695153+otcbot@users.noreply.github.com";

/// Author and committer of every proposal commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

impl CommitIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Default for CommitIdentity {
    fn default() -> Self {
        Self::new(BOT_NAME, BOT_EMAIL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing changed; no git write happened.
    NothingToPublish,
    Pushed { commit_id: String },
}

impl PublishOutcome {
    /// Whether a commit was made.
    pub fn committed(&self) -> bool {
        matches!(self, PublishOutcome::Pushed { .. })
    }

    pub fn commit_id(&self) -> Option<&str> {
        match self {
            PublishOutcome::NothingToPublish => None,
            PublishOutcome::Pushed { commit_id } => Some(commit_id),
        }
    }
}

/// Commits the staged manifests as one commit and pushes the proposal branch.
pub struct ChangePublisher<'a> {
    vcs: &'a dyn VersionControlClient,
    reporter: &'a dyn Reporter,
    remote: &'a str,
}

impl<'a> ChangePublisher<'a> {
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

    /// Commits every staged path in one commit and pushes the proposal
    /// branch. An empty change set makes no git write at all.
    pub fn publish(
        &self,
        repo: &RepositoryHandle,
        change_set: &ChangeSet,
        proposal_branch: &BranchSpec,
        rule: &ReplacementRule,
        identity: &CommitIdentity,
    ) -> Result<PublishOutcome> {
        if change_set.is_empty() {
            return Ok(PublishOutcome::NothingToPublish);
        }

        let message = rule.commit_message();
        let commit_id = self
            .vcs
            .commit(repo, &message, identity)
            .map_err(|e| OtcbotError::Publish(e.to_string()))?;
        self.reporter.success(&format!(
            "Committed {} as {} <{}>",
            short_id(&commit_id),
            identity.name,
            identity.email
        ));

        self.vcs
            .push(repo, self.remote, &proposal_branch.name)
            .map_err(|e| OtcbotError::Publish(e.to_string()))?;
        self.reporter.success(&format!(
            "Pushed {} to {}",
            proposal_branch.name, self.remote
        ));

        Ok(PublishOutcome::Pushed { commit_id })
    }
}

fn short_id(commit_id: &str) -> &str {
    commit_id.get(..10).unwrap_or(commit_id)
}
