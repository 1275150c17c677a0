use crate::agents::version_control::GitCli;
use crate::repository::VersionControlClient;

pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Client backed by the `git` executable on `PATH`.
    pub fn create_git(show_progress: bool) -> Box<dyn VersionControlClient> {
        Box::new(GitCli::new(show_progress))
    }
}
