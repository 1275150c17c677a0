pub mod branch_reset;
pub mod change_publisher;
pub mod dependency_patcher;
pub mod repository_sync;
pub mod version_control;

pub use branch_reset::BranchResetter;
pub use change_publisher::{ChangePublisher, PublishOutcome};
pub use dependency_patcher::DependencyPatcher;
pub use repository_sync::RepositorySynchronizer;
