pub mod artifact_repository;
pub mod command_runner;
pub mod dependency_cache;
pub mod progress_reporter;

pub use artifact_repository::{ArtifactHit, ArtifactRepository};
pub use command_runner::CommandRunner;
pub use dependency_cache::DependencyCacheStore;
pub use progress_reporter::ProgressReporter;
