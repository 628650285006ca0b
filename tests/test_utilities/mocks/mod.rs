/// Mock implementations for testing
mod mock_artifact_repository;
mod mock_cache_store;
mod mock_command_runner;
mod mock_progress_reporter;

pub use mock_artifact_repository::MockArtifactRepository;
pub use mock_cache_store::MockCacheStore;
pub use mock_command_runner::MockCommandRunner;
pub use mock_progress_reporter::MockProgressReporter;
