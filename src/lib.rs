//! deptrace - dependency graph tracing and checksum reconciliation
//!
//! This library reconstructs the resolved dependency graph of an npm,
//! NuGet or pip project, reconciles each dependency against an artifact
//! repository to recover its stored file name and checksums, and emits a
//! nested dependency tree plus a flat build-info dependency list.
//!
//! # Architecture
//!
//! The library follows a hexagonal layout:
//!
//! - **Domain Layer** (`graph`, `extractors`, `reconcile`): graph model,
//!   ecosystem extractors, root inference, tree building and checksum
//!   reconciliation
//! - **Application Layer** (`application`): use cases and DTOs
//! - **Ports** (`ports`): interface definitions for infrastructure
//! - **Adapters** (`adapters`): concrete implementations of ports
//! - **Shared** (`shared`): common error types and the `Result` alias
//!
//! # Example
//!
//! ```no_run
//! use deptrace::prelude::*;
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<()> {
//! // Create adapters
//! let runner = Arc::new(TokioCommandRunner::new());
//! let repository = Arc::new(AqlArtifactRepository::new(
//!     "http://localhost:8081/artifactory",
//!     None,
//! )?);
//! let cache = Arc::new(FileCacheStore::new(Path::new(".")));
//! let progress_reporter = StderrProgressReporter::new();
//!
//! // Create use case
//! let use_case = TraceDependenciesUseCase::new(
//!     runner,
//!     repository,
//!     cache,
//!     progress_reporter,
//!     "pypi-local",
//!     3,
//!     Duration::from_secs(30),
//! );
//!
//! // Execute
//! let request = TraceRequest::new(".");
//! let response = use_case.execute(request).await?;
//! println!("{}", response.tree_json()?);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod graph;
pub mod ports;
pub mod reconcile;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::filesystem::FileCacheStore;
    pub use crate::adapters::outbound::network::AqlArtifactRepository;
    pub use crate::adapters::outbound::process::TokioCommandRunner;
    pub use crate::application::dto::{TraceRequest, TraceResponse};
    pub use crate::application::use_cases::TraceDependenciesUseCase;
    pub use crate::extractors::{default_extractors, select_extractor, Extractor, ProjectContext};
    pub use crate::graph::{
        build_dependency_tree, infer_roots, BuildInfoDependency, Checksum, DependencyRecord,
        ExtractedGraph, TreeNode,
    };
    pub use crate::ports::outbound::{
        ArtifactHit, ArtifactRepository, CommandRunner, DependencyCacheStore, ProgressReporter,
    };
    pub use crate::reconcile::{ChecksumReconciler, InstallLogParser, QuerySpec};
    pub use crate::shared::{DepTraceError, ExitCode, Result};
}
