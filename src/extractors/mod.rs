/// Ecosystem-specific dependency extractors.
///
/// Each extractor parses the local state its package manager leaves
/// behind (resolved package listings, lockfile-equivalents, package
/// metadata) into an [`ExtractedGraph`]. Selection is an explicit ordered
/// compatibility probe over the variants; a missing marker file means
/// "not mine", never an error.
pub mod npm;
pub mod nuget_assets;
pub mod nuget_packages_config;
pub mod pip;

pub use npm::NpmExtractor;
pub use nuget_assets::NugetAssetsExtractor;
pub use nuget_packages_config::NugetPackagesConfigExtractor;
pub use pip::PipExtractor;

use crate::graph::{Checksum, ExtractedGraph};
use crate::ports::outbound::CommandRunner;
use crate::shared::{DepTraceError, Result};
use async_trait::async_trait;
use md5::Md5;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The project an extraction run operates on.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Project root directory, probed for ecosystem marker files.
    pub root: PathBuf,
    /// Arguments the user passed to the underlying install command.
    /// Consulted for flags that change extraction behavior
    /// (`-r requirements.txt`, `--only=production`, `--verbose`).
    pub install_args: Vec<String>,
}

impl ProjectContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            install_args: Vec::new(),
        }
    }

    pub fn with_install_args(mut self, args: Vec<String>) -> Self {
        self.install_args = args;
        self
    }
}

/// The extractor contract: a compatibility probe plus an extraction
/// producing the root ids, all-dependencies map and children map.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Ecosystem name, for logging and repository selection.
    fn ecosystem(&self) -> &'static str;

    /// Probes for this ecosystem's marker files. Absence is `false`,
    /// not an error.
    fn is_compatible(&self, project: &ProjectContext) -> bool;

    async fn extract(&self, project: &ProjectContext) -> Result<ExtractedGraph>;
}

/// The ordered probe list. NuGet assets comes before packages.config
/// since an SDK-style project may carry both; npm before pip is
/// arbitrary as their markers never coexist meaningfully.
pub fn default_extractors(runner: Arc<dyn CommandRunner>) -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(NugetAssetsExtractor::new()),
        Box::new(NugetPackagesConfigExtractor::new(runner.clone())),
        Box::new(NpmExtractor::new(runner.clone())),
        Box::new(PipExtractor::new(runner)),
    ]
}

/// Tries each extractor in order until one claims compatibility.
pub fn select_extractor<'a>(
    extractors: &'a [Box<dyn Extractor>],
    project: &ProjectContext,
) -> Result<&'a dyn Extractor> {
    for extractor in extractors {
        if extractor.is_compatible(project) {
            log::debug!(
                "Using {} extractor for project: {}",
                extractor.ecosystem(),
                project.root.display()
            );
            return Ok(extractor.as_ref());
        }
    }
    Err(DepTraceError::NoCompatibleExtractor {
        path: project.root.clone(),
    }
    .into())
}

/// SHA-1 and MD5 digests of a local package file, used by the NuGet
/// extractors which read checksums from the package cache instead of
/// querying the repository.
pub(crate) fn file_checksums(path: &Path) -> Result<Checksum> {
    let content = std::fs::read(path)?;
    let sha1 = hex::encode(Sha1::digest(&content));
    let md5 = hex::encode(Md5::digest(&content));
    Ok(Checksum::new(sha1, md5))
}
