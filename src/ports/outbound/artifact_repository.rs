use crate::shared::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// One artifact matched by a repository search.
///
/// `actual_sha1` / `actual_md5` mirror the repository's stored-checksum
/// field names; either may be empty when the repository has not finished
/// calculating checksums, in which case the hit is not authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtifactHit {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub actual_sha1: String,
    #[serde(default)]
    pub actual_md5: String,
}

/// ArtifactRepository port for checksum lookups against a remote
/// artifact repository.
///
/// An empty result list is not an error; transport failures are. The
/// reconciler treats a transport failure as a miss for that dependency
/// only, so implementations should not retry forever.
///
/// # Async Support
/// All methods are async; implementations must be `Send + Sync` so the
/// bounded worker pool can issue queries concurrently.
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// Searches a repository for an exact artifact file name (pip wheels,
    /// sdists, npm tarballs captured from install logs).
    async fn search_by_file_name(
        &self,
        repository: &str,
        file_name: &str,
    ) -> Result<Vec<ArtifactHit>>;

    /// Searches a repository by package name and version (npm, where the
    /// stored tarball name is derived from both).
    async fn search_by_name_and_version(
        &self,
        repository: &str,
        name: &str,
        version: &str,
    ) -> Result<Vec<ArtifactHit>>;
}
