use crate::graph::{Checksum, DependencyRecord};
use crate::ports::outbound::{ArtifactHit, ArtifactRepository, DependencyCacheStore};
use crate::shared::Result;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// How a dependency's checksum is looked up in the artifact repository
/// when it was freshly materialized in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySpec {
    /// The dependency's exact downloaded file name is known (pip, from
    /// the install log).
    ByFileName(String),
    /// Query by package coordinates (npm).
    ByNameAndVersion { name: String, version: String },
    /// Nothing was downloaded for this dependency in this run; only the
    /// cache can answer.
    CacheOnly,
}

/// The result of a reconciliation run.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Dependencies for which no checksum could be established, as
    /// `<name>-<version>` strings. These have been removed from the
    /// dependency map.
    pub missing: Vec<String>,
}

impl ReconcileOutcome {
    /// Newline-joined report for warning-level display.
    pub fn missing_report(&self) -> String {
        self.missing.join("\n")
    }
}

/// Attaches checksums to a dependency map, or classifies entries as
/// missing.
///
/// Per dependency: a fresh download is resolved against the artifact
/// repository, and that answer overwrites any stale cache entry. When
/// there was no download, or the query comes back empty, the cache entry
/// is reused verbatim. A dependency neither source can answer is removed
/// from the map and reported as missing. After processing, the cache is
/// replaced with the surviving set so dependencies dropped from the
/// project also drop out of the cache.
///
/// Queries run on a bounded worker pool; each worker resolves its own
/// dependency and the results are applied to the map afterwards, single
/// threaded. A failed or timed-out query is logged and treated as a miss
/// for that dependency only. Cache read/write failures are fatal.
pub struct ChecksumReconciler {
    repository: Arc<dyn ArtifactRepository>,
    cache: Arc<dyn DependencyCacheStore>,
    target_repository: String,
    threads: usize,
    query_timeout: Duration,
}

struct QueryTask {
    key: String,
    spec: QuerySpec,
    cached: Option<DependencyRecord>,
}

/// A checksum resolution for one dependency.
struct ResolvedArtifact {
    id: String,
    checksum: Checksum,
    file_type: Option<String>,
}

impl ChecksumReconciler {
    pub fn new(
        repository: Arc<dyn ArtifactRepository>,
        cache: Arc<dyn DependencyCacheStore>,
        target_repository: impl Into<String>,
        threads: usize,
        query_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            target_repository: target_repository.into(),
            threads: threads.max(1),
            query_timeout,
        }
    }

    /// Reconciles every entry of `all_dependencies` in place, removes the
    /// unresolvable ones and persists the surviving set to the cache.
    pub async fn reconcile(
        &self,
        all_dependencies: &mut HashMap<String, DependencyRecord>,
        plans: &HashMap<String, QuerySpec>,
    ) -> Result<ReconcileOutcome> {
        let cached = self.cache.load()?.unwrap_or_default();

        let tasks: Vec<QueryTask> = all_dependencies
            .keys()
            .map(|key| QueryTask {
                key: key.clone(),
                spec: plans.get(key).cloned().unwrap_or(QuerySpec::CacheOnly),
                cached: cached.get(key).cloned(),
            })
            .collect();

        let results: Vec<(String, Option<ResolvedArtifact>)> = stream::iter(tasks)
            .map(|task| async move {
                let resolved = self.resolve(&task).await;
                (task.key, resolved)
            })
            .buffer_unordered(self.threads)
            .collect()
            .await;

        let mut outcome = ReconcileOutcome::default();
        for (key, resolved) in results {
            match resolved {
                Some(artifact) => {
                    if let Some(record) = all_dependencies.get_mut(&key) {
                        record.id = artifact.id;
                        record.checksum = Some(artifact.checksum);
                        record.file_type = artifact.file_type;
                    }
                }
                None => {
                    if let Some(record) = all_dependencies.remove(&key) {
                        outcome.missing.push(record.display_name());
                    }
                }
            }
        }
        outcome.missing.sort();

        self.cache.save(all_dependencies)?;
        Ok(outcome)
    }

    /// Resolves one dependency: repository query for fresh downloads,
    /// cache otherwise or on a query miss.
    async fn resolve(&self, task: &QueryTask) -> Option<ResolvedArtifact> {
        if task.spec != QuerySpec::CacheOnly {
            match self.query_checksum(&task.spec).await {
                Ok(Some(artifact)) => return Some(artifact),
                Ok(None) => {}
                Err(err) => {
                    log::warn!(
                        "Failed fetching checksums for dependency: {}, error: {:#}",
                        task.key,
                        err
                    );
                }
            }
        }

        task.cached.as_ref().and_then(|entry| {
            let checksum = entry.checksum.clone()?;
            Some(ResolvedArtifact {
                id: entry.id.clone(),
                checksum,
                file_type: entry.file_type.clone(),
            })
        })
    }

    async fn query_checksum(&self, spec: &QuerySpec) -> Result<Option<ResolvedArtifact>> {
        let query = match spec {
            QuerySpec::ByFileName(file_name) => {
                log::debug!("Fetching checksums for: {}", file_name);
                self.repository
                    .search_by_file_name(&self.target_repository, file_name)
            }
            QuerySpec::ByNameAndVersion { name, version } => {
                log::debug!("Fetching checksums for: {}-{}", name, version);
                self.repository
                    .search_by_name_and_version(&self.target_repository, name, version)
            }
            QuerySpec::CacheOnly => return Ok(None),
        };
        let hits = tokio::time::timeout(self.query_timeout, query)
            .await
            .map_err(|_| anyhow::anyhow!("repository query timed out"))??;

        let Some(hit) = hits.first() else {
            log::debug!("No repository match for query: {:?}", spec);
            return Ok(None);
        };
        // A result without both digests is not authoritative.
        if hit.actual_sha1.is_empty() || hit.actual_md5.is_empty() {
            log::debug!(
                "Missing checksums for file: {}, sha1: '{}', md5: '{}'",
                hit.name,
                hit.actual_sha1,
                hit.actual_md5
            );
            return Ok(None);
        }

        Ok(Some(Self::artifact_from_hit(spec, hit)))
    }

    fn artifact_from_hit(spec: &QuerySpec, hit: &ArtifactHit) -> ResolvedArtifact {
        // pip dependencies keep the file name captured from the install
        // log as their id; npm dependencies take the artifact name the
        // repository reports.
        let id = match spec {
            QuerySpec::ByFileName(file_name) => file_name.clone(),
            _ => hit.name.clone(),
        };
        let file_type = match spec {
            QuerySpec::ByFileName(file_name) => file_name
                .rsplit_once('.')
                .map(|(_, extension)| extension.to_string()),
            _ => None,
        };
        ResolvedArtifact {
            id,
            checksum: Checksum::new(hit.actual_sha1.clone(), hit.actual_md5.clone()),
            file_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Canned repository answers, keyed by file name or "name-version".
    struct StubRepository {
        answers: HashMap<String, ArtifactHit>,
        fail: bool,
    }

    #[async_trait]
    impl ArtifactRepository for StubRepository {
        async fn search_by_file_name(
            &self,
            _repository: &str,
            file_name: &str,
        ) -> Result<Vec<ArtifactHit>> {
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(self.answers.get(file_name).cloned().into_iter().collect())
        }

        async fn search_by_name_and_version(
            &self,
            _repository: &str,
            name: &str,
            version: &str,
        ) -> Result<Vec<ArtifactHit>> {
            if self.fail {
                anyhow::bail!("connection refused");
            }
            let key = format!("{}-{}", name, version);
            Ok(self.answers.get(&key).cloned().into_iter().collect())
        }
    }

    /// In-memory cache with the same overwrite-on-save contract as the
    /// file-backed store.
    struct MemoryCache {
        entries: Mutex<Option<HashMap<String, DependencyRecord>>>,
    }

    impl MemoryCache {
        fn new(initial: Option<HashMap<String, DependencyRecord>>) -> Self {
            Self {
                entries: Mutex::new(initial),
            }
        }
    }

    impl DependencyCacheStore for MemoryCache {
        fn load(&self) -> Result<Option<HashMap<String, DependencyRecord>>> {
            Ok(self.entries.lock().unwrap().clone())
        }

        fn save(&self, entries: &HashMap<String, DependencyRecord>) -> Result<()> {
            *self.entries.lock().unwrap() = Some(entries.clone());
            Ok(())
        }
    }

    fn hit(name: &str, sha1: &str, md5: &str) -> ArtifactHit {
        ArtifactHit {
            name: name.to_string(),
            actual_sha1: sha1.to_string(),
            actual_md5: md5.to_string(),
        }
    }

    fn cached_record(name: &str, version: &str, id: &str, sha1: &str) -> DependencyRecord {
        DependencyRecord::new(name, version)
            .with_id(id)
            .with_checksum(Checksum::new(sha1, "cachedmd5"))
    }

    fn reconciler(
        repository: StubRepository,
        cache: Arc<MemoryCache>,
    ) -> ChecksumReconciler {
        ChecksumReconciler::new(
            Arc::new(repository),
            cache,
            "pypi-local",
            4,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_fresh_download_overrides_stale_cache() {
        let mut cache_entries = HashMap::new();
        cache_entries.insert(
            "requests".to_string(),
            cached_record("requests", "2.30.0", "requests-2.30.0.whl", "stalesha1"),
        );
        let cache = Arc::new(MemoryCache::new(Some(cache_entries)));

        let mut answers = HashMap::new();
        answers.insert(
            "requests-2.31.0-py3-none-any.whl".to_string(),
            hit("requests-2.31.0-py3-none-any.whl", "freshsha1", "freshmd5"),
        );
        let reconciler = reconciler(StubRepository { answers, fail: false }, cache);

        let mut all = HashMap::new();
        all.insert(
            "requests".to_string(),
            DependencyRecord::new("requests", "2.31.0"),
        );
        let mut plans = HashMap::new();
        plans.insert(
            "requests".to_string(),
            QuerySpec::ByFileName("requests-2.31.0-py3-none-any.whl".to_string()),
        );

        let outcome = reconciler.reconcile(&mut all, &plans).await.unwrap();
        assert!(outcome.missing.is_empty());
        let record = &all["requests"];
        assert_eq!(record.id, "requests-2.31.0-py3-none-any.whl");
        assert_eq!(record.checksum.as_ref().unwrap().sha1, "freshsha1");
        assert_eq!(record.file_type.as_deref(), Some("whl"));
    }

    #[tokio::test]
    async fn test_cache_answers_when_nothing_was_downloaded() {
        let mut cache_entries = HashMap::new();
        cache_entries.insert(
            "flask".to_string(),
            cached_record("flask", "3.0.0", "flask-3.0.0.whl", "cachedsha1"),
        );
        let cache = Arc::new(MemoryCache::new(Some(cache_entries)));
        let reconciler = reconciler(
            StubRepository {
                answers: HashMap::new(),
                fail: false,
            },
            cache,
        );

        let mut all = HashMap::new();
        all.insert("flask".to_string(), DependencyRecord::new("flask", "3.0.0"));
        let plans = HashMap::new();

        reconciler.reconcile(&mut all, &plans).await.unwrap();
        let record = &all["flask"];
        assert_eq!(record.id, "flask-3.0.0.whl");
        assert_eq!(record.checksum.as_ref().unwrap().sha1, "cachedsha1");
    }

    #[tokio::test]
    async fn test_unresolvable_dependency_is_removed_and_reported_once() {
        let cache = Arc::new(MemoryCache::new(None));
        let reconciler = reconciler(
            StubRepository {
                answers: HashMap::new(),
                fail: false,
            },
            cache.clone(),
        );

        let mut all = HashMap::new();
        all.insert(
            "ghost".to_string(),
            DependencyRecord::new("ghost", "0.1.0"),
        );
        let plans = HashMap::new();

        let outcome = reconciler.reconcile(&mut all, &plans).await.unwrap();
        assert!(all.is_empty());
        assert_eq!(outcome.missing, ["ghost-0.1.0"]);
        assert_eq!(outcome.missing_report(), "ghost-0.1.0");
        // The persisted cache no longer knows the dependency either.
        assert!(cache.load().unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_falls_back_to_cache() {
        let mut cache_entries = HashMap::new();
        cache_entries.insert(
            "requests".to_string(),
            cached_record("requests", "2.31.0", "requests-2.31.0.whl", "cachedsha1"),
        );
        let cache = Arc::new(MemoryCache::new(Some(cache_entries)));
        let reconciler = reconciler(
            StubRepository {
                answers: HashMap::new(),
                fail: true,
            },
            cache,
        );

        let mut all = HashMap::new();
        all.insert(
            "requests".to_string(),
            DependencyRecord::new("requests", "2.31.0"),
        );
        let mut plans = HashMap::new();
        plans.insert(
            "requests".to_string(),
            QuerySpec::ByFileName("requests-2.31.0.whl".to_string()),
        );

        let outcome = reconciler.reconcile(&mut all, &plans).await.unwrap();
        assert!(outcome.missing.is_empty());
        assert_eq!(all["requests"].checksum.as_ref().unwrap().sha1, "cachedsha1");
    }

    #[tokio::test]
    async fn test_incomplete_checksum_is_not_authoritative() {
        let mut answers = HashMap::new();
        answers.insert(
            "express-4.18.2".to_string(),
            hit("express-4.18.2.tgz", "onlysha1", ""),
        );
        let cache = Arc::new(MemoryCache::new(None));
        let reconciler = reconciler(StubRepository { answers, fail: false }, cache);

        let mut all = HashMap::new();
        all.insert(
            "express".to_string(),
            DependencyRecord::new("express", "4.18.2"),
        );
        let mut plans = HashMap::new();
        plans.insert(
            "express".to_string(),
            QuerySpec::ByNameAndVersion {
                name: "express".to_string(),
                version: "4.18.2".to_string(),
            },
        );

        let outcome = reconciler.reconcile(&mut all, &plans).await.unwrap();
        assert_eq!(outcome.missing, ["express-4.18.2"]);
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_name_version_query_takes_repository_artifact_name() {
        let mut answers = HashMap::new();
        answers.insert(
            "express-4.18.2".to_string(),
            hit("express-4.18.2.tgz", "sha", "md5"),
        );
        let cache = Arc::new(MemoryCache::new(None));
        let reconciler = reconciler(StubRepository { answers, fail: false }, cache);

        let mut all = HashMap::new();
        all.insert(
            "express".to_string(),
            DependencyRecord::new("express", "4.18.2"),
        );
        let mut plans = HashMap::new();
        plans.insert(
            "express".to_string(),
            QuerySpec::ByNameAndVersion {
                name: "express".to_string(),
                version: "4.18.2".to_string(),
            },
        );

        reconciler.reconcile(&mut all, &plans).await.unwrap();
        assert_eq!(all["express"].id, "express-4.18.2.tgz");
        assert_eq!(all["express"].file_type, None);
    }
}
