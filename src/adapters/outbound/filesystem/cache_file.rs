use crate::graph::DependencyRecord;
use crate::ports::outbound::DependencyCacheStore;
use crate::shared::{DepTraceError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const CACHE_DIR: &str = ".deptrace";
const CACHE_FILE: &str = "cache.json";

/// FileCacheStore adapter for the per-project dependency cache.
///
/// This adapter implements the DependencyCacheStore port with one JSON
/// file per project, at `<project>/.deptrace/cache.json`. Loads read the
/// whole file; saves replace it. A missing file means no cache yet, but a
/// file that cannot be read or parsed is a fatal `CacheIo` error, since a
/// silently ignored corrupt cache would desynchronize future runs.
pub struct FileCacheStore {
    cache_path: PathBuf,
}

impl FileCacheStore {
    pub fn new(project_root: &Path) -> Self {
        Self {
            cache_path: project_root.join(CACHE_DIR).join(CACHE_FILE),
        }
    }

    fn io_error(&self, operation: &'static str, details: impl ToString) -> anyhow::Error {
        DepTraceError::CacheIo {
            operation,
            path: self.cache_path.clone(),
            details: details.to_string(),
        }
        .into()
    }
}

impl DependencyCacheStore for FileCacheStore {
    fn load(&self) -> Result<Option<HashMap<String, DependencyRecord>>> {
        if !self.cache_path.is_file() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(&self.cache_path).map_err(|e| self.io_error("read", e))?;
        let entries: HashMap<String, DependencyRecord> =
            serde_json::from_str(&content).map_err(|e| self.io_error("read", e))?;
        Ok(Some(entries))
    }

    fn save(&self, entries: &HashMap<String, DependencyRecord>) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error("write", e))?;
        }
        let content =
            serde_json::to_string(entries).map_err(|e| self.io_error("write", e))?;
        fs::write(&self.cache_path, content).map_err(|e| self.io_error("write", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Checksum;

    fn record(name: &str, version: &str) -> DependencyRecord {
        DependencyRecord::new(name, version)
            .with_id(format!("{}-{}.whl", name, version))
            .with_checksum(Checksum::new("sha", "md5"))
    }

    #[test]
    fn test_load_without_cache_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path());

        let mut first = HashMap::new();
        first.insert("a".to_string(), record("a", "1.0"));
        first.insert("c".to_string(), record("c", "1.0"));
        store.save(&first).unwrap();

        let mut reloaded = store.load().unwrap().unwrap();
        assert_eq!(reloaded.len(), 2);

        // Drop one entry, add another; the removed one must not survive
        // the next round trip.
        reloaded.remove("a");
        reloaded.insert("t".to_string(), record("t", "2.0"));
        store.save(&reloaded).unwrap();

        let final_state = store.load().unwrap().unwrap();
        let mut keys: Vec<&str> = final_state.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, ["c", "t"]);
    }

    #[test]
    fn test_corrupt_cache_is_a_fatal_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join(CACHE_DIR);
        fs::create_dir_all(&cache_dir).unwrap();
        fs::write(cache_dir.join(CACHE_FILE), "{broken").unwrap();

        let store = FileCacheStore::new(dir.path());
        let err = store.load().unwrap_err();
        assert!(err
            .downcast_ref::<DepTraceError>()
            .is_some_and(|e| matches!(e, DepTraceError::CacheIo { operation: "read", .. })));
    }

    #[test]
    fn test_checksum_survives_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path());

        let mut entries = HashMap::new();
        entries.insert("requests".to_string(), record("requests", "2.31.0"));
        store.save(&entries).unwrap();

        let reloaded = store.load().unwrap().unwrap();
        let entry = &reloaded["requests"];
        assert_eq!(entry.id, "requests-2.31.0.whl");
        assert_eq!(entry.checksum.as_ref().unwrap().sha1, "sha");
    }
}
