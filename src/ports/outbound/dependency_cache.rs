use crate::graph::DependencyRecord;
use crate::shared::Result;
use std::collections::HashMap;

/// DependencyCacheStore port for the per-project persisted dependency
/// cache.
///
/// Lifecycle per run: full-read-on-load once at the start, full
/// overwrite-on-save at the end with the run's resolved set, so entries
/// for dependencies no longer present in the project drop out naturally.
///
/// # Errors
/// Corruption on read must surface as an error, never as a silent empty
/// cache; a stale cache silently poisons future runs.
pub trait DependencyCacheStore {
    /// Loads the persisted cache. `Ok(None)` when no cache exists yet.
    fn load(&self) -> Result<Option<HashMap<String, DependencyRecord>>>;

    /// Persists `entries`, replacing (not merging with) the previous
    /// cache content.
    fn save(&self, entries: &HashMap<String, DependencyRecord>) -> Result<()>;
}
