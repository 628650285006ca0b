use deptrace::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock DependencyCacheStore holding entries in memory
#[derive(Default)]
pub struct MockCacheStore {
    entries: Arc<Mutex<Option<HashMap<String, DependencyRecord>>>>,
    should_fail: bool,
}

impl MockCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, record: DependencyRecord) -> Self {
        {
            let mut entries = self.entries.lock().unwrap();
            entries
                .get_or_insert_with(HashMap::new)
                .insert(key.to_string(), record);
        }
        self
    }

    pub fn with_failure() -> Self {
        Self {
            entries: Arc::new(Mutex::new(None)),
            should_fail: true,
        }
    }

    /// The current cache content, `None` when nothing was ever stored.
    pub fn saved(&self) -> Option<HashMap<String, DependencyRecord>> {
        self.entries.lock().unwrap().clone()
    }
}

impl DependencyCacheStore for MockCacheStore {
    fn load(&self) -> Result<Option<HashMap<String, DependencyRecord>>> {
        if self.should_fail {
            anyhow::bail!("Mock cache store failure");
        }
        Ok(self.entries.lock().unwrap().clone())
    }

    fn save(&self, entries: &HashMap<String, DependencyRecord>) -> Result<()> {
        if self.should_fail {
            anyhow::bail!("Mock cache store failure");
        }
        *self.entries.lock().unwrap() = Some(entries.clone());
        Ok(())
    }
}
