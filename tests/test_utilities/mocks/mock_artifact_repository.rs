use async_trait::async_trait;
use deptrace::prelude::*;
use std::collections::HashMap;

/// Mock ArtifactRepository for testing
///
/// File-name searches are answered by the exact file name; name-and-version
/// searches by the `<name>-<version>` key.
#[derive(Default)]
pub struct MockArtifactRepository {
    artifacts: HashMap<String, ArtifactHit>,
    should_fail: bool,
}

impl MockArtifactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact(mut self, key: &str, name: &str, sha1: &str, md5: &str) -> Self {
        self.artifacts.insert(
            key.to_string(),
            ArtifactHit {
                name: name.to_string(),
                actual_sha1: sha1.to_string(),
                actual_md5: md5.to_string(),
            },
        );
        self
    }

    pub fn with_failure() -> Self {
        Self {
            artifacts: HashMap::new(),
            should_fail: true,
        }
    }
}

#[async_trait]
impl ArtifactRepository for MockArtifactRepository {
    async fn search_by_file_name(
        &self,
        _repository: &str,
        file_name: &str,
    ) -> Result<Vec<ArtifactHit>> {
        if self.should_fail {
            anyhow::bail!("Mock artifact repository failure");
        }
        Ok(self.artifacts.get(file_name).cloned().into_iter().collect())
    }

    async fn search_by_name_and_version(
        &self,
        _repository: &str,
        name: &str,
        version: &str,
    ) -> Result<Vec<ArtifactHit>> {
        if self.should_fail {
            anyhow::bail!("Mock artifact repository failure");
        }
        let key = format!("{}-{}", name, version);
        Ok(self.artifacts.get(&key).cloned().into_iter().collect())
    }
}
