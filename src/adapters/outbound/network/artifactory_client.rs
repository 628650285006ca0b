use crate::ports::outbound::{ArtifactHit, ArtifactRepository};
use crate::shared::{DepTraceError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct AqlResponse {
    #[serde(default)]
    results: Vec<ArtifactHit>,
}

/// AqlArtifactRepository adapter for checksum lookups against an
/// artifact server's AQL search endpoint.
///
/// This adapter implements the ArtifactRepository port, providing async
/// network access to `POST <server>/api/search/aql` with the query as a
/// plain-text body. Two query shapes are supported: exact file name
/// within a repository (pip), and package name plus version properties
/// (npm). An empty result list is a valid answer, not an error.
pub struct AqlArtifactRepository {
    client: reqwest::Client,
    server_url: String,
    access_token: Option<String>,
    max_retries: u32,
}

impl AqlArtifactRepository {
    pub fn new(server_url: impl Into<String>, access_token: Option<String>) -> Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("deptrace/{}", version);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            server_url: server_url.into().trim_end_matches('/').to_string(),
            access_token,
            max_retries: 3,
        })
    }

    /// Runs an AQL query with retry logic (async)
    async fn search_with_retry(&self, query: &str) -> Result<Vec<ArtifactHit>> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.search(query).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap())
    }

    async fn search(&self, query: &str) -> Result<Vec<ArtifactHit>> {
        let url = format!("{}/api/search/aql", self.server_url);
        let mut request = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(query.to_string());
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            DepTraceError::RepositoryQuery {
                details: e.to_string(),
            }
        })?;
        if !response.status().is_success() {
            return Err(DepTraceError::RepositoryQuery {
                details: format!("AQL endpoint returned status code {}", response.status()),
            }
            .into());
        }

        let parsed: AqlResponse = response.json().await.map_err(|e| {
            DepTraceError::RepositoryQuery {
                details: format!("unparsable AQL response: {}", e),
            }
        })?;
        Ok(parsed.results)
    }

    /// The find criteria are built as a JSON value first so that package
    /// and file names cannot break out of the query syntax.
    fn file_name_query(repository: &str, file_name: &str) -> String {
        let criteria = json!({
            "repo": repository,
            "$or": [{
                "$and": [{
                    "path": { "$match": "*" },
                    "name": { "$match": file_name }
                }]
            }]
        });
        format!(
            r#"items.find({}).include("name","actual_md5","actual_sha1")"#,
            criteria
        )
    }

    fn name_version_query(name: &str, version: &str) -> String {
        let criteria = json!({
            "@npm.name": name,
            "@npm.version": version
        });
        format!(
            r#"items.find({}).include("name","actual_md5","actual_sha1")"#,
            criteria
        )
    }
}

#[async_trait]
impl ArtifactRepository for AqlArtifactRepository {
    async fn search_by_file_name(
        &self,
        repository: &str,
        file_name: &str,
    ) -> Result<Vec<ArtifactHit>> {
        let query = Self::file_name_query(repository, file_name);
        log::debug!("Running AQL query: {}", query);
        self.search_with_retry(&query).await
    }

    async fn search_by_name_and_version(
        &self,
        _repository: &str,
        name: &str,
        version: &str,
    ) -> Result<Vec<ArtifactHit>> {
        let query = Self::name_version_query(name, version);
        log::debug!("Running AQL query: {}", query);
        self.search_with_retry(&query).await
    }
}
