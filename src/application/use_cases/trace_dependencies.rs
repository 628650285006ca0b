use crate::application::dto::{TraceRequest, TraceResponse};
use crate::extractors::{default_extractors, select_extractor, ProjectContext};
use crate::graph::{build_dependency_tree, BuildInfoDependency, ExtractedGraph};
use crate::ports::outbound::{
    ArtifactRepository, CommandRunner, DependencyCacheStore, ProgressReporter,
};
use crate::reconcile::{is_verbose, ChecksumReconciler, InstallLogParser, QuerySpec};
use crate::shared::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// TraceDependenciesUseCase - Core use case for dependency tracing
///
/// Orchestrates the whole run: extractor selection, optional install-log
/// capture, graph extraction, root inference, checksum reconciliation and
/// tree building. Infrastructure is injected through the outbound ports.
///
/// # Type Parameters
/// * `PR` - ProgressReporter implementation
pub struct TraceDependenciesUseCase<PR> {
    runner: Arc<dyn CommandRunner>,
    artifact_repository: Arc<dyn ArtifactRepository>,
    cache: Arc<dyn DependencyCacheStore>,
    progress_reporter: PR,
    target_repository: String,
    threads: usize,
    query_timeout: Duration,
}

impl<PR> TraceDependenciesUseCase<PR>
where
    PR: ProgressReporter,
{
    /// Creates a new TraceDependenciesUseCase with injected dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        artifact_repository: Arc<dyn ArtifactRepository>,
        cache: Arc<dyn DependencyCacheStore>,
        progress_reporter: PR,
        target_repository: impl Into<String>,
        threads: usize,
        query_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            artifact_repository,
            cache,
            progress_reporter,
            target_repository: target_repository.into(),
            threads,
            query_timeout,
        }
    }

    /// Executes the dependency tracing use case
    pub async fn execute(&self, request: TraceRequest) -> Result<TraceResponse> {
        // Step 1: Pick the extractor via the ordered compatibility probe.
        let project = ProjectContext::new(&request.project_path)
            .with_install_args(request.install_args.clone());
        let extractors = default_extractors(self.runner.clone());
        let extractor = select_extractor(&extractors, &project)?;
        let ecosystem = extractor.ecosystem();
        self.progress_reporter.report(&format!(
            "Resolving {} dependencies for: {}",
            ecosystem,
            project.root.display()
        ));

        // Step 2: Obtain the install output and, for pip, the package to
        // downloaded-file map it encodes.
        let install_output = self.capture_install_output(ecosystem, &request, &project).await?;
        let downloads = match (ecosystem, install_output) {
            ("pip", Some(output)) => {
                let parser = InstallLogParser::new(is_verbose(&request.install_args));
                Some(parser.parse(&output))
            }
            _ => None,
        };

        // Step 3: Extract the graph and make sure roots are known.
        let mut graph = extractor.extract(&project).await?;
        graph.ensure_roots();
        self.progress_reporter.report(&format!(
            "Extracted {} dependencies, {} direct",
            graph.all_dependencies().len(),
            graph.direct_dependencies().len()
        ));

        // Step 4: Reconcile checksums where the ecosystem supports it.
        // Dependencies the install log never mentioned still take part:
        // they get a cache-only plan and end up in the missing report
        // when the cache has no answer either.
        let missing = match self.build_plans(ecosystem, &graph, downloads.as_ref()) {
            Some(plans) => {
                let reconciler = ChecksumReconciler::new(
                    self.artifact_repository.clone(),
                    self.cache.clone(),
                    &self.target_repository,
                    self.threads,
                    self.query_timeout,
                );
                let mut all = graph.take_all_dependencies();
                let outcome = reconciler.reconcile(&mut all, &plans).await?;
                graph.set_all_dependencies(all);
                outcome.missing
            }
            // NuGet checksums were computed from the local package cache
            // during extraction; there is nothing to reconcile.
            None => Vec::new(),
        };

        if !missing.is_empty() {
            self.progress_reporter.warn(&missing.join("\n"));
            self.progress_reporter.warn(
                "The dependencies above could not be found in the artifact repository \
                 and are not included in the build-info.\n\
                 Make sure the dependencies are available in the repository for this build.",
            );
        }

        // Step 5: Build the tree and the flat build-info list.
        let tree = build_dependency_tree(
            graph.direct_dependencies(),
            graph.all_dependencies(),
            graph.children_map(),
        );
        let dependencies: Vec<BuildInfoDependency> = graph
            .all_dependencies()
            .values()
            .map(BuildInfoDependency::from)
            .collect();
        self.progress_reporter.report(&format!(
            "✅ Traced {} dependencies, {} missing",
            dependencies.len(),
            missing.len()
        ));

        Ok(TraceResponse {
            tree,
            dependencies,
            missing,
        })
    }

    /// A pre-captured install log wins; otherwise run the ecosystem's
    /// install command when asked to. NuGet never installs here.
    async fn capture_install_output(
        &self,
        ecosystem: &str,
        request: &TraceRequest,
        project: &ProjectContext,
    ) -> Result<Option<String>> {
        if let Some(log) = &request.install_log {
            return Ok(Some(log.clone()));
        }
        if !request.run_install || !matches!(ecosystem, "pip" | "npm") {
            return Ok(None);
        }

        self.progress_reporter
            .report(&format!("Running {} install", ecosystem));
        let mut args = vec!["install".to_string()];
        args.extend(request.install_args.iter().cloned());
        let output = self
            .runner
            .run_captured(ecosystem, &args, Some(&project.root))
            .await?;
        Ok(Some(output))
    }

    /// Per-dependency query plans. npm always queries by coordinates; pip
    /// queries by the downloaded file name when the install log produced
    /// one, and falls back to the cache otherwise. `None` means the
    /// ecosystem does not reconcile remotely.
    fn build_plans(
        &self,
        ecosystem: &str,
        graph: &ExtractedGraph,
        downloads: Option<&HashMap<String, String>>,
    ) -> Option<HashMap<String, QuerySpec>> {
        match ecosystem {
            "npm" => Some(
                graph
                    .all_dependencies()
                    .iter()
                    .map(|(key, record)| {
                        (
                            key.clone(),
                            QuerySpec::ByNameAndVersion {
                                name: record.name.clone(),
                                version: record.version.clone(),
                            },
                        )
                    })
                    .collect(),
            ),
            "pip" => Some(
                graph
                    .all_dependencies()
                    .keys()
                    .map(|key| {
                        let spec = downloads
                            .and_then(|map| map.get(key))
                            .filter(|file| !file.is_empty())
                            .map(|file| QuerySpec::ByFileName(file.clone()))
                            .unwrap_or(QuerySpec::CacheOnly);
                        (key.clone(), spec)
                    })
                    .collect(),
            ),
            _ => None,
        }
    }
}
