use super::{Extractor, ProjectContext};
use crate::graph::{DependencyRecord, ExtractedGraph};
use crate::ports::outbound::CommandRunner;
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const PACKAGE_JSON: &str = "package.json";

/// npm extractor.
///
/// Runs `npm ls --json` once per dependency scope (production and
/// development, unless the install arguments restrict the run to one) and
/// walks the nested `dependencies` objects. A package listed under both
/// scopes gets both scope labels on a single record.
pub struct NpmExtractor {
    runner: Arc<dyn CommandRunner>,
}

impl NpmExtractor {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Scope restriction derived from the install arguments, mirroring
    /// npm's own flag handling: `--production` or `--only=production`
    /// restricts to production, `--only=development`/`--only=dev` to
    /// development, otherwise both scopes are listed.
    fn type_restriction(args: &[String]) -> Option<&'static str> {
        for arg in args {
            match arg.as_str() {
                "--production" | "--only=production" | "--only=prod" => return Some("production"),
                "--only=development" | "--only=dev" => return Some("development"),
                _ => {}
            }
        }
        None
    }

    /// Graph key for one listed package. npm trees routinely carry two
    /// versions of the same package, so records are keyed by
    /// `name-version`; a package without version information falls back
    /// to the bare name (it is never recorded, only walked).
    fn node_key(name: &str, info: &Value) -> String {
        match info.get("version").and_then(Value::as_str) {
            Some(version) => format!("{}-{}", name.to_lowercase(), version),
            None => name.to_lowercase(),
        }
    }

    async fn list_scope(
        &self,
        project: &ProjectContext,
        scope: &str,
        all: &mut HashMap<String, DependencyRecord>,
        children: &mut HashMap<String, Vec<String>>,
        roots: &mut Vec<String>,
    ) -> Result<()> {
        let args = vec![
            "ls".to_string(),
            "--json".to_string(),
            format!("--only={}", scope),
        ];
        let output = self
            .runner
            .run_captured("npm", &args, Some(&project.root))
            .await
            .with_context(|| format!("npm ls failed for scope '{}'", scope))?;

        let listing: Value = serde_json::from_str(&output)
            .with_context(|| format!("unparsable npm ls output for scope '{}'", scope))?;

        if let Some(direct) = listing.get("dependencies").and_then(Value::as_object) {
            for (name, info) in direct {
                let id = Self::node_key(name, info);
                if !roots.contains(&id) {
                    roots.push(id);
                }
            }
            Self::collect(direct, scope, all, children);
        }
        Ok(())
    }

    /// Recursive walk over one `dependencies` object. Packages reported
    /// without version information are warned about and not recorded, but
    /// their subtree is still walked.
    fn collect(
        dependencies: &serde_json::Map<String, Value>,
        scope: &str,
        all: &mut HashMap<String, DependencyRecord>,
        children: &mut HashMap<String, Vec<String>>,
    ) {
        for (name, info) in dependencies {
            let id = Self::node_key(name, info);
            match info.get("version").and_then(Value::as_str) {
                Some(version) => {
                    let record = all
                        .entry(id.clone())
                        .or_insert_with(|| DependencyRecord::new(name.clone(), version));
                    record.add_scope(scope);
                }
                None => {
                    log::warn!(
                        "npm dependencies list contains the package '{}' without version information. \
                         The dependency will not be added to build-info.",
                        name
                    );
                }
            }

            if let Some(transitive) = info.get("dependencies").and_then(Value::as_object) {
                let child_ids: Vec<String> = transitive
                    .iter()
                    .map(|(child, child_info)| Self::node_key(child, child_info))
                    .collect();
                let entry = children.entry(id).or_default();
                for child in child_ids {
                    if !entry.contains(&child) {
                        entry.push(child);
                    }
                }
                Self::collect(transitive, scope, all, children);
            } else {
                children.entry(id).or_default();
            }
        }
    }
}

#[async_trait]
impl Extractor for NpmExtractor {
    fn ecosystem(&self) -> &'static str {
        "npm"
    }

    fn is_compatible(&self, project: &ProjectContext) -> bool {
        let marker = project.root.join(PACKAGE_JSON);
        if marker.is_file() {
            log::debug!("Found {} file", marker.display());
            return true;
        }
        false
    }

    async fn extract(&self, project: &ProjectContext) -> Result<ExtractedGraph> {
        let restriction = Self::type_restriction(&project.install_args);
        let mut all = HashMap::new();
        let mut children = HashMap::new();
        let mut roots = Vec::new();

        if restriction != Some("production") {
            self.list_scope(project, "development", &mut all, &mut children, &mut roots)
                .await?;
        }
        if restriction != Some("development") {
            self.list_scope(project, "production", &mut all, &mut children, &mut roots)
                .await?;
        }

        Ok(ExtractedGraph::new(roots, all, children))
    }
}
