use super::{file_checksums, Extractor, ProjectContext};
use crate::graph::{DependencyRecord, ExtractedGraph};
use crate::ports::outbound::CommandRunner;
use crate::shared::{DepTraceError, Result};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const PACKAGES_CONFIG: &str = "packages.config";

/// NuGet `packages.config` extractor (legacy projects).
///
/// packages.config lists the flattened resolved set with no root/child
/// metadata, so this extractor reports no direct dependencies; root
/// inference over the nuspec-derived adjacency happens downstream. The
/// on-disk package cache is keyed by NuGet's normalized version string,
/// which may disagree with the declared version in trailing zero
/// components; see [`alternate_version_forms`].
pub struct NugetPackagesConfigExtractor {
    runner: Arc<dyn CommandRunner>,
}

impl NugetPackagesConfigExtractor {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Asks the NuGet CLI where the global package cache lives.
    async fn global_packages_cache(&self) -> Result<PathBuf> {
        let args: Vec<String> = ["locals", "global-packages", "-list"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let output = self.runner.run_captured("nuget", &args, None).await?;
        let path = output
            .trim()
            .strip_prefix("global-packages:")
            .unwrap_or(output.trim())
            .trim();
        let path = PathBuf::from(path);
        if !path.is_dir() {
            anyhow::bail!("Could not find global packages path at: {}", path.display());
        }
        Ok(path)
    }

    fn load_packages_config(path: &Path) -> Result<PackagesConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DepTraceError::ExtractionParse {
                path: path.to_path_buf(),
                details: e.to_string(),
            }
        })?;
        quick_xml::de::from_str(&content).map_err(|e| {
            DepTraceError::ExtractionParse {
                path: path.to_path_buf(),
                details: e.to_string(),
            }
            .into()
        })
    }

    /// Locates the package's directory in the cache, trying the declared
    /// version first and then its alternate zero-padded/zero-trimmed
    /// forms. Returns the version string the cache actually uses, or
    /// `None` when no form resolves.
    fn resolve_cache_version(cache: &Path, id_lower: &str, declared: &str) -> Option<String> {
        let mut candidates = vec![declared.to_string()];
        candidates.extend(alternate_version_forms(declared));
        candidates.into_iter().find(|version| {
            cache
                .join(id_lower)
                .join(version)
                .join(format!("{}.{}.nupkg", id_lower, version))
                .is_file()
        })
    }

    /// Children ids from the package's own nuspec. A nuspec that cannot
    /// be read is fatal (the cache directory is broken); one that fails
    /// to parse only degrades this package's adjacency.
    fn nuspec_children(cache: &Path, id_lower: &str, version: &str) -> Result<Vec<String>> {
        let nuspec_path = cache
            .join(id_lower)
            .join(version)
            .join(format!("{}.nuspec", id_lower));
        let content = std::fs::read_to_string(&nuspec_path).with_context(|| {
            format!(
                "Failed to read nuspec for package {}:{} at {}",
                id_lower,
                version,
                nuspec_path.display()
            )
        })?;
        let nuspec: Nuspec = match quick_xml::de::from_str(&content) {
            Ok(nuspec) => nuspec,
            Err(e) => {
                log::warn!(
                    "Package {}:{} couldn't be parsed: {}. Skipping the package dependencies.",
                    id_lower,
                    version,
                    e
                );
                return Ok(Vec::new());
            }
        };

        let mut children = Vec::new();
        let deps = nuspec.metadata.dependencies;
        for dependency in &deps.dependencies {
            push_unique(&mut children, dependency.id.to_lowercase());
        }
        for group in &deps.groups {
            for dependency in &group.dependencies {
                push_unique(&mut children, dependency.id.to_lowercase());
            }
        }
        Ok(children)
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[async_trait]
impl Extractor for NugetPackagesConfigExtractor {
    fn ecosystem(&self) -> &'static str {
        "nuget"
    }

    fn is_compatible(&self, project: &ProjectContext) -> bool {
        let marker = project.root.join(PACKAGES_CONFIG);
        if marker.is_file() {
            log::debug!("Found {} file", marker.display());
            return true;
        }
        false
    }

    async fn extract(&self, project: &ProjectContext) -> Result<ExtractedGraph> {
        let config = Self::load_packages_config(&project.root.join(PACKAGES_CONFIG))?;
        let cache = self.global_packages_cache().await?;

        let mut all = HashMap::new();
        let mut children = HashMap::new();
        for package in &config.packages {
            let id_lower = package.id.to_lowercase();
            let Some(cache_version) =
                Self::resolve_cache_version(&cache, &id_lower, &package.version)
            else {
                log::warn!(
                    "The NuGet package {} with version {} was not found in the NuGet cache {} and therefore was not \
                     added to the dependency tree. This might be because the package already exists in a different \
                     NuGet cache, possibly the SDK cache. Removing the package from this cache may resolve the issue.",
                    package.id,
                    package.version,
                    cache.display()
                );
                continue;
            };

            let nupkg_path = cache
                .join(&id_lower)
                .join(&cache_version)
                .join(format!("{}.{}.nupkg", id_lower, cache_version));
            let checksum = file_checksums(&nupkg_path)?;

            let record = DependencyRecord::new(package.id.clone(), package.version.clone())
                .with_id(format!("{}:{}", package.id, package.version))
                .with_checksum(checksum);
            children.insert(
                id_lower.clone(),
                Self::nuspec_children(&cache, &id_lower, &cache_version)?,
            );
            all.insert(id_lower, record);
        }

        // packages.config carries no root metadata; roots are inferred
        // from the adjacency downstream.
        Ok(ExtractedGraph::new(Vec::new(), all, children))
    }
}

/// NuGet allows the declared version to carry missing or unnecessary
/// trailing zeros relative to the cache directory name. Returns the
/// alternate forms to try, longest first, stopping once a candidate does
/// not end in `.0` since further trimming cannot produce new valid forms.
///
/// `"1.0"` -> `["1.0.0.0", "1.0.0", "1"]`
/// `"1.22.33"` -> `["1.22.33.0"]`
/// `"1.22.33.44"` -> `[]`
pub fn alternate_version_forms(declared: &str) -> Vec<String> {
    let mut parts: Vec<&str> = declared.split('.').collect();
    while parts.len() < 4 {
        parts.push("0");
    }

    let mut alternatives = Vec::new();
    for take in (1..=4).rev() {
        let form = parts[..take].join(".");
        if form != declared {
            alternatives.push(form.clone());
        }
        if !form.ends_with(".0") {
            return alternatives;
        }
    }
    alternatives
}

/// packages.config xml objects for deserialization.
#[derive(Debug, Deserialize)]
struct PackagesConfig {
    #[serde(rename = "package", default)]
    packages: Vec<XmlPackage>,
}

#[derive(Debug, Deserialize)]
struct XmlPackage {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@version")]
    version: String,
}

#[derive(Debug, Deserialize)]
struct Nuspec {
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    dependencies: XmlDependencies,
}

#[derive(Debug, Default, Deserialize)]
struct XmlDependencies {
    #[serde(rename = "group", default)]
    groups: Vec<DependencyGroup>,
    #[serde(rename = "dependency", default)]
    dependencies: Vec<XmlDependency>,
}

#[derive(Debug, Default, Deserialize)]
struct DependencyGroup {
    #[serde(rename = "dependency", default)]
    dependencies: Vec<XmlDependency>,
}

#[derive(Debug, Deserialize)]
struct XmlDependency {
    #[serde(rename = "@id")]
    id: String,
}
