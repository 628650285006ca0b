use super::{file_checksums, Extractor, ProjectContext};
use crate::graph::{DependencyRecord, ExtractedGraph};
use crate::shared::{DepTraceError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const ASSETS_FILE: &str = "project.assets.json";

/// NuGet `project.assets.json` extractor (SDK-style projects).
///
/// The assets file self-reports everything: the resolved libraries, the
/// per-target adjacency and the project's declared direct dependencies.
/// Checksums are computed from the nupkg files in the local package cache
/// rather than queried remotely. A library whose nupkg is absent but which
/// appears in the targets section is an SDK-provided package and is
/// skipped with a warning; absent from both is a fatal
/// `MissingPackageArtifact`.
pub struct NugetAssetsExtractor;

impl NugetAssetsExtractor {
    pub fn new() -> Self {
        Self
    }

    fn assets_path(project: &ProjectContext) -> PathBuf {
        project.root.join("obj").join(ASSETS_FILE)
    }

    fn load(path: &Path) -> Result<Assets> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DepTraceError::ExtractionParse {
                path: path.to_path_buf(),
                details: e.to_string(),
            }
        })?;
        let assets: Assets =
            serde_json::from_str(&content).map_err(|e| DepTraceError::ExtractionParse {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;
        Ok(assets)
    }
}

impl Default for NugetAssetsExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for NugetAssetsExtractor {
    fn ecosystem(&self) -> &'static str {
        "nuget"
    }

    fn is_compatible(&self, project: &ProjectContext) -> bool {
        let marker = Self::assets_path(project);
        if marker.is_file() {
            log::debug!("Found {} file", marker.display());
            return true;
        }
        false
    }

    async fn extract(&self, project: &ProjectContext) -> Result<ExtractedGraph> {
        let assets = Self::load(&Self::assets_path(project))?;
        let all = assets.all_dependencies()?;
        let children = assets.children_map();
        let roots = assets.direct_dependencies();
        Ok(ExtractedGraph::new(roots, all, children))
    }
}

/// Assets json objects for deserialization.
#[derive(Debug, Deserialize)]
struct Assets {
    #[serde(default)]
    targets: HashMap<String, HashMap<String, TargetDependency>>,
    #[serde(default)]
    libraries: HashMap<String, Library>,
    #[serde(default)]
    project: Project,
}

#[derive(Debug, Deserialize)]
struct TargetDependency {
    /// Transitive dependencies: name -> version range.
    #[serde(default)]
    dependencies: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Library {
    #[serde(default, rename = "type")]
    library_type: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Project {
    #[serde(default)]
    restore: Restore,
    #[serde(default)]
    frameworks: HashMap<String, Framework>,
}

#[derive(Debug, Default, Deserialize)]
struct Restore {
    #[serde(default, rename = "packagesPath")]
    packages_path: String,
}

#[derive(Debug, Deserialize)]
struct Framework {
    /// Direct dependencies: name -> target/version object.
    #[serde(default)]
    dependencies: HashMap<String, Value>,
}

impl Library {
    /// The nupkg file name is recorded indirectly, as the `.nupkg.sha512`
    /// entry of the library's file list.
    fn nupkg_file_name(&self) -> Result<String> {
        for file in &self.files {
            if let Some(name) = file.strip_suffix(".sha512") {
                if name.ends_with(".nupkg") {
                    return Ok(name.to_string());
                }
            }
        }
        anyhow::bail!("Could not find nupkg file name for: {}", self.path)
    }
}

impl Assets {
    fn all_dependencies(&self) -> Result<HashMap<String, DependencyRecord>> {
        let mut dependencies = HashMap::new();
        let packages_path = PathBuf::from(&self.project.restore.packages_path);
        for (library_id, library) in &self.libraries {
            if library.library_type == "project" {
                continue;
            }
            let nupkg_name = library.nupkg_file_name()?;
            let nupkg_path = packages_path.join(&library.path).join(&nupkg_name);
            if !nupkg_path.is_file() {
                if self.is_part_of_target_dependencies(&library.path) {
                    log::warn!(
                        "The file {} doesn't exist in the NuGet cache directory but it does exist as a target in the assets file. \
                         Assuming this is an SDK-provided package and excluding it from build-info.",
                        nupkg_path.display()
                    );
                    continue;
                }
                return Err(DepTraceError::MissingPackageArtifact { path: nupkg_path }.into());
            }
            let checksum = file_checksums(&nupkg_path)?;

            let (name, version) = split_library_id(library_id);
            let record = DependencyRecord::new(name.clone(), version)
                .with_id(library_id.replacen('/', ":", 1))
                .with_checksum(checksum);
            dependencies.insert(name.to_lowercase(), record);
        }
        Ok(dependencies)
    }

    fn children_map(&self) -> HashMap<String, Vec<String>> {
        let mut relations = HashMap::new();
        for target in self.targets.values() {
            for (dependency_id, target_dependency) in target {
                let (name, _) = split_library_id(dependency_id);
                let transitive: Vec<String> = target_dependency
                    .dependencies
                    .keys()
                    .map(|n| n.to_lowercase())
                    .collect();
                relations.insert(name.to_lowercase(), transitive);
            }
        }
        relations
    }

    fn direct_dependencies(&self) -> Vec<String> {
        let mut direct = Vec::new();
        for framework in self.project.frameworks.values() {
            for name in framework.dependencies.keys() {
                let id = name.to_lowercase();
                if !direct.contains(&id) {
                    direct.push(id);
                }
            }
        }
        direct
    }

    /// Package names in the targets section are case insensitive.
    fn is_part_of_target_dependencies(&self, library_path: &str) -> bool {
        self.targets.values().any(|target| {
            target
                .keys()
                .any(|dependency_id| dependency_id.eq_ignore_ascii_case(library_path))
        })
    }
}

/// Library ids are `<package-name>/<version>`.
fn split_library_id(library_id: &str) -> (String, String) {
    match library_id.split_once('/') {
        Some((name, version)) => (name.to_string(), version.to_string()),
        None => (library_id.to_string(), String::new()),
    }
}
