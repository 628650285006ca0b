use super::{Extractor, ProjectContext};
use crate::graph::{DependencyRecord, ExtractedGraph};
use crate::ports::outbound::CommandRunner;
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

const REQUIREMENTS_FILE: &str = "requirements.txt";
const SETUP_PY: &str = "setup.py";

/// pip extractor.
///
/// Root dependencies come from the project's installation file: the
/// requirements file named by `-r`/`--requirement` (or `requirements.txt`
/// in the project root), or `setup.py`'s own dependency list. The full
/// graph comes from the installed environment as reported by pipdeptree's
/// JSON output, expanded from the roots with a worklist so cyclic package
/// graphs terminate.
pub struct PipExtractor {
    runner: Arc<dyn CommandRunner>,
    requirement_matchers: Vec<RequirementMatcher>,
    skip_next_line: Regex,
}

struct RequirementMatcher {
    pattern: Regex,
    match_group: usize,
}

impl PipExtractor {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        // Order is important: the bare package-id pattern matches
        // everything the VCS patterns match, so it must come last.
        let matchers = [
            (r"^((-e\s)?(git\+)|(git://))\w.*?\w.*#egg=([\w-]+)", 5),
            (r"^((-e\s)?hg\+)\w.*?\w.*#egg=([\w-]+)", 3),
            (r"^((-e\s)?svn\+)\w.*?\w.*#egg=([\w-]+)", 3),
            (r"^((-e\s)?bzr\+)\w.*?\w.*#egg=([\w-]+)", 3),
            (r"^\w[\w.-]+", 0),
        ];
        let requirement_matchers = matchers
            .into_iter()
            .map(|(pattern, match_group)| RequirementMatcher {
                pattern: Regex::new(pattern).expect("requirement pattern is valid"),
                match_group,
            })
            .collect();
        Self {
            runner,
            requirement_matchers,
            // A line ending with an unescaped backslash continues on the
            // next line.
            skip_next_line: Regex::new(r".*\\$").expect("skip pattern is valid"),
        }
    }

    /// The requirements file named in the install args, if any.
    fn requirements_path_from_args(project: &ProjectContext) -> Option<PathBuf> {
        let args = &project.install_args;
        for (i, arg) in args.iter().enumerate() {
            if arg == "-r" || arg == "--requirement" {
                return args.get(i + 1).map(|p| project.root.join(p));
            }
            if let Some(path) = arg.strip_prefix("--requirement=") {
                return Some(project.root.join(path));
            }
        }
        None
    }

    fn requirements_path(project: &ProjectContext) -> Option<PathBuf> {
        Self::requirements_path_from_args(project)
            .or_else(|| {
                let default = project.root.join(REQUIREMENTS_FILE);
                default.is_file().then_some(default)
            })
            .filter(|path| path.is_file())
    }

    /// Parses a requirements file into lowercase root package names.
    /// Unparsable lines are logged and skipped, except continuations of a
    /// previous line which are silently skipped.
    fn parse_requirements(&self, content: &str, source: &str) -> Vec<String> {
        let mut dependencies = Vec::new();
        let mut previous_line = "";
        for line in content.lines() {
            let consumed = if line.starts_with('#') {
                previous_line = line;
                continue;
            } else {
                self.consume_requirement_line(line)
            };

            match consumed {
                Some(name) => dependencies.push(name.to_lowercase()),
                None => {
                    if !self.skip_next_line.is_match(previous_line) && !line.trim().is_empty() {
                        log::info!("Failed parsing requirement: '{}' in file: '{}'.", line, source);
                    }
                }
            }
            previous_line = line;
        }
        dependencies
    }

    /// Iterates the matchers in order until one matches.
    fn consume_requirement_line(&self, line: &str) -> Option<String> {
        for matcher in &self.requirement_matchers {
            if let Some(captures) = matcher.pattern.captures(line) {
                return captures
                    .get(matcher.match_group)
                    .map(|m| m.as_str().to_string());
            }
        }
        None
    }

    /// The installed-environment dependency map from pipdeptree.
    async fn environment_packages(
        &self,
        project: &ProjectContext,
    ) -> Result<HashMap<String, PipDependencyPackage>> {
        let args: Vec<String> = ["-m", "pipdeptree", "--json"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let output = self
            .runner
            .run_captured("python", &args, Some(&project.root))
            .await
            .context("failed running pipdeptree")?;
        let packages: Vec<PipDependencyPackage> =
            serde_json::from_str(&output).context("unparsable pipdeptree output")?;
        Ok(packages
            .into_iter()
            .map(|package| (package.package.key.clone(), package))
            .collect())
    }

    /// The project's own package name, for the setup.py root lookup.
    async fn setup_package_name(&self, project: &ProjectContext) -> Result<String> {
        let args: Vec<String> = [SETUP_PY, "--name"].iter().map(|s| s.to_string()).collect();
        let output = self
            .runner
            .run_captured("python", &args, Some(&project.root))
            .await
            .context("failed reading package name from setup.py")?;
        // The name is the last non-empty output line; setuptools may print
        // warnings above it.
        output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .next_back()
            .map(|line| line.trim().to_string())
            .context("setup.py reported no package name")
    }

    async fn root_dependencies(
        &self,
        project: &ProjectContext,
        environment: &HashMap<String, PipDependencyPackage>,
    ) -> Result<Vec<String>> {
        if let Some(path) = Self::requirements_path(project) {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed reading {}", path.display()))?;
            return Ok(self.parse_requirements(&content, &path.display().to_string()));
        }

        let package_name = self.setup_package_name(project).await?;
        let key = package_name.to_lowercase();
        let project_package = environment.get(&key).with_context(|| {
            format!(
                "Failed receiving root dependencies for installed package: {}",
                package_name
            )
        })?;
        Ok(project_package.child_keys())
    }
}

/// Expands the root list against the environment map, discovering
/// transitive dependencies as it goes. A package named in the
/// installation file but absent from the environment (typically part of
/// the Python standard library) gets a bare record with no children.
fn expand_dependencies(
    roots: &[String],
    environment: &HashMap<String, PipDependencyPackage>,
) -> (HashMap<String, DependencyRecord>, HashMap<String, Vec<String>>) {
    let mut all = HashMap::new();
    let mut children = HashMap::new();
    let mut worklist: Vec<String> = roots.to_vec();
    let mut index = 0;

    while index < worklist.len() {
        let current = worklist[index].clone();
        index += 1;
        if all.contains_key(&current) {
            continue;
        }

        let Some(package) = environment.get(&current) else {
            log::debug!(
                "Package name: {} appears in installation file, but is not shown in the environment's installed dependencies.",
                current
            );
            all.insert(current.clone(), DependencyRecord::new(current, ""));
            continue;
        };

        let child_keys = package.child_keys();
        let record = DependencyRecord::new(
            package.package.package_name.clone(),
            package.package.installed_version.clone(),
        );
        all.insert(package.package.key.clone(), record);
        children.insert(package.package.key.clone(), child_keys.clone());
        worklist.extend(child_keys);
    }

    (all, children)
}

#[async_trait]
impl Extractor for PipExtractor {
    fn ecosystem(&self) -> &'static str {
        "pip"
    }

    fn is_compatible(&self, project: &ProjectContext) -> bool {
        if Self::requirements_path(project).is_some() {
            log::debug!("Found requirements file for {}", project.root.display());
            return true;
        }
        let setup_py = project.root.join(SETUP_PY);
        if setup_py.is_file() {
            log::debug!("Found {} file", setup_py.display());
            return true;
        }
        false
    }

    async fn extract(&self, project: &ProjectContext) -> Result<ExtractedGraph> {
        let environment = self.environment_packages(project).await?;
        let roots = self.root_dependencies(project, &environment).await?;
        let (all, children) = expand_dependencies(&roots, &environment);
        Ok(ExtractedGraph::new(roots, all, children))
    }
}

/// pipdeptree JSON objects for deserialization.
#[derive(Debug, Deserialize)]
struct PipDependencyPackage {
    package: PipPackage,
    #[serde(default)]
    dependencies: Vec<PipPackage>,
}

#[derive(Debug, Deserialize)]
struct PipPackage {
    #[serde(default)]
    key: String,
    #[serde(default)]
    package_name: String,
    #[serde(default)]
    installed_version: String,
}

impl PipDependencyPackage {
    fn child_keys(&self) -> Vec<String> {
        self.dependencies
            .iter()
            .map(|dep| dep.key.to_lowercase())
            .collect()
    }
}
