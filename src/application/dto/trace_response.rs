use crate::graph::{BuildInfoDependency, TreeNode};
use crate::shared::Result;

/// Response DTO for the dependency tracing use case.
#[derive(Debug)]
pub struct TraceResponse {
    /// Nested dependency tree, one node per root.
    pub tree: Vec<TreeNode>,
    /// Flat build-info dependency list (reconciled entries only).
    pub dependencies: Vec<BuildInfoDependency>,
    /// `<name>-<version>` ids of dependencies with no established
    /// provenance, already excluded from `tree` and `dependencies`.
    pub missing: Vec<String>,
}

impl TraceResponse {
    pub fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }

    /// The tree as indented JSON, for stdout or file output.
    pub fn tree_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.tree)?)
    }
}
