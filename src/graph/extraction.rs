use super::dependency::DependencyRecord;
use super::roots::infer_roots;
use std::collections::HashMap;

/// The product of a single extraction run: the root-dependency id list,
/// the all-dependencies map and the children adjacency map.
///
/// Ids are ecosystem-normalized (case-folded; `name-version` for npm,
/// lowercase package name for NuGet and pip) and unique within a run.
/// The adjacency map is built once by the extractor and only read
/// afterwards; reconciliation mutates the records map in place.
#[derive(Debug, Clone, Default)]
pub struct ExtractedGraph {
    roots: Vec<String>,
    all_dependencies: HashMap<String, DependencyRecord>,
    children: HashMap<String, Vec<String>>,
}

impl ExtractedGraph {
    pub fn new(
        roots: Vec<String>,
        all_dependencies: HashMap<String, DependencyRecord>,
        children: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            roots,
            all_dependencies,
            children,
        }
    }

    /// Explicit root packages declared by the project manifest. Empty when
    /// the ecosystem cannot self-report roots (NuGet packages.config lists
    /// the flattened resolved set only); use [`ensure_roots`] in that case.
    ///
    /// [`ensure_roots`]: ExtractedGraph::ensure_roots
    pub fn direct_dependencies(&self) -> &[String] {
        &self.roots
    }

    pub fn all_dependencies(&self) -> &HashMap<String, DependencyRecord> {
        &self.all_dependencies
    }

    pub fn children_map(&self) -> &HashMap<String, Vec<String>> {
        &self.children
    }

    pub fn take_all_dependencies(&mut self) -> HashMap<String, DependencyRecord> {
        std::mem::take(&mut self.all_dependencies)
    }

    pub fn set_all_dependencies(&mut self, all: HashMap<String, DependencyRecord>) {
        self.all_dependencies = all;
    }

    /// Derives the root set from the graph when the extractor reported none.
    pub fn ensure_roots(&mut self) {
        if self.roots.is_empty() {
            self.roots = infer_roots(&self.all_dependencies, &self.children);
        }
    }
}
