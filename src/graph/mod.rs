/// Domain layer - dependency records, extracted graphs, root inference
/// and the nested tree builder.
///
/// Everything in this module is pure, synchronous, in-memory data work.
/// Network reconciliation lives in `crate::reconcile` and filesystem /
/// process access behind the ports in `crate::ports`.
pub mod dependency;
pub mod extraction;
pub mod roots;
pub mod tree;

pub use dependency::{BuildInfoDependency, Checksum, DependencyRecord};
pub use extraction::ExtractedGraph;
pub use roots::infer_roots;
pub use tree::{build_dependency_tree, TreeNode};
