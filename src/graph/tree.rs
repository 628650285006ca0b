use super::dependency::DependencyRecord;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One node of the nested dependency tree.
///
/// Serializes as the dependency's own fields merged with a `dependencies`
/// key holding the child nodes, omitted when empty. Sibling order is not
/// stable across runs since it originates from map iteration.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub dependency: DependencyRecord,
    #[serde(rename = "dependencies", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(dependency: DependencyRecord) -> Self {
        Self {
            dependency,
            children: Vec::new(),
        }
    }
}

/// Composes root ids, the all-dependencies map and the children map into a
/// nested tree. Roots and children absent from `all_dependencies` are
/// silently skipped. A child already present on the current branch is a
/// cycle; it is truncated with a leaf marker node (`<id> (cycle)`) instead
/// of recursing, so cyclic adjacency cannot overflow the stack.
pub fn build_dependency_tree(
    roots: &[String],
    all_dependencies: &HashMap<String, DependencyRecord>,
    children_map: &HashMap<String, Vec<String>>,
) -> Vec<TreeNode> {
    let mut forest = Vec::new();
    for root in roots {
        let Some((key, record)) = all_dependencies.get_key_value(root) else {
            // No such root, skip.
            continue;
        };
        let mut on_branch = HashSet::from([key.as_str()]);
        forest.push(build_node(
            key,
            record,
            all_dependencies,
            children_map,
            &mut on_branch,
        ));
    }
    forest
}

fn build_node<'a>(
    id: &'a str,
    record: &DependencyRecord,
    all_dependencies: &'a HashMap<String, DependencyRecord>,
    children_map: &'a HashMap<String, Vec<String>>,
    on_branch: &mut HashSet<&'a str>,
) -> TreeNode {
    let mut node = TreeNode::leaf(record.clone());
    let Some(children) = children_map.get(id) else {
        return node;
    };
    for child in children {
        let Some(child_record) = all_dependencies.get(child) else {
            // No such child, skip.
            continue;
        };
        if on_branch.contains(child.as_str()) {
            node.children.push(cycle_marker(child, child_record));
            continue;
        }
        on_branch.insert(child.as_str());
        node.children.push(build_node(
            child,
            child_record,
            all_dependencies,
            children_map,
            on_branch,
        ));
        on_branch.remove(child.as_str());
    }
    node
}

fn cycle_marker(id: &str, record: &DependencyRecord) -> TreeNode {
    let mut marker = record.clone();
    marker.id = format!("{} (cycle)", id);
    TreeNode::leaf(marker)
}
