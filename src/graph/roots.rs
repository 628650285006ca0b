use super::dependency::DependencyRecord;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct NodeState {
    visited: bool,
    not_root: bool,
    circular: bool,
}

enum Frame {
    /// Examine one edge into `0` while the traversal path is current.
    Edge(String),
    /// Expand a node's children. The node is already on the path.
    Expand(String),
    /// Children fully traversed; mark visited and pop from the path.
    Leave(String),
}

/// Computes the root set of an adjacency map: nodes not depended-on by any
/// other node, with members of cycles kept as roots so a cycle that nothing
/// external points into is not orphaned from the tree.
///
/// Depth-first traversal from every unvisited node, iterative with an
/// explicit frame stack, carrying the current traversal path as a
/// cycle-detection set. A node is marked not-root the first time it is
/// discovered as a child of another node; a back-edge marks every node on
/// the current path circular. Children absent from `all_dependencies` are
/// dangling references and are not traversed. Each node is expanded exactly
/// once, so this terminates on any finite graph.
pub fn infer_roots(
    all_dependencies: &HashMap<String, DependencyRecord>,
    children_map: &HashMap<String, Vec<String>>,
) -> Vec<String> {
    let mut states: HashMap<&str, NodeState> = all_dependencies
        .keys()
        .map(|id| (id.as_str(), NodeState::default()))
        .collect();

    for start in all_dependencies.keys() {
        if states[start.as_str()].visited {
            continue;
        }

        let mut path: HashSet<String> = HashSet::from([start.clone()]);
        let mut stack = vec![Frame::Expand(start.clone())];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Expand(id) => {
                    stack.push(Frame::Leave(id.clone()));
                    if let Some(children) = children_map.get(&id) {
                        // Reversed so edges pop in declaration order; the
                        // root set is order-insensitive either way.
                        for child in children.iter().rev() {
                            stack.push(Frame::Edge(child.clone()));
                        }
                    }
                }
                Frame::Edge(next) => {
                    if !all_dependencies.contains_key(&next) {
                        // Dangling reference, nothing to traverse.
                        continue;
                    }
                    if path.contains(&next) {
                        // Back-edge: the whole current path is one cycle.
                        for member in &path {
                            if let Some(state) = states.get_mut(member.as_str()) {
                                state.circular = true;
                            }
                        }
                        continue;
                    }
                    if let Some(state) = states.get_mut(next.as_str()) {
                        state.not_root = true;
                        if state.visited {
                            continue;
                        }
                    }
                    path.insert(next.clone());
                    stack.push(Frame::Expand(next));
                }
                Frame::Leave(id) => {
                    if let Some(state) = states.get_mut(id.as_str()) {
                        state.visited = true;
                    }
                    path.remove(&id);
                }
            }
        }
    }

    states
        .into_iter()
        .filter(|(_, state)| !state.not_root || state.circular)
        .map(|(id, _)| id.to_string())
        .collect()
}
