use std::collections::HashSet;

use lineage_core::NodeId;
use log::warn;

use crate::builder::Forest;

enum Step {
    Enter {
        id: NodeId,
        level: usize,
        parent: Option<NodeId>,
    },
    Exit {
        id: NodeId,
        parent: Option<NodeId>,
    },
}

impl Forest {
    /// Assigns `level`, `height` and `size` to the subtree under `root`,
    /// which is placed at `level`. Returns the root's height.
    ///
    /// Children deeper than `max_level` are left out of the traversal and of
    /// the resulting sizes. A node already in `visited` is treated as a
    /// cycle: the edge leading to it is skipped.
    pub fn compute_level(
        &mut self,
        root: NodeId,
        level: usize,
        max_level: Option<usize>,
        visited: &mut HashSet<NodeId>,
    ) -> usize {
        let mut stack = vec![Step::Enter {
            id: root,
            level,
            parent: None,
        }];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter { id, level, parent } => {
                    if !visited.insert(id) {
                        warn!("cycle detected at {id}, skipping edge");
                        continue;
                    }
                    let Some(node) = self.node_mut(id) else {
                        continue;
                    };
                    node.level = Some(level);
                    node.height = Some(level);
                    node.size = 1;
                    stack.push(Step::Exit { id, parent });
                    if max_level.is_some_and(|max| level >= max) {
                        continue;
                    }
                    for child in node.children.iter().rev() {
                        stack.push(Step::Enter {
                            id: *child,
                            level: level + 1,
                            parent: Some(id),
                        });
                    }
                }
                Step::Exit { id, parent } => {
                    let Some(parent) = parent else {
                        continue;
                    };
                    let Some((height, size)) = self.node(id).map(|n| (n.height, n.size)) else {
                        continue;
                    };
                    if let Some(parent) = self.node_mut(parent) {
                        parent.size += size;
                        parent.height = parent.height.max(height);
                    }
                }
            }
        }
        self.node(root).and_then(|node| node.height).unwrap_or(level)
    }

    /// Appends the out-degree of every branching node under `root` to
    /// `degrees` and returns the number of leaves reached.
    pub fn collect_degrees(
        &self,
        root: NodeId,
        degrees: &mut Vec<usize>,
        visited: &mut HashSet<NodeId>,
    ) -> usize {
        let mut leaves = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                warn!("cycle detected at {id}, skipping edge");
                continue;
            }
            let Some(node) = self.node(id) else {
                continue;
            };
            let fresh: Vec<NodeId> = node
                .children
                .iter()
                .copied()
                .filter(|child| !visited.contains(child))
                .collect();
            if fresh.is_empty() {
                leaves += 1;
            } else {
                degrees.push(fresh.len());
                stack.extend(fresh.into_iter().rev());
            }
        }
        leaves
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use lineage_trace::{parse_str, ParserConfig};

    use crate::builder::build_forest;

    const CHAIN: &str = "# Generate\n>>>A\n<<<\n# addInputToCorpus Source: 0\n\
        # Mutate\n>>>A\n<<<\n>>>B\n<<<\n# addInputToCorpus Source: 1\n\
        # Mutate\n>>>B\n<<<\n>>>C\n<<<\n";

    #[test]
    fn max_level_truncates_sizes() {
        let registry = parse_str(CHAIN, &ParserConfig::default());
        let mut forest = build_forest(&registry);
        let root = forest.roots()[0];
        assert_eq!(forest.node(root).unwrap().size, 3);
        let height = forest.compute_level(root, 0, Some(1), &mut HashSet::new());
        assert_eq!(height, 1);
        assert_eq!(forest.node(root).unwrap().size, 2);
    }

    #[test]
    fn degrees_skip_leaves() {
        let registry = parse_str(CHAIN, &ParserConfig::default());
        let forest = build_forest(&registry);
        let mut degrees = Vec::new();
        let leaves = forest.collect_degrees(forest.roots()[0], &mut degrees, &mut HashSet::new());
        assert_eq!(leaves, 1);
        assert_eq!(degrees, vec![1, 1]);
    }
}
