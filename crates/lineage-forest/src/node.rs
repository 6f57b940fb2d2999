use lineage_core::{NodeId, ProgramId};
use serde::{Deserialize, Serialize};

/// Forest-side view of one program.
///
/// `level` and `height` stay `None` until the metric pass reaches the node.
/// `height` is the deepest absolute level found under the node, not a
/// distance relative to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Arena identifier.
    pub id: NodeId,
    /// Program this node stands for.
    pub program: ProgramId,
    /// Depth below the root.
    pub level: Option<usize>,
    /// Deepest level reached in the subtree.
    pub height: Option<usize>,
    /// Number of nodes in the subtree, this one included.
    pub size: usize,
    /// Derived nodes.
    pub children: Vec<NodeId>,
    /// Node this one was derived from.
    pub parent: Option<NodeId>,
}

impl Node {
    pub(crate) fn new(id: NodeId, program: ProgramId) -> Self {
        Self {
            id,
            program,
            level: None,
            height: None,
            size: 1,
            children: Vec::new(),
            parent: None,
        }
    }

    /// Returns whether the node is neither derived nor a source of anything.
    pub fn is_isolated(&self) -> bool {
        self.parent.is_none() && self.children.is_empty()
    }
}
