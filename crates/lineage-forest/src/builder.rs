use std::collections::{HashMap, HashSet};

use lineage_core::{NodeId, ProgramId};
use lineage_trace::Registry;
use log::{debug, info, warn};

use crate::node::Node;

/// Lineage forest derived from a [`Registry`].
///
/// Every program that is an ancestor of some executed program owns exactly
/// one node. `roots` lists the parentless nodes that have at least one
/// child; isolated nodes stay reachable through [`Forest::nodes`].
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: Vec<Node>,
    by_program: HashMap<ProgramId, NodeId>,
    roots: Vec<NodeId>,
}

impl Forest {
    /// Builds the forest and runs the metric pass on it.
    pub fn build(registry: &Registry) -> Self {
        let mut forest = Self::default();
        for id in registry.generated() {
            forest.ensure(*id);
        }
        for program in registry.programs() {
            if program.executed && !forest.by_program.contains_key(&program.id) {
                forest.link_ancestry(registry, program.id);
            }
        }
        let tops: Vec<NodeId> = forest
            .nodes
            .iter()
            .filter(|node| node.parent.is_none())
            .map(|node| node.id)
            .collect();
        let mut visited = HashSet::new();
        for top in &tops {
            forest.compute_level(*top, 0, None, &mut visited);
        }
        forest.roots = tops
            .into_iter()
            .filter(|id| !forest.nodes[id.index()].children.is_empty())
            .collect();
        info!(
            "built forest: {} roots over {} nodes",
            forest.roots.len(),
            forest.nodes.len()
        );
        forest
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the forest holds no node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Node standing for `program`, if the program is part of the lineage.
    pub fn node_of(&self, program: ProgramId) -> Option<NodeId> {
        self.by_program.get(&program).copied()
    }

    /// Roots that carry lineage, generated programs first.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    fn ensure(&mut self, program: ProgramId) -> NodeId {
        if let Some(id) = self.by_program.get(&program) {
            return *id;
        }
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::new(id, program));
        self.by_program.insert(program, id);
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Walks the parent chain of `program` until it meets a program that
    /// already has a node, creating nodes along the way.
    fn link_ancestry(&mut self, registry: &Registry, program: ProgramId) {
        let mut current = self.ensure(program);
        let mut chain = HashSet::from([program]);
        let mut cursor = program;
        while let Some(parent) = registry.program(cursor).and_then(|p| p.parent) {
            if chain.contains(&parent) {
                warn!("cycle through {parent} in recorded lineage, cutting the chain at {cursor}");
                break;
            }
            if let Some(existing) = self.by_program.get(&parent).copied() {
                self.attach(existing, current);
                break;
            }
            let created = self.ensure(parent);
            self.attach(created, current);
            debug!("created ancestor node {created} for {parent}");
            chain.insert(parent);
            current = created;
            cursor = parent;
        }
    }
}

/// Builds the lineage forest of `registry`.
pub fn build_forest(registry: &Registry) -> Forest {
    Forest::build(registry)
}
