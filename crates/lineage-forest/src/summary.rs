use std::collections::{BTreeMap, HashSet};

use lineage_core::{ErrorInfo, LineageError, ProgramId};
use lineage_trace::Registry;
use serde::{Deserialize, Serialize};

use crate::builder::Forest;

/// Exported metrics of one forest node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    /// Program the node stands for.
    pub program: ProgramId,
    /// Depth below its root.
    pub level: Option<usize>,
    /// Deepest level in its subtree.
    pub height: Option<usize>,
    /// Subtree node count.
    pub size: usize,
    /// Out-degree.
    pub degree: usize,
}

/// Flat, acyclic export of a forest: root programs plus per-signature node
/// metrics. Child lists are left out, they follow from the registry's
/// parent links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestSummary {
    /// Programs at the roots that carry lineage.
    pub roots: Vec<ProgramId>,
    /// Node metrics keyed by program signature.
    pub nodes: BTreeMap<String, NodeSummary>,
}

impl ForestSummary {
    /// Summarizes `forest`, resolving signatures through `registry`.
    pub fn new(forest: &Forest, registry: &Registry) -> Self {
        let roots = forest
            .roots()
            .iter()
            .filter_map(|id| forest.node(*id))
            .map(|node| node.program)
            .collect();
        let nodes = forest
            .nodes()
            .iter()
            .filter_map(|node| {
                let program = registry.program(node.program)?;
                let summary = NodeSummary {
                    program: node.program,
                    level: node.level,
                    height: node.height,
                    size: node.size,
                    degree: node.children.len(),
                };
                Some((program.signature.clone(), summary))
            })
            .collect();
        Self { roots, nodes }
    }

    /// Serializes the summary to a JSON string.
    pub fn to_json(&self) -> Result<String, LineageError> {
        serde_json::to_string_pretty(self).map_err(|err| LineageError::serde("serialize-summary", err))
    }

    /// Restores a summary from a JSON string.
    ///
    /// Fails with [`LineageError::Forest`] when a root has no node entry.
    pub fn from_json(json: &str) -> Result<Self, LineageError> {
        let summary: Self = serde_json::from_str(json)
            .map_err(|err| LineageError::serde("deserialize-summary", err))?;
        summary.validate()?;
        Ok(summary)
    }

    fn validate(&self) -> Result<(), LineageError> {
        let programs: HashSet<ProgramId> = self.nodes.values().map(|node| node.program).collect();
        match self.roots.iter().find(|root| !programs.contains(root)) {
            Some(root) => Err(LineageError::Forest(
                ErrorInfo::new("dangling-root", "summary root has no node entry")
                    .with_context("root", root),
            )),
            None => Ok(()),
        }
    }
}
