use std::collections::{BTreeMap, HashSet};

use lineage_trace::{Origin, Registry};
use serde::{Deserialize, Serialize};

use crate::builder::Forest;

/// Attribution bucket: one per corpus source plus an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Bucket {
    /// Admitted from generation.
    Generate,
    /// Admitted from mutation.
    Mutate,
    /// Admitted from minimization.
    Minimize,
    /// Every admitted program.
    All,
}

impl Bucket {
    /// Every bucket in reporting order.
    pub const ALL: [Bucket; 4] = [Bucket::Generate, Bucket::Mutate, Bucket::Minimize, Bucket::All];

    /// Buckets a value is credited to for the given corpus source.
    pub fn for_source(source: Origin) -> [Bucket; 2] {
        [Bucket::from(source), Bucket::All]
    }

    pub(crate) fn empty_map<T: Default>() -> BTreeMap<Bucket, T> {
        Bucket::ALL.into_iter().map(|bucket| (bucket, T::default())).collect()
    }
}

impl From<Origin> for Bucket {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Generate => Bucket::Generate,
            Origin::Mutate => Bucket::Mutate,
            Origin::Minimize => Bucket::Minimize,
        }
    }
}

/// Structural summary of one forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestReport {
    /// Roots carrying lineage.
    pub num_trees: usize,
    /// Nodes in the forest, isolated ones included.
    pub num_nodes: usize,
    /// Height of every branched root.
    pub tree_heights: Vec<usize>,
    /// Size of every branched root.
    pub tree_sizes: Vec<usize>,
    /// Out-degree of every branching node.
    pub node_degrees: Vec<usize>,
    /// Leaves reached from the roots.
    pub leaf_nodes: usize,
    /// `leaf_nodes` as a percentage of `num_nodes`.
    pub leaf_percentage: f64,
    /// Leaves under each root.
    pub leaves_per_tree: Vec<usize>,
    /// Leaves under each root divided by its size.
    pub leaf_ratio_per_tree: Vec<f64>,
    /// Subtree heights of corpus members, by corpus source.
    pub subtree_height: BTreeMap<Bucket, Vec<usize>>,
    /// Subtree sizes of corpus members, by corpus source.
    pub subtree_size: BTreeMap<Bucket, Vec<usize>>,
}

/// Computes the structural report of `forest`.
pub fn forest_report(forest: &Forest, registry: &Registry) -> ForestReport {
    let mut report = ForestReport {
        num_trees: forest.roots().len(),
        num_nodes: forest.len(),
        tree_heights: Vec::new(),
        tree_sizes: Vec::new(),
        node_degrees: Vec::new(),
        leaf_nodes: 0,
        leaf_percentage: 0.0,
        leaves_per_tree: Vec::new(),
        leaf_ratio_per_tree: Vec::new(),
        subtree_height: Bucket::empty_map(),
        subtree_size: Bucket::empty_map(),
    };

    for root in forest.roots() {
        let Some(node) = forest.node(*root) else {
            continue;
        };
        let height = node.height.unwrap_or(0);
        if height > 0 && node.size > 1 {
            report.tree_heights.push(height);
            report.tree_sizes.push(node.size);
        }
        let leaves = forest.collect_degrees(*root, &mut report.node_degrees, &mut HashSet::new());
        report.leaf_nodes += leaves;
        report.leaves_per_tree.push(leaves);
        report.leaf_ratio_per_tree.push(leaves as f64 / node.size as f64);
    }
    if report.num_nodes > 0 {
        report.leaf_percentage = 100.0 * report.leaf_nodes as f64 / report.num_nodes as f64;
    }

    for id in registry.corpus().values() {
        let Some(node) = forest.node_of(*id).and_then(|node| forest.node(node)) else {
            continue;
        };
        let Some(source) = registry.program(*id).and_then(|program| program.corpus_source) else {
            continue;
        };
        for bucket in Bucket::for_source(source) {
            if let Some(heights) = report.subtree_height.get_mut(&bucket) {
                heights.push(node.height.unwrap_or(0));
            }
            if let Some(sizes) = report.subtree_size.get_mut(&bucket) {
                sizes.push(node.size);
            }
        }
    }
    report
}
