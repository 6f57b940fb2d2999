use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use lineage_core::{LineageError, NodeId, ProgramId, RngHandle};
use lineage_trace::{Origin, Registry};
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::builder::Forest;
use crate::config::SamplerConfig;

const SAMPLE_STREAM: u64 = 1;
const PRUNE_STREAM: u64 = 2;

#[derive(Debug, Clone)]
struct Member {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    size: usize,
}

/// Subset of a forest closed under "parent of a member is a member", with
/// its own child lists and sizes.
#[derive(Debug, Clone, Default)]
pub struct SubForest {
    members: IndexMap<NodeId, Member>,
}

impl SubForest {
    /// Number of member nodes.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns whether nothing was sampled.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns whether `id` is a member.
    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains_key(&id)
    }

    /// Members without a parent, in id order.
    pub fn roots(&self) -> Vec<NodeId> {
        let mut roots: Vec<NodeId> = self
            .members
            .iter()
            .filter(|(_, member)| member.parent.is_none())
            .map(|(id, _)| *id)
            .collect();
        roots.sort();
        roots
    }

    /// Parent of a member within the subset.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.members.get(&id).and_then(|member| member.parent)
    }

    /// Children of a member within the subset.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.members
            .get(&id)
            .map(|member| member.children.as_slice())
            .unwrap_or(&[])
    }

    /// Subtree size of a member within the subset.
    pub fn size_of(&self, id: NodeId) -> Option<usize> {
        self.members.get(&id).map(|member| member.size)
    }

    /// Adds `start` and its ancestors up to the first one already sampled.
    fn insert_path(&mut self, forest: &Forest, start: NodeId) {
        let mut path = Vec::new();
        let mut on_path = HashSet::new();
        let mut anchor = None;
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            if self.members.contains_key(&id) {
                anchor = Some(id);
                break;
            }
            if !on_path.insert(id) {
                warn!("cycle through {id} while sampling, cutting the path");
                break;
            }
            path.push(id);
            cursor = forest.node(id).and_then(|node| node.parent);
        }
        for (position, id) in path.iter().enumerate() {
            let parent = path.get(position + 1).copied().or(anchor);
            self.members.insert(
                *id,
                Member {
                    parent,
                    children: Vec::new(),
                    size: 1,
                },
            );
        }
        for id in &path {
            let parent = self.parent(*id);
            if let Some(parent) = parent.and_then(|parent| self.members.get_mut(&parent)) {
                parent.children.push(*id);
            }
        }
    }

    /// Removes `id` and its whole offspring. Returns how many members went.
    fn detach(&mut self, id: NodeId) -> usize {
        if let Some(parent) = self.parent(id).and_then(|parent| self.members.get_mut(&parent)) {
            parent.children.retain(|child| *child != id);
        }
        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(member) = self.members.swap_remove(&next) {
                removed += 1;
                stack.extend(member.children);
            }
        }
        removed
    }

    fn recompute_sizes(&mut self) {
        let mut order = Vec::with_capacity(self.members.len());
        let mut stack = self.roots();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend_from_slice(self.children(id));
        }
        for id in &order {
            if let Some(member) = self.members.get_mut(id) {
                member.size = 1;
            }
        }
        for id in order.iter().rev() {
            let Some((parent, size)) = self.members.get(id).map(|m| (m.parent, m.size)) else {
                continue;
            };
            if let Some(parent) = parent.and_then(|parent| self.members.get_mut(&parent)) {
                parent.size += size;
            }
        }
    }
}

/// Draws a random subset of the non-isolated nodes of `forest`, each kept
/// together with its path to the root.
pub fn sample(forest: &Forest, config: &SamplerConfig, rng: &mut RngHandle) -> SubForest {
    let rate = config.effective_sample_rate(forest.len());
    let mut subset = SubForest::default();
    for node in forest.nodes() {
        if node.is_isolated() {
            continue;
        }
        if rng.gen::<f64>() < rate {
            subset.insert_path(forest, node.id);
        }
    }
    subset.recompute_sizes();
    debug!("sampled {} of {} nodes at rate {rate:.4}", subset.len(), forest.len());
    subset
}

/// Detaches uniformly chosen subtrees until at most `max_nodes` remain.
///
/// The choice ignores subtree size so that deep and shallow lineages are
/// equally likely to survive.
pub fn prune(subset: &mut SubForest, max_nodes: usize, rng: &mut RngHandle) {
    while subset.len() > max_nodes {
        let pick = rng.gen_range(0..subset.len());
        let Some(id) = subset.members.get_index(pick).map(|(id, _)| *id) else {
            break;
        };
        let removed = subset.detach(id);
        debug!("pruned {removed} nodes under {id}");
    }
    subset.recompute_sizes();
}

/// Thins `children` to `ceil(len * rate)` entries spread evenly over the
/// list sorted by subtree size, largest first.
pub fn sort_sample(children: &[NodeId], size_of: impl Fn(NodeId) -> usize, rate: f64) -> Vec<NodeId> {
    let mut sorted = children.to_vec();
    sorted.sort_by(|a, b| size_of(*b).cmp(&size_of(*a)).then(a.cmp(b)));
    let keep = ((sorted.len() as f64) * rate.clamp(0.0, 1.0)).ceil() as usize;
    let keep = keep.min(sorted.len());
    (0..keep)
        .map(|slot| sorted[slot * sorted.len() / keep])
        .collect()
}

/// How a rendered node is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderStyle {
    /// Corpus member.
    Corpus,
    /// Generated program outside the corpus.
    Generated,
    /// Any other program.
    Derived,
}

/// Relation a rendered edge stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Mutation of a corpus program.
    Mutation,
    /// Final minimized replacement.
    MinimizeTarget,
    /// Intermediate minimization candidate.
    MinimizeAttempt,
}

/// Node of a rendered graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderNode {
    /// Sequential render id in breadth-first order.
    pub id: usize,
    /// Forest node.
    pub node: NodeId,
    /// Program behind the node.
    pub program: ProgramId,
    /// Depth below the rendered root.
    pub level: usize,
    /// Subtree size within the sample.
    pub size: usize,
    /// Drawing style.
    pub style: RenderStyle,
}

/// Edge of a rendered graph, between render ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderEdge {
    /// Render id of the parent.
    pub from: usize,
    /// Render id of the child.
    pub to: usize,
    /// Relation between the two programs.
    pub kind: EdgeKind,
}

/// Laid-out sample ready for an external graph renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderGraph {
    /// Nodes in render-id order.
    pub nodes: Vec<RenderNode>,
    /// Parent-to-child edges.
    pub edges: Vec<RenderEdge>,
}

impl RenderGraph {
    fn push_node(
        &mut self,
        forest: &Forest,
        registry: &Registry,
        subset: &SubForest,
        node: NodeId,
        level: usize,
    ) -> Option<usize> {
        let program = forest.node(node)?.program;
        let id = self.nodes.len();
        self.nodes.push(RenderNode {
            id,
            node,
            program,
            level,
            size: subset.size_of(node).unwrap_or(1),
            style: style_of(registry, program),
        });
        Some(id)
    }
}

fn style_of(registry: &Registry, program: ProgramId) -> RenderStyle {
    match registry.program(program) {
        Some(p) if p.in_corpus => RenderStyle::Corpus,
        Some(p) if p.origin == Some(Origin::Generate) => RenderStyle::Generated,
        _ => RenderStyle::Derived,
    }
}

fn edge_kind(registry: &Registry, parent: ProgramId, child: ProgramId) -> EdgeKind {
    match registry.program(parent) {
        Some(p) if p.minimize_target == Some(child) => EdgeKind::MinimizeTarget,
        Some(p) if p.minimize_attempts.contains(&child) => EdgeKind::MinimizeAttempt,
        _ => EdgeKind::Mutation,
    }
}

/// Lays out `subset` breadth-first from its roots, applying the fan-out
/// and depth limits of `config`.
pub fn render(
    subset: &SubForest,
    forest: &Forest,
    registry: &Registry,
    config: &SamplerConfig,
) -> RenderGraph {
    let mut graph = RenderGraph::default();
    let mut queue = VecDeque::new();
    for root in subset.roots() {
        if let Some(id) = graph.push_node(forest, registry, subset, root, 0) {
            queue.push_back((root, id, 0));
        }
    }
    while let Some((node, render_id, level)) = queue.pop_front() {
        if config.max_level.is_some_and(|max| level >= max) {
            continue;
        }
        let children = subset.children(node);
        let kept = match config.prune_rate {
            Some(rate) => sort_sample(children, |child| subset.size_of(child).unwrap_or(1), rate),
            None => children.to_vec(),
        };
        let Some(parent_program) = forest.node(node).map(|n| n.program) else {
            continue;
        };
        for child in kept {
            let Some(child_id) = graph.push_node(forest, registry, subset, child, level + 1) else {
                continue;
            };
            let child_program = graph.nodes[child_id].program;
            graph.edges.push(RenderEdge {
                from: render_id,
                to: child_id,
                kind: edge_kind(registry, parent_program, child_program),
            });
            queue.push_back((child, child_id, level + 1));
        }
    }
    graph
}

/// Samples, prunes and renders `forest` within `config.max_nodes` nodes.
///
/// The result is reproducible for a fixed `config.seed`.
pub fn sample_forest(
    forest: &Forest,
    registry: &Registry,
    config: &SamplerConfig,
) -> Result<RenderGraph, LineageError> {
    config.validate()?;
    let mut sampling = RngHandle::substream(config.seed, SAMPLE_STREAM);
    let mut pruning = RngHandle::substream(config.seed, PRUNE_STREAM);
    let mut subset = sample(forest, config, &mut sampling);
    prune(&mut subset, config.max_nodes, &mut pruning);
    let graph = render(&subset, forest, registry, config);
    info!(
        "rendered {} nodes and {} edges from a forest of {}",
        graph.nodes.len(),
        graph.edges.len(),
        forest.len()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId::from_raw).collect()
    }

    #[test]
    fn sort_sample_spreads_over_sizes() {
        let children = ids(&[0, 1, 2, 3, 4]);
        let size = |id: NodeId| [1, 5, 3, 4, 2][id.index()];
        assert_eq!(sort_sample(&children, size, 0.5), ids(&[1, 3, 4]));
        assert_eq!(sort_sample(&children, size, 1.0), ids(&[1, 3, 2, 4, 0]));
        assert!(sort_sample(&children, size, 0.0).is_empty());
    }
}
