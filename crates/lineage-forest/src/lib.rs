#![deny(missing_docs)]
#![doc = "Lineage forest over a parsed trace: construction, structural metrics, seed analytics and size-bounded sampling for rendering."]

mod analytics;
mod builder;
mod config;
mod metrics;
mod node;
mod sampler;
mod seeds;
mod summary;

pub use analytics::{forest_report, Bucket, ForestReport};
pub use builder::{build_forest, Forest};
pub use config::SamplerConfig;
pub use node::Node;
pub use sampler::{
    prune, render, sample, sample_forest, sort_sample, EdgeKind, RenderEdge, RenderGraph,
    RenderNode, RenderStyle, SubForest,
};
pub use seeds::{seed_report, seed_stats, SeedReport, SeedStats};
pub use summary::{ForestSummary, NodeSummary};
