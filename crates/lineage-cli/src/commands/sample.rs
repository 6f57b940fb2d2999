use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use lineage_forest::{build_forest, sample_forest};

use crate::config::AnalysisConfig;
use crate::output::{load_registry, write_json};

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Fuzzer trace to sample.
    #[arg(long)]
    pub log: PathBuf,
    /// Output directory for the rendered sample.
    #[arg(long)]
    pub out: PathBuf,
    /// Optional YAML analysis configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Overrides the configured node budget.
    #[arg(long)]
    pub max_nodes: Option<usize>,
    /// Overrides the configured sampling seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: &SampleArgs) -> Result<(), Box<dyn Error>> {
    let mut config = AnalysisConfig::load(args.config.as_deref())?;
    if let Some(max_nodes) = args.max_nodes {
        config.sampler.max_nodes = max_nodes;
    }
    if let Some(seed) = args.seed {
        config.sampler.seed = seed;
    }
    let registry = load_registry(&args.log, &config.parser)?;
    let forest = build_forest(&registry);
    let graph = sample_forest(&forest, &registry, &config.sampler)?;
    write_json(args.out.join("render.json"), &graph)?;
    Ok(())
}
