use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use lineage_forest::{build_forest, forest_report, seed_report, ForestSummary};
use log::info;

use crate::config::AnalysisConfig;
use crate::output::{load_registry, write_json};

#[derive(Args, Debug)]
pub struct ForestArgs {
    /// Fuzzer trace to analyse.
    #[arg(long)]
    pub log: PathBuf,
    /// Output directory for forest artefacts.
    #[arg(long)]
    pub out: PathBuf,
    /// Optional YAML analysis configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &ForestArgs) -> Result<(), Box<dyn Error>> {
    let config = AnalysisConfig::load(args.config.as_deref())?;
    let registry = load_registry(&args.log, &config.parser)?;
    let forest = build_forest(&registry);
    std::fs::create_dir_all(&args.out)?;
    std::fs::write(
        args.out.join("forest.json"),
        ForestSummary::new(&forest, &registry).to_json()?,
    )?;
    let report = forest_report(&forest, &registry);
    write_json(args.out.join("report.json"), &report)?;
    write_json(args.out.join("seeds.json"), &seed_report(&registry))?;
    info!(
        "forest of {} trees over {} nodes written to {}",
        report.num_trees,
        report.num_nodes,
        args.out.display()
    );
    Ok(())
}
