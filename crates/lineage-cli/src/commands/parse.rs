use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use lineage_trace::registry_to_json;
use log::info;

use crate::config::AnalysisConfig;
use crate::output::{load_registry, write_json};

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Fuzzer trace to parse.
    #[arg(long)]
    pub log: PathBuf,
    /// Output directory for registry artefacts.
    #[arg(long)]
    pub out: PathBuf,
    /// Optional YAML analysis configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &ParseArgs) -> Result<(), Box<dyn Error>> {
    let config = AnalysisConfig::load(args.config.as_deref())?;
    let registry = load_registry(&args.log, &config.parser)?;
    std::fs::create_dir_all(&args.out)?;
    std::fs::write(args.out.join("registry.json"), registry_to_json(&registry)?)?;
    write_json(args.out.join("stats.json"), registry.stats())?;
    write_json(args.out.join("work.json"), &registry.work())?;
    info!("wrote registry of {} programs to {}", registry.len(), args.out.display());
    Ok(())
}
