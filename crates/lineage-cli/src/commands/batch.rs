use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use lineage_core::LineageError;
use lineage_forest::{build_forest, forest_report, seed_report, ForestReport};
use lineage_trace::{load_trace, ParseStats, ParserConfig};
use log::{error, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::output::write_json;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Fuzzer traces to analyse.
    #[arg(long, num_args = 1.., required = true)]
    pub logs: Vec<PathBuf>,
    /// Output directory; one subdirectory per trace plus `batch.json`.
    #[arg(long)]
    pub out: PathBuf,
    /// Optional YAML analysis configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Outcome of one trace in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchState {
    Complete,
    Missing,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub log: PathBuf,
    pub state: BatchState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub programs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ParseStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ForestReport>,
}

impl BatchEntry {
    fn empty(log: &Path, state: BatchState) -> Self {
        Self {
            log: log.to_path_buf(),
            state,
            error: None,
            programs: 0,
            stats: None,
            report: None,
        }
    }
}

pub fn run(args: &BatchArgs) -> Result<(), Box<dyn Error>> {
    let config = AnalysisConfig::load(args.config.as_deref())?;
    let entries = analyse_all(&args.logs, &args.out, &config)?;
    let failed = entries
        .iter()
        .filter(|entry| entry.state == BatchState::Failed)
        .count();
    write_json(args.out.join("batch.json"), &entries)?;
    info!("analysed {} traces, {} failed", entries.len(), failed);
    Ok(())
}

/// Analyses every log on its own worker. Failures are recorded per entry
/// and never abort the remaining logs.
pub fn analyse_all(
    logs: &[PathBuf],
    out: &Path,
    config: &AnalysisConfig,
) -> Result<Vec<BatchEntry>, LineageError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.concurrency)
        .build()
        .map_err(|err| LineageError::io("thread-pool", err))?;
    let entries: Vec<BatchEntry> = pool.install(|| {
        logs.par_iter()
            .enumerate()
            .map(|(index, log)| {
                let dir = out.join(format!("{index:03}-{}", stem(log)));
                match analyse_one(log, &dir, &config.parser) {
                    Ok(entry) => entry,
                    Err(err) => {
                        error!("{} failed: {err}", log.display());
                        let mut entry = BatchEntry::empty(log, BatchState::Failed);
                        entry.error = Some(err.to_string());
                        entry
                    }
                }
            })
            .collect()
    });
    Ok(entries)
}

fn stem(log: &Path) -> String {
    log.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "trace".to_string())
}

fn analyse_one(log: &Path, dir: &Path, parser: &ParserConfig) -> Result<BatchEntry, LineageError> {
    let Some(registry) = load_trace(log, parser)? else {
        return Ok(BatchEntry::empty(log, BatchState::Missing));
    };
    let forest = build_forest(&registry);
    let report = forest_report(&forest, &registry);
    write_json(dir.join("report.json"), &report)?;
    write_json(dir.join("seeds.json"), &seed_report(&registry))?;
    Ok(BatchEntry {
        log: log.to_path_buf(),
        state: BatchState::Complete,
        error: None,
        programs: registry.len(),
        stats: Some(registry.stats().clone()),
        report: Some(report),
    })
}
