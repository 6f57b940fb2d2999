use std::collections::BTreeMap;

use lineage_core::ProgramId;
use lineage_trace::{Origin, Registry};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::analytics::Bucket;

/// Mutation yield of one corpus seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedStats {
    /// Seed program.
    pub program: ProgramId,
    /// Activity that got the seed admitted.
    pub source: Option<Origin>,
    /// Mutations derived from the seed.
    pub mutations: usize,
    /// Mutations that discovered new coverage.
    pub effective_mutations: usize,
    /// Position of the last effective mutation, 0 when there is none.
    pub last_effective_mutation: usize,
    /// New coverage summed over all mutations of the seed.
    pub power: usize,
}

impl SeedStats {
    /// Share of the mutation sequence after which the seed stopped paying off.
    pub fn lifespan_ratio(&self) -> f64 {
        ratio(self.last_effective_mutation, self.mutations)
    }

    /// Share of mutations that found new coverage.
    pub fn effective_ratio(&self) -> f64 {
        ratio(self.effective_mutations, self.mutations)
    }

    /// Mean new coverage per mutation, `None` for a seed never mutated.
    pub fn power_per_mutation(&self) -> Option<f64> {
        (self.mutations > 0).then(|| self.power as f64 / self.mutations as f64)
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Per-seed statistics for every corpus member, in signature order.
pub fn seed_stats(registry: &Registry) -> Vec<SeedStats> {
    registry
        .corpus()
        .values()
        .filter_map(|id| registry.program(*id))
        .map(|seed| {
            let mut stats = SeedStats {
                program: seed.id,
                source: seed.corpus_source,
                mutations: seed.children.len(),
                effective_mutations: 0,
                last_effective_mutation: 0,
                power: 0,
            };
            for (position, child) in seed.children.iter().enumerate() {
                let found = registry.program(*child).map_or(0, |c| c.coverage.len());
                stats.power += found;
                if found > 0 {
                    stats.effective_mutations += 1;
                    stats.last_effective_mutation = position;
                }
            }
            stats
        })
        .collect()
}

/// Seed statistics aggregated by corpus source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedReport {
    /// Individual seeds.
    pub seeds: Vec<SeedStats>,
    /// Seed count per bucket. Seeds without a known source are left out of
    /// every bucket.
    pub seeds_by_source: BTreeMap<Bucket, usize>,
    /// Summed power per bucket.
    pub power_by_source: BTreeMap<Bucket, usize>,
    /// Summed power divided by seed count, 0 for empty buckets.
    pub avg_power_by_source: BTreeMap<Bucket, f64>,
    /// Power per mutation of every mutated seed, by bucket.
    pub power_per_mutation_by_source: BTreeMap<Bucket, Vec<f64>>,
    /// Lifespan ratio of each seed.
    pub lifespan_ratio: Vec<f64>,
    /// Effective-mutation ratio of each seed.
    pub effective_ratio: Vec<f64>,
}

/// Builds the aggregated seed report of `registry`.
pub fn seed_report(registry: &Registry) -> SeedReport {
    let seeds = seed_stats(registry);
    let mut seeds_by_source: BTreeMap<Bucket, usize> = Bucket::empty_map();
    let mut power_by_source: BTreeMap<Bucket, usize> = Bucket::empty_map();
    let mut power_per_mutation_by_source: BTreeMap<Bucket, Vec<f64>> = Bucket::empty_map();
    for seed in &seeds {
        let Some(source) = seed.source else {
            debug!("seed {} has no corpus source, leaving it out of the buckets", seed.program);
            continue;
        };
        for bucket in Bucket::for_source(source) {
            *seeds_by_source.entry(bucket).or_default() += 1;
            *power_by_source.entry(bucket).or_default() += seed.power;
            if let Some(per_mutation) = seed.power_per_mutation() {
                power_per_mutation_by_source
                    .entry(bucket)
                    .or_default()
                    .push(per_mutation);
            }
        }
    }
    let avg_power_by_source = Bucket::ALL
        .into_iter()
        .map(|bucket| {
            let count = seeds_by_source.get(&bucket).copied().unwrap_or(0);
            let power = power_by_source.get(&bucket).copied().unwrap_or(0);
            (bucket, ratio(power, count))
        })
        .collect();
    SeedReport {
        lifespan_ratio: seeds.iter().map(SeedStats::lifespan_ratio).collect(),
        effective_ratio: seeds.iter().map(SeedStats::effective_ratio).collect(),
        seeds,
        seeds_by_source,
        power_by_source,
        avg_power_by_source,
        power_per_mutation_by_source,
    }
}
