use serde::{Deserialize, Serialize};

use crate::program::Origin;

/// Cumulative execution and coverage counters split by fuzzer activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCounters {
    /// Execution lines seen so far.
    pub executions: u64,
    /// Executions while generating.
    pub generate_executions: u64,
    /// Executions while mutating.
    pub mutate_executions: u64,
    /// Executions while minimizing.
    pub minimize_executions: u64,
    /// New global coverage found while generating.
    pub generate_coverage: u64,
    /// New global coverage found while mutating.
    pub mutate_coverage: u64,
    /// New global coverage found while minimizing.
    pub minimize_coverage: u64,
}

impl WorkCounters {
    pub(crate) fn record_execution(&mut self, activity: Option<Origin>) {
        self.executions += 1;
        match activity {
            Some(Origin::Generate) => self.generate_executions += 1,
            Some(Origin::Mutate) => self.mutate_executions += 1,
            Some(Origin::Minimize) => self.minimize_executions += 1,
            None => {}
        }
    }

    pub(crate) fn record_coverage(&mut self, activity: Option<Origin>) {
        match activity {
            Some(Origin::Generate) => self.generate_coverage += 1,
            Some(Origin::Mutate) => self.mutate_coverage += 1,
            Some(Origin::Minimize) => self.minimize_coverage += 1,
            None => {}
        }
    }

    /// Executions attributed to `activity`.
    pub fn executions_of(&self, activity: Origin) -> u64 {
        match activity {
            Origin::Generate => self.generate_executions,
            Origin::Mutate => self.mutate_executions,
            Origin::Minimize => self.minimize_executions,
        }
    }

    /// New coverage attributed to `activity`.
    pub fn coverage_of(&self, activity: Origin) -> u64 {
        match activity {
            Origin::Generate => self.generate_coverage,
            Origin::Mutate => self.mutate_coverage,
            Origin::Minimize => self.minimize_coverage,
        }
    }

    /// Average new coverage per execution of `activity`.
    pub fn coverage_per_execution(&self, activity: Origin) -> f64 {
        let executions = self.executions_of(activity);
        if executions == 0 {
            0.0
        } else {
            self.coverage_of(activity) as f64 / executions as f64
        }
    }
}

/// Snapshot of the work counters at one point of the campaign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkSample {
    /// Seconds since the first timestamp.
    pub elapsed: f64,
    /// Counter values at that time.
    pub counters: WorkCounters,
}
