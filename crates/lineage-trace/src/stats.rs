use serde::{Deserialize, Serialize};

/// Volume and anomaly counters collected during one parsing pass.
///
/// Every recovered malformation lands here instead of aborting the parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Non-empty lines consumed.
    pub lines: u64,
    /// Program blocks closed.
    pub blocks: u64,
    /// Execution lines seen.
    pub executions: u64,
    /// Lines skipped because a field could not be parsed.
    pub malformed_lines: u64,
    /// Coverage addresses dropped by the address filter.
    pub filtered_addresses: u64,
    /// Mutations whose source was not a corpus member.
    pub orphan_mutations: u64,
    /// Minimization blocks seen before any minimization source.
    pub orphan_minimize_steps: u64,
    /// Corpus admissions with no program to attribute them to.
    pub orphan_admissions: u64,
    /// Edges from a program to itself, which are not recorded.
    pub self_links: u64,
    /// Edges rejected because the child already had a different parent.
    pub reparent_attempts: u64,
    /// Blocks opened but never closed.
    pub unterminated_blocks: u64,
    /// Triage result lines.
    pub triage_total: u64,
    /// Triage result lines reporting that the program was not kept.
    pub triage_failed: u64,
}

impl ParseStats {
    /// Sum of every anomaly counter.
    pub fn anomalies(&self) -> u64 {
        self.malformed_lines
            + self.orphan_mutations
            + self.orphan_minimize_steps
            + self.orphan_admissions
            + self.unterminated_blocks
    }
}
