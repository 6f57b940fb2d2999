use std::collections::BTreeSet;
use std::fmt;

use lineage_core::ProgramId;
use serde::{Deserialize, Serialize};

/// Fuzzer activity that produced a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Freshly generated from scratch.
    Generate,
    /// Derived from a corpus program by mutation.
    Mutate,
    /// Produced while minimizing a triaged program.
    Minimize,
}

impl Origin {
    /// Decodes the numeric source code printed on corpus admission lines.
    pub fn from_source_code(code: u8) -> Option<Origin> {
        match code {
            0 => Some(Origin::Generate),
            1 => Some(Origin::Mutate),
            2 => Some(Origin::Minimize),
            _ => None,
        }
    }

    /// Returns the numeric source code of this origin.
    pub fn source_code(&self) -> u8 {
        match self {
            Origin::Generate => 0,
            Origin::Mutate => 1,
            Origin::Minimize => 2,
        }
    }

    /// Returns the stable label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Generate => "Generate",
            Origin::Mutate => "Mutate",
            Origin::Minimize => "Minimize",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed or attempted fuzz input, identified by its signature.
///
/// Relationship fields hold [`ProgramId`]s into the owning registry, never
/// nested records, so the structure stays acyclic when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// First-seen position in the registry.
    pub id: ProgramId,
    /// Content-derived dedup key.
    pub signature: String,
    /// Seconds since the first timestamp of the campaign.
    pub timestamp: f64,
    /// Whether the program was run rather than only referenced.
    pub executed: bool,
    /// Call count reported by the last execution line.
    pub size: usize,
    /// Activity that first produced the program.
    pub origin: Option<Origin>,
    /// Whether the program was admitted to the corpus.
    pub in_corpus: bool,
    /// Activity reported when the program entered the corpus.
    pub corpus_source: Option<Origin>,
    /// Global coverage addresses first discovered by this program.
    pub coverage: BTreeSet<u64>,
    /// Corpus-relative coverage addresses first discovered by this program.
    pub coverage_corpus: BTreeSet<u64>,
    /// Program this one was derived from.
    pub parent: Option<ProgramId>,
    /// Programs derived from this one by mutation.
    pub children: Vec<ProgramId>,
    /// Final minimized replacement of this program.
    pub minimize_target: Option<ProgramId>,
    /// Intermediate minimization candidates tried for this program.
    pub minimize_attempts: Vec<ProgramId>,
}

impl Program {
    /// Creates a fresh, executed program with no relations.
    pub fn new(id: ProgramId, signature: impl Into<String>, timestamp: f64) -> Self {
        Self {
            id,
            signature: signature.into(),
            timestamp,
            executed: true,
            size: 0,
            origin: None,
            in_corpus: false,
            corpus_source: None,
            coverage: BTreeSet::new(),
            coverage_corpus: BTreeSet::new(),
            parent: None,
            children: Vec::new(),
            minimize_target: None,
            minimize_attempts: Vec::new(),
        }
    }

    /// Records the origin unless one is already set. Returns whether it was written.
    pub fn tag_origin(&mut self, origin: Origin) -> bool {
        if self.origin.is_some() {
            return false;
        }
        self.origin = Some(origin);
        true
    }

    /// Marks the program as a corpus member; the first reported source wins.
    pub fn admit(&mut self, source: Option<Origin>) {
        self.in_corpus = true;
        if self.corpus_source.is_none() {
            self.corpus_source = source;
        }
    }
}
