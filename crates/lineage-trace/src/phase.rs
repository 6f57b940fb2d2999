use serde::{Deserialize, Serialize};

use crate::program::Origin;

/// Parser phase, set by `#` marker lines and consulted when a program
/// block closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// No marker seen yet.
    #[default]
    Idle,
    /// Blocks are freshly generated programs.
    Generate,
    /// The next block is the program being minimized.
    MinimizeFrom,
    /// Blocks are intermediate minimization candidates.
    MinimizeAttempt,
    /// The next block is the final minimized program.
    MinimizeTo,
    /// The next block is the corpus program being mutated.
    MutateFrom,
    /// Blocks are mutants of the last mutation source.
    MutateTo,
}

impl Phase {
    /// Phase in effect after a block closes under `self`.
    pub fn after_close(self) -> Phase {
        match self {
            Phase::MutateFrom => Phase::MutateTo,
            other => other,
        }
    }

    /// Fuzzer activity the phase is accounted to in the work series.
    pub fn activity(self) -> Option<Origin> {
        match self {
            Phase::Idle => None,
            Phase::Generate => Some(Origin::Generate),
            Phase::MinimizeFrom | Phase::MinimizeAttempt | Phase::MinimizeTo => {
                Some(Origin::Minimize)
            }
            Phase::MutateFrom | Phase::MutateTo => Some(Origin::Mutate),
        }
    }
}
