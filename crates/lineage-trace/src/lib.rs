#![deny(missing_docs)]
#![doc = "Trace-to-lineage parser: reads an interleaved fuzzer log and records which program generated, mutated or minimized which."]

mod config;
mod hash;
mod line;
mod parser;
mod phase;
mod program;
mod registry;
mod serialization;
mod stats;
mod work;

pub use config::ParserConfig;
pub use hash::canonical_hash;
pub use line::{classify, Comment, CoverageScope, TraceLine};
pub use parser::{load_trace, parse_lines, parse_reader, parse_str, TraceParser};
pub use phase::Phase;
pub use program::{Origin, Program};
pub use registry::Registry;
pub use serialization::{
    registry_from_bytes, registry_from_json, registry_to_bytes, registry_to_json, CachedTrace,
    REGISTRY_SCHEMA,
};
pub use stats::ParseStats;
pub use work::{WorkCounters, WorkSample};
