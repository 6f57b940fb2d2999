use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use lineage_core::errors::{ErrorInfo, LineageError};
use lineage_core::provenance::{SchemaVersion, TraceProvenance};
use lineage_core::ProgramId;
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::config::ParserConfig;
use crate::parser::parse_reader;
use crate::program::Program;
use crate::registry::Registry;
use crate::stats::ParseStats;
use crate::work::WorkSample;

/// Schema version written alongside serialized registries.
pub const REGISTRY_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Serializes the registry to a compact binary representation using `bincode`.
pub fn registry_to_bytes(registry: &Registry) -> Result<Vec<u8>, LineageError> {
    bincode::serialize(registry).map_err(|err| LineageError::serde("serialize-bytes", err))
}

/// Restores a registry from its binary representation.
pub fn registry_from_bytes(bytes: &[u8]) -> Result<Registry, LineageError> {
    bincode::deserialize(bytes).map_err(|err| LineageError::serde("deserialize-bytes", err))
}

/// Serializes the registry to a JSON string.
pub fn registry_to_json(registry: &Registry) -> Result<String, LineageError> {
    serde_json::to_string_pretty(registry).map_err(|err| LineageError::serde("serialize-json", err))
}

/// Restores a registry from a JSON string.
pub fn registry_from_json(json: &str) -> Result<Registry, LineageError> {
    serde_json::from_str(json).map_err(|err| LineageError::serde("deserialize-json", err))
}

#[derive(Serialize)]
struct RegistryView<'a> {
    schema_version: SchemaVersion,
    programs: &'a [Program],
    generated: &'a [ProgramId],
    corpus: &'a BTreeMap<String, ProgramId>,
    triage: &'a BTreeMap<String, ProgramId>,
    stats: &'a ParseStats,
    work: &'a [WorkSample],
}

#[derive(Deserialize)]
struct SerializableRegistry {
    schema_version: SchemaVersion,
    programs: Vec<Program>,
    generated: Vec<ProgramId>,
    corpus: BTreeMap<String, ProgramId>,
    triage: BTreeMap<String, ProgramId>,
    stats: ParseStats,
    work: Vec<WorkSample>,
}

impl Serialize for Registry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RegistryView {
            schema_version: REGISTRY_SCHEMA,
            programs: self.programs(),
            generated: self.generated(),
            corpus: self.corpus(),
            triage: self.triage(),
            stats: self.stats(),
            work: self.work(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Registry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = SerializableRegistry::deserialize(deserializer)?;
        raw.into_registry().map_err(serde::de::Error::custom)
    }
}

impl SerializableRegistry {
    fn into_registry(self) -> Result<Registry, LineageError> {
        let raw = self;
        if !REGISTRY_SCHEMA.is_compatible(&raw.schema_version) {
            return Err(schema_error("schema-mismatch", "unsupported registry schema")
                .with_context(
                    "found",
                    format!(
                        "{}.{}.{}",
                        raw.schema_version.major, raw.schema_version.minor, raw.schema_version.patch
                    ),
                ));
        }
        let count = raw.programs.len();
        let in_range = |id: &ProgramId| id.index() < count;
        let mut signatures = BTreeMap::new();
        for (index, program) in raw.programs.iter().enumerate() {
            if program.id.index() != index {
                return Err(schema_error("misplaced-program", "program id does not match its position")
                    .with_context("id", program.id)
                    .with_context("position", index));
            }
            if signatures.insert(program.signature.as_str(), program.id).is_some() {
                return Err(schema_error("duplicate-signature", "signature recorded twice")
                    .with_context("id", program.id));
            }
            let references_ok = program.parent.iter().all(in_range)
                && program.minimize_target.iter().all(in_range)
                && program.children.iter().all(in_range)
                && program.minimize_attempts.iter().all(in_range);
            if !references_ok {
                return Err(schema_error("dangling-reference", "program references an unknown id")
                    .with_context("id", program.id));
            }
        }
        if !raw.generated.iter().all(in_range) {
            return Err(schema_error("dangling-reference", "generated index references an unknown id"));
        }
        for (name, index) in [("corpus", &raw.corpus), ("triage", &raw.triage)] {
            for (signature, id) in index {
                if signatures.get(signature.as_str()) != Some(id) {
                    return Err(schema_error("index-mismatch", "index entry disagrees with programs")
                        .with_context("index", name)
                        .with_context("id", id));
                }
            }
        }
        Ok(Registry::from_parts(
            raw.programs,
            raw.generated,
            raw.corpus,
            raw.triage,
            raw.stats,
            raw.work,
        ))
    }
}

fn schema_error(code: &str, message: &str) -> LineageError {
    LineageError::Serde(ErrorInfo::new(code, message))
}

/// Registry bundled with the provenance of the log it was parsed from, for
/// whole-structure caching by an external collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedTrace {
    /// Provenance of the source log.
    pub provenance: TraceProvenance,
    /// Parsed registry.
    pub registry: Registry,
}

impl CachedTrace {
    /// Reads and parses the log at `path`, recording its digest.
    ///
    /// Returns `Ok(None)` when the log does not exist.
    pub fn from_log(path: &Path, config: &ParserConfig) -> Result<Option<Self>, LineageError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(LineageError::io("read-trace", err).with_context("path", path.display()))
            }
        };
        let registry = parse_reader(bytes.as_slice(), config)?;
        let provenance = TraceProvenance {
            source: path.display().to_string(),
            input_hash: digest(&bytes),
            line_count: registry.stats().lines,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        Ok(Some(Self {
            provenance,
            registry,
        }))
    }

    /// Returns whether the cached registry was parsed from exactly `bytes`.
    pub fn is_fresh(&self, bytes: &[u8]) -> bool {
        self.provenance.input_hash == digest(bytes)
    }

    /// Serializes the envelope with `bincode`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LineageError> {
        bincode::serialize(self).map_err(|err| LineageError::serde("serialize-cache", err))
    }

    /// Restores an envelope written by [`CachedTrace::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LineageError> {
        bincode::deserialize(bytes).map_err(|err| LineageError::serde("deserialize-cache", err))
    }
}

fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
