use sha2::{Digest, Sha256};

use crate::program::{Origin, Program};
use crate::registry::Registry;
use lineage_core::ProgramId;

/// Computes the canonical structural hash of a registry.
///
/// Covers every program attribute and relation plus the three indices, so
/// two registries hash equally exactly when they describe the same lineage.
pub fn canonical_hash(registry: &Registry) -> String {
    let mut hasher = Sha256::new();
    hasher.update((registry.len() as u64).to_le_bytes());
    for program in registry.programs() {
        encode_program(program, &mut hasher);
    }
    update_ids(registry.generated(), &mut hasher);
    for index in [registry.corpus(), registry.triage()] {
        hasher.update((index.len() as u64).to_le_bytes());
        for (signature, id) in index {
            update_str(signature, &mut hasher);
            hasher.update(id.as_raw().to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

fn encode_program(program: &Program, hasher: &mut Sha256) {
    hasher.update(program.id.as_raw().to_le_bytes());
    update_str(&program.signature, hasher);
    hasher.update(program.timestamp.to_bits().to_le_bytes());
    hasher.update([program.executed as u8, program.in_corpus as u8]);
    hasher.update((program.size as u64).to_le_bytes());
    update_origin(program.origin, hasher);
    update_origin(program.corpus_source, hasher);
    for coverage in [&program.coverage, &program.coverage_corpus] {
        hasher.update((coverage.len() as u64).to_le_bytes());
        for address in coverage {
            hasher.update(address.to_le_bytes());
        }
    }
    update_option(program.parent, hasher);
    update_option(program.minimize_target, hasher);
    update_ids(&program.children, hasher);
    update_ids(&program.minimize_attempts, hasher);
}

fn update_origin(origin: Option<Origin>, hasher: &mut Sha256) {
    match origin {
        Some(origin) => hasher.update([1, origin.source_code()]),
        None => hasher.update([0, 0]),
    }
}

fn update_option(id: Option<ProgramId>, hasher: &mut Sha256) {
    match id {
        Some(id) => {
            hasher.update(b"some");
            hasher.update(id.as_raw().to_le_bytes());
        }
        None => hasher.update(b"none"),
    }
}

fn update_ids(ids: &[ProgramId], hasher: &mut Sha256) {
    hasher.update((ids.len() as u64).to_le_bytes());
    for id in ids {
        hasher.update(id.as_raw().to_le_bytes());
    }
}

fn update_str(value: &str, hasher: &mut Sha256) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}
