use std::fs;

use lineage_trace::{canonical_hash, load_trace, parse_str, CachedTrace, Origin, ParserConfig};

const LOG: &str = "<<<0>>>\n# Generate\n>>>A\n<<<\n- executeRaw 1\n\
<<<1000000000>>>\n= 0x10\n<<<3000000000>>>\n# Mutate\n>>>A\n<<<\n>>>B\n<<<\n- executeRaw 2\n= 0x20\n";

#[test_log::test]
fn missing_log_is_empty_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.log");
    assert!(load_trace(&path, &ParserConfig::default()).unwrap().is_none());
    assert!(CachedTrace::from_log(&path, &ParserConfig::default())
        .unwrap()
        .is_none());
}

#[test]
fn file_and_string_parses_agree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fuzz.log");
    fs::write(&path, LOG).unwrap();
    let from_file = load_trace(&path, &ParserConfig::default()).unwrap().unwrap();
    let from_str = parse_str(LOG, &ParserConfig::default());
    assert_eq!(canonical_hash(&from_file), canonical_hash(&from_str));
}

#[test]
fn invalid_utf8_is_decoded_lossily() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("binary.log");
    let mut bytes = b"# Generate\n>>>A\xff\n<<<\n".to_vec();
    bytes.extend_from_slice(b">>>B\n<<<\n");
    fs::write(&path, bytes).unwrap();
    let registry = load_trace(&path, &ParserConfig::default()).unwrap().unwrap();
    assert_eq!(registry.len(), 2);
    assert!(registry.lookup("B").is_some());
}

#[test]
fn cached_trace_tracks_its_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fuzz.log");
    fs::write(&path, LOG).unwrap();
    let cached = CachedTrace::from_log(&path, &ParserConfig::default())
        .unwrap()
        .unwrap();
    assert!(cached.is_fresh(LOG.as_bytes()));
    assert!(!cached.is_fresh(b"# Generate\n"));
    assert_eq!(cached.provenance.line_count, cached.registry.stats().lines);

    let restored = CachedTrace::from_bytes(&cached.to_bytes().unwrap()).unwrap();
    assert_eq!(restored.provenance, cached.provenance);
    assert_eq!(
        canonical_hash(&restored.registry),
        canonical_hash(&cached.registry)
    );
}

#[test]
fn work_series_is_sampled_per_timestamp() {
    let registry = parse_str(LOG, &ParserConfig::default());
    let work = registry.work();
    assert_eq!(work.len(), 4);
    assert_eq!(work[0].elapsed, 0.0);
    assert_eq!(work[1].counters.generate_executions, 1);
    assert_eq!(work[2].elapsed, 3.0);
    assert_eq!(work[2].counters.generate_coverage, 1);
    let last = work[3].counters;
    assert_eq!(last.executions, 2);
    assert_eq!(last.executions_of(Origin::Mutate), 1);
    assert_eq!(last.coverage_per_execution(Origin::Mutate), 1.0);
}
