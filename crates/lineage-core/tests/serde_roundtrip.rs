use lineage_core::provenance::{SchemaVersion, TraceProvenance};
use lineage_core::{NodeId, ProgramId};

#[test]
fn provenance_round_trip_json() {
    let provenance = TraceProvenance {
        source: "result_KCOV_0".into(),
        input_hash: "abc123".into(),
        line_count: 42,
        tool_version: "0.1.0".into(),
    };
    let json = serde_json::to_string_pretty(&provenance).expect("serialize");
    let decoded: TraceProvenance = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, provenance);
}

#[test]
fn ids_serialize_as_plain_integers() {
    let ids = (ProgramId::from_raw(3), NodeId::from_index(9));
    let json = serde_json::to_string(&ids).expect("serialize");
    assert_eq!(json, "[3,9]");
    assert_eq!(ids.0.index(), 3);
    assert_eq!(ids.1.as_raw(), 9);
}

#[test]
fn schema_compatibility_follows_major_version() {
    let current = SchemaVersion::new(1, 2, 0);
    assert!(current.is_compatible(&SchemaVersion::new(1, 0, 3)));
    assert!(!current.is_compatible(&SchemaVersion::new(1, 3, 0)));
    assert!(!current.is_compatible(&SchemaVersion::new(2, 0, 0)));
}
