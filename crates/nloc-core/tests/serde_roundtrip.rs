use nloc_core::provenance::{RunProvenance, SchemaVersion};

#[test]
fn provenance_round_trip_json() {
    let provenance = RunProvenance {
        input_hash: "input".into(),
        substitutions_hash: "subs".into(),
        level: 2,
        created_at: "2026-10-18T00:00:00Z".into(),
        tool_versions: [("nloc-core".into(), "0.1.0".into())].into_iter().collect(),
    };

    let json = serde_json::to_string_pretty(&provenance).expect("serialize");
    let decoded: RunProvenance = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(decoded, provenance);
}

#[test]
fn schema_version_defaults_to_one() {
    assert_eq!(SchemaVersion::default(), SchemaVersion::new(1, 0, 0));
    assert!(SchemaVersion::new(1, 2, 0) > SchemaVersion::new(1, 1, 9));
}
