use crate::*;

#[test]
fn yaml_record_keys_are_lowercased_recursively() {
    let rec = ReleaseRecord::from_yaml_str(
        "CATALOG: NX001\nColors:\n  BG: '#FF0000'\nTracks:\n  A:\n    - Title: Intro\n",
    )
    .unwrap();
    assert_eq!(
        rec.get_path("colors.bg").and_then(|v| v.as_str()),
        Some("#FF0000")
    );
    assert_eq!(
        rec.get_path("tracks.a")
            .and_then(|v| v.as_array())
            .and_then(|a| a[0].get("title"))
            .and_then(|v| v.as_str()),
        Some("Intro")
    );
}

#[test]
fn empty_yaml_document_is_an_empty_record() {
    let rec = ReleaseRecord::from_yaml_str("").unwrap();
    assert_eq!(rec, ReleaseRecord::empty());
}

#[test]
fn non_mapping_root_is_rejected() {
    let err = ReleaseRecord::from_yaml_str("- a\n- b\n").unwrap_err();
    assert!(matches!(err, Error::InvalidRecord { .. }), "{err}");
}

#[test]
fn malformed_yaml_is_reported() {
    let err = ReleaseRecord::from_yaml_str("catalog: [unterminated").unwrap_err();
    assert!(matches!(err, Error::InvalidRecordYaml { .. }), "{err}");
}
