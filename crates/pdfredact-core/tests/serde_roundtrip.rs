//! Serde tests for the types that appear in CLI JSON output and in
//! configuration.

#![cfg(feature = "serde")]

use pdfredact_core::*;

/// Helper: serialize to JSON string, deserialize back, assert equality.
fn roundtrip<T>(value: &T)
where
    T: serde::Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let json = serde_json::to_string(value).expect("serialize failed");
    let restored: T = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(*value, restored, "round-trip mismatch for JSON: {json}");
}

#[test]
fn outcome_uses_snake_case_names() {
    assert_eq!(
        serde_json::to_string(&Outcome::NotFound).unwrap(),
        "\"not_found\""
    );
    let parsed: Outcome = serde_json::from_str("\"redacted\"").unwrap();
    assert_eq!(parsed, Outcome::Redacted);
}

#[test]
fn batch_summary_fields() {
    let mut summary = BatchSummary::default();
    summary.record(Outcome::Redacted);
    summary.record(Outcome::Failed);

    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["processed"], 1);
    assert_eq!(value["redacted"], 1);
    assert_eq!(value["not_found"], 0);
    assert_eq!(value["errors"], 1);
    assert!(value["listing_error"].is_null());

    summary.listing_error = Some("permission denied".to_string());
    roundtrip(&summary);
}

#[test]
fn quad_serializes_named_corners() {
    let quad = Quad::from_rect(&Rect::new(72.0, 700.0, 160.0, 712.0));
    let value = serde_json::to_value(quad).unwrap();
    assert_eq!(value["ll"]["x"], 72.0);
    assert_eq!(value["ur"]["y"], 712.0);
    roundtrip(&quad);
}

#[test]
fn options_roundtrip() {
    roundtrip(&SearchOptions {
        case_sensitive: false,
    });
    roundtrip(&RedactionStyle {
        fill: [1.0, 0.5, 0.0],
        label: Some("REDACTED".to_string()),
    });
    roundtrip(&SaveOptions::default());
}
