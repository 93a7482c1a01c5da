//! Determinism properties of the canonical form over realistic documents.

use ct_canon::{canonicalize_bytes, canonicalize_str, canonicalize_value, Digest, HashAlgorithm};
use serde_json::{json, Value};

fn sample_documents() -> Vec<Value> {
    vec![
        json!({}),
        json!({"a": 1, "b": 2}),
        json!({
            "resourceType": "Bundle",
            "id": "bundle-example",
            "meta": {"lastUpdated": "2014-08-18T01:43:30Z", "versionId": "3"},
            "entry": [
                {"fullUrl": "https://example.com/base/Medication/example", "search": {"mode": "match", "score": 1.0}},
                {"resource": {"resourceType": "Medication", "code": {"text": "Ångström \u{2028} \t"}}}
            ],
            "total": 3,
            "ratio": 0.25,
            "huge": 1.0e300,
            "tiny": -4.5e-9,
            "flags": [true, false, null]
        }),
        json!({
            "resourceType": "Patient",
            "name": [{"family": "Chalmers", "given": ["Peter", "James"]}],
            "provenance": {"resourceType": "Provenance", "recorded": "2015-06-27T08:39:24+10:00"}
        }),
    ]
}

#[test]
fn test_canonical_output_reparses_to_same_form() {
    for document in sample_documents() {
        let canonical = canonicalize_value(&document).unwrap();
        let reparsed: Value = serde_json::from_str(&canonical).unwrap();
        assert_eq!(canonicalize_value(&reparsed).unwrap(), canonical);
    }
}

#[test]
fn test_pretty_and_compact_serializations_agree() {
    for document in sample_documents() {
        let pretty = serde_json::to_string_pretty(&document).unwrap();
        let compact = serde_json::to_string(&document).unwrap();
        assert_eq!(
            canonicalize_str(&pretty).unwrap(),
            canonicalize_str(&compact).unwrap()
        );
    }
}

#[test]
fn test_key_order_does_not_matter() {
    let forward = r#"{"resourceType":"Observation","status":"final","valueQuantity":{"value":6.3,"unit":"mmol/l"}}"#;
    let backward = r#"{"valueQuantity":{"unit":"mmol/l","value":6.30},"status":"final","resourceType":"Observation"}"#;
    assert_eq!(
        canonicalize_bytes(forward.as_bytes()).unwrap(),
        canonicalize_bytes(backward.as_bytes()).unwrap()
    );
}

#[test]
fn test_equivalent_unicode_spellings_hash_identically() {
    let composed = "{\"name\":\"Zo\u{eb}\"}";
    let decomposed = "{\"name\":\"Zoe\u{308}\"}";
    let left = canonicalize_bytes(composed.as_bytes()).unwrap();
    let right = canonicalize_bytes(decomposed.as_bytes()).unwrap();
    assert_eq!(
        Digest::compute(HashAlgorithm::Sha256, &left),
        Digest::compute(HashAlgorithm::Sha256, &right)
    );
}

#[test]
fn test_any_change_alters_digest() {
    let original = canonicalize_str(r#"{"status":"final","value":1}"#).unwrap();
    let changed = canonicalize_str(r#"{"status":"finaL","value":1}"#).unwrap();
    for algorithm in HashAlgorithm::ALL {
        assert_ne!(
            Digest::compute(algorithm, original.as_bytes()),
            Digest::compute(algorithm, changed.as_bytes())
        );
    }
}

#[test]
fn test_number_vectors_parsed_from_text() {
    let cases = [
        ("333333333.33333329", "333333333.3333333"),
        ("1E30", "1e+30"),
        ("4.50", "4.5"),
        ("2e-3", "0.002"),
        ("0.000000000000000000000000001", "1e-27"),
        ("123456789.12345679", "123456789.12345679"),
        ("295147905179352830000", "295147905179352830000"),
        ("-0", "0"),
        ("1e21", "1e+21"),
        ("1e-7", "1e-7"),
    ];
    for (input, expected) in cases {
        assert_eq!(canonicalize_str(input).unwrap(), expected, "input {input}");
        let wrapped = format!(r#"{{"n":[{input}]}}"#);
        assert_eq!(
            canonicalize_bytes(wrapped.as_bytes()).unwrap(),
            format!(r#"{{"n":[{expected}]}}"#).into_bytes()
        );
    }
}

#[test]
fn test_close_decimals_stay_distinct() {
    let a = canonicalize_str("[123456789.12345679]").unwrap();
    let b = canonicalize_str("[123456789.1234568]").unwrap();
    assert_ne!(a, b);
    assert_eq!(b, "[123456789.1234568]");
}
