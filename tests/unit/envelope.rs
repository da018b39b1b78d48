//! Unit tests for response envelope extraction

use retail_traffic_extractor::fetcher::envelope::extract_records;
use retail_traffic_extractor::fetcher::FetchError;
use serde_json::json;

#[test]
fn test_records_pass_through_unmodified() {
    let body = json!({
        "Data": [
            {"DateTime": "2023-01-01T08:00:00", "StoreNo": 5, "Traffic": 131, "Nested": {"a": [1, 2]}},
        ],
    });
    let records = extract_records(body).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("Traffic"), Some(&json!(131)));
    assert_eq!(records[0].get("Nested"), Some(&json!({"a": [1, 2]})));
}

#[test]
fn test_envelope_sibling_keys_ignored() {
    let body = json!({"Data": [{"StoreNo": 1}], "Status": "OK", "Count": 1});
    let records = extract_records(body).unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn test_missing_records_key_is_empty_not_error() {
    assert!(extract_records(json!({"Status": "OK"})).unwrap().is_empty());
    assert!(extract_records(json!({})).unwrap().is_empty());
}

#[test]
fn test_malformed_envelope_is_fatal() {
    for body in [json!({"Data": 7}), json!({"Data": "x"}), json!(null), json!("body")] {
        let err = extract_records(body).unwrap_err();
        assert!(matches!(err, FetchError::Envelope(_)), "got {err:?}");
        assert!(!err.is_transient());
    }
}
