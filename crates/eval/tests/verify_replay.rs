//! Replay verification: legitimate journeys pass, tampering and
//! injection are detected, and the iteration cap is honored.

use edict_core::{DocStatus, Document};
use edict_eval::{verify, verify_with_cap, VerifyCode};
use serde_json::json;

/// Base document with branching visibility: revenue reveals either the
/// small-business or the large-business field, and the tax bracket is
/// derived from revenue.
fn base_document() -> Document {
    serde_json::from_value(json!({
        "definitions": {
            "revenue": {"type": "number", "value": null, "visible": true},
            "small_biz_field": {"type": "string", "visible": false},
            "large_biz_field": {"type": "string", "visible": false}
        },
        "logic_tree": [
            {
                "id": "show_small",
                "when": {"<=": [{"var": "revenue"}, 5000]},
                "then": {"ui_modify": {"small_biz_field": {"visible": true, "required": true}}}
            },
            {
                "id": "show_large",
                "when": {">": [{"var": "revenue"}, 5000]},
                "then": {"ui_modify": {"large_biz_field": {"visible": true, "required": true}}}
            }
        ],
        "state_model": {
            "derived": {
                "tax_bracket": {
                    "eval": {"if": [{"<=": [{"var": "revenue"}, 5000]}, "low", "high"]}
                }
            }
        }
    }))
    .unwrap()
}

fn completed(v: serde_json::Value) -> Document {
    serde_json::from_value(v).unwrap()
}

#[test]
fn valid_small_business_path() {
    let doc = completed(json!({
        "definitions": {
            "revenue": {"type": "number", "value": 3000, "visible": true},
            "small_biz_field": {"type": "string", "value": "small corp", "visible": true, "required": true},
            "large_biz_field": {"type": "string", "visible": false},
            "tax_bracket": {"type": "string", "value": "low", "readonly": true, "visible": true}
        },
        "status": "READY"
    }));

    let report = verify(&doc, &base_document());
    assert!(report.valid, "issues: {:?}", report.issues);
    assert_eq!(report.status, Some(DocStatus::Ready));
}

#[test]
fn valid_large_business_path() {
    let doc = completed(json!({
        "definitions": {
            "revenue": {"type": "number", "value": 10000, "visible": true},
            "small_biz_field": {"type": "string", "visible": false},
            "large_biz_field": {"type": "string", "value": "big corp", "visible": true, "required": true},
            "tax_bracket": {"type": "string", "value": "high", "readonly": true, "visible": true}
        },
        "status": "READY"
    }));

    let report = verify(&doc, &base_document());
    assert!(report.valid, "issues: {:?}", report.issues);
}

#[test]
fn tampered_computed_value_is_detected() {
    // Revenue 3000 derives "low"; the submission claims "high".
    let doc = completed(json!({
        "definitions": {
            "revenue": {"type": "number", "value": 3000, "visible": true},
            "small_biz_field": {"type": "string", "value": "x", "visible": true, "required": true},
            "large_biz_field": {"type": "string", "visible": false},
            "tax_bracket": {"type": "string", "value": "high", "readonly": true, "visible": true}
        },
        "status": "READY"
    }));

    let report = verify(&doc, &base_document());
    assert!(!report.valid);

    let mismatches: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.code == VerifyCode::ComputedMismatch)
        .collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].field_id, "tax_bracket");
    assert_eq!(mismatches[0].expected, json!("low"));
    assert_eq!(mismatches[0].claimed, json!("high"));
}

#[test]
fn injected_field_is_detected() {
    let doc = completed(json!({
        "definitions": {
            "revenue": {"type": "number", "value": 3000, "visible": true},
            "small_biz_field": {"type": "string", "value": "x", "visible": true, "required": true},
            "large_biz_field": {"type": "string", "visible": false},
            "tax_bracket": {"type": "string", "value": "low", "readonly": true, "visible": true},
            "INJECTED": {"type": "string", "value": "hacked"}
        },
        "status": "READY"
    }));

    let report = verify(&doc, &base_document());
    assert!(!report.valid);

    let unknown: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.code == VerifyCode::UnknownField)
        .collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].field_id, "INJECTED");
}

#[test]
fn status_tampering_is_detected() {
    // Claims READY but the replay finds the required field unfilled.
    let doc = completed(json!({
        "definitions": {
            "revenue": {"type": "number", "value": 3000, "visible": true},
            "small_biz_field": {"type": "string", "visible": true, "required": true},
            "large_biz_field": {"type": "string", "visible": false},
            "tax_bracket": {"type": "string", "value": "low", "readonly": true, "visible": true}
        },
        "status": "READY"
    }));

    let report = verify(&doc, &base_document());
    assert!(!report.valid);
    assert!(report
        .issues
        .iter()
        .any(|i| i.code == VerifyCode::StatusMismatch));
    assert_eq!(report.status, Some(DocStatus::Incomplete));
}

#[test]
fn missing_computed_field_is_a_mismatch() {
    let doc = completed(json!({
        "definitions": {
            "revenue": {"type": "number", "value": 3000, "visible": true},
            "small_biz_field": {"type": "string", "value": "x", "visible": true, "required": true},
            "large_biz_field": {"type": "string", "visible": false}
        },
        "status": "READY"
    }));

    let report = verify(&doc, &base_document());
    assert!(!report.valid);
    let mismatch = report
        .issues
        .iter()
        .find(|i| i.code == VerifyCode::ComputedMismatch)
        .expect("computed mismatch for the absent field");
    assert_eq!(mismatch.field_id, "tax_bracket");
    assert_eq!(mismatch.expected, json!("low"));
    assert!(mismatch.claimed.is_null());
}

#[test]
fn required_attestation_must_carry_evidence() {
    let base: Document = serde_json::from_value(json!({
        "definitions": {
            "region": {"type": "string", "value": "EU"}
        },
        "attestations": {
            "dpa": {"statement": "Processing agreement accepted", "required": true}
        }
    }))
    .unwrap();

    // Signed, but with no evidence at all.
    let doc = completed(json!({
        "definitions": {
            "region": {"type": "string", "value": "EU"}
        },
        "attestations": {
            "dpa": {"statement": "Processing agreement accepted", "required": true, "signed": true}
        },
        "status": "INCOMPLETE"
    }));

    let report = verify(&doc, &base);
    assert!(!report.valid);
    let codes: Vec<VerifyCode> = report.issues.iter().map(|i| i.code).collect();
    assert!(codes.contains(&VerifyCode::AttestationNoEvidence));
    assert!(codes.contains(&VerifyCode::AttestationNoTimestamp));

    // Unsigned reports a single unsigned issue instead.
    let unsigned = completed(json!({
        "definitions": {
            "region": {"type": "string", "value": "EU"}
        },
        "attestations": {
            "dpa": {"statement": "Processing agreement accepted", "required": true, "signed": false}
        },
        "status": "INCOMPLETE"
    }));
    let report = verify(&unsigned, &base);
    let codes: Vec<VerifyCode> = report.issues.iter().map(|i| i.code).collect();
    assert!(codes.contains(&VerifyCode::AttestationUnsigned));
    assert!(!codes.contains(&VerifyCode::AttestationNoEvidence));
}

#[test]
fn iteration_cap_of_zero_reports_convergence_failure() {
    let doc = completed(json!({
        "definitions": {},
        "status": "READY"
    }));
    let report = verify_with_cap(&doc, &base_document(), 0);
    assert!(!report.valid);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].code, VerifyCode::ConvergenceFailed);
}

#[test]
fn all_issues_are_collected_not_just_the_first() {
    // Tampered bracket AND injected field AND wrong status.
    let doc = completed(json!({
        "definitions": {
            "revenue": {"type": "number", "value": 3000, "visible": true},
            "small_biz_field": {"type": "string", "visible": true, "required": true},
            "large_biz_field": {"type": "string", "visible": false},
            "tax_bracket": {"type": "string", "value": "high", "readonly": true, "visible": true},
            "INJECTED": {"type": "string", "value": "hacked"}
        },
        "status": "READY"
    }));

    let report = verify(&doc, &base_document());
    assert!(!report.valid);
    let codes: Vec<VerifyCode> = report.issues.iter().map(|i| i.code).collect();
    assert!(codes.contains(&VerifyCode::UnknownField));
    assert!(codes.contains(&VerifyCode::ComputedMismatch));
    assert!(codes.contains(&VerifyCode::StatusMismatch));
}
