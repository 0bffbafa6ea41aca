//! Analyzer integration: one messy document exercising every check
//! family, and agreement with the evaluator on a clean one.

use edict_analyze::{analyze, IssueCode, Severity};
use edict_core::Document;
use serde_json::json;

fn doc(v: serde_json::Value) -> Document {
    serde_json::from_value(v).unwrap()
}

#[test]
fn messy_document_reports_every_check_family() {
    let report = analyze(&doc(json!({
        "definitions": {
            "amount": {"type": "number", "min": 100, "max": 10},
            "label": {"type": "string", "step": 0.5},
            "choice": {"type": "select"}
        },
        "attestations": {
            "sign_off": {"statement": ""}
        },
        "temporal_map": [
            {"valid_range": ["2024-01-01", "2024-12-31"], "logic_version": "v1"},
            {"valid_range": ["2024-06-01", null], "logic_version": ""}
        ],
        "logic_tree": [
            {"id": "a", "when": {"+": [{"var": "label"}, 1]}, "then": {"set": {"amount": 1}}},
            {"id": "a", "when": {"<": [{"var": "amount"}, {"var": "label"}]},
             "then": {"set": {"amount": 2}}},
            {"id": "b", "logic_version": "v7",
             "when": {"shuffle": [{"var": "phantom"}]}, "then": {"set": {"label": 3}}}
        ],
        "state_model": {
            "inputs": ["amount", "gone"],
            "derived": {
                "x": {"eval": {"var": "y"}},
                "y": {"eval": {"var": "x"}},
                "empty": {}
            }
        }
    })));

    assert!(!report.valid);

    let codes: Vec<IssueCode> = report.issues.iter().map(|i| i.code).collect();
    // Structural
    assert!(codes.contains(&IssueCode::ConstraintOrder));
    assert!(codes.contains(&IssueCode::MissingOptions));
    assert!(codes.contains(&IssueCode::DuplicateRuleId));
    assert!(codes.contains(&IssueCode::MissingStatement));
    assert!(codes.contains(&IssueCode::MissingLogicVersion));
    assert!(codes.contains(&IssueCode::MissingEval));
    assert!(codes.contains(&IssueCode::DeprecatedConstraint));
    // References
    assert!(codes.contains(&IssueCode::UndefinedReference));
    assert!(codes.contains(&IssueCode::UnknownLogicVersion));
    assert!(codes.contains(&IssueCode::UnknownOperator));
    assert!(codes.contains(&IssueCode::UnknownInput));
    // Types
    assert!(codes.contains(&IssueCode::ArithmeticTypeError));
    assert!(codes.contains(&IssueCode::ComparisonTypeMixed));
    assert!(codes.contains(&IssueCode::SetTypeMismatch));
    // Temporal
    assert!(codes.contains(&IssueCode::OverlappingRanges));
    // Conflicts
    assert!(codes.contains(&IssueCode::ConflictingWrites));
    // Cycles
    assert!(codes.contains(&IssueCode::DerivedCycle));
}

#[test]
fn analysis_is_deterministic() {
    let input = json!({
        "definitions": {"a": {"type": "number"}},
        "logic_tree": [
            {"id": "r1", "when": {">": [{"var": "ghost"}, 1]}, "then": {"set": {"a": 1}}},
            {"id": "r2", "when": true, "then": {"set": {"a": 2}}}
        ]
    });

    let first = analyze(&doc(input.clone()));
    let second = analyze(&doc(input));
    let render = |r: &edict_analyze::AnalysisReport| {
        r.issues
            .iter()
            .map(|i| format!("{:?}:{}", i.severity, i.message))
            .collect::<Vec<_>>()
    };
    assert_eq!(render(&first), render(&second));
}

#[test]
fn severity_split_matches_validity() {
    let report = analyze(&doc(json!({
        "definitions": {"a": {"type": "number"}},
        "logic_tree": [
            {"id": "r", "when": {"==": [{"var": "ghost"}, 1]}, "then": {}}
        ]
    })));
    assert!(report.valid);
    assert_eq!(report.errors().count(), 0);
    assert!(report.warnings().count() > 0);

    let report = analyze(&doc(json!({"definitions": {}})));
    assert!(!report.valid);
    assert_eq!(report.errors().count(), 1);
    assert_eq!(report.errors().next().unwrap().severity, Severity::Error);
}
