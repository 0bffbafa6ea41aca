//! Derived-state behavior across the pipeline: chained derivations,
//! recomputation after rule writes, and null propagation.

use chrono::NaiveDateTime;
use edict_core::{DocStatus, Document};
use edict_eval::evaluate;
use serde_json::{json, Value};

fn noon() -> NaiveDateTime {
    edict_core::value::parse_date_str("2025-04-01").unwrap()
}

fn doc(v: serde_json::Value) -> Document {
    serde_json::from_value(v).unwrap()
}

#[test]
fn derived_can_depend_on_other_derived() {
    let input = doc(json!({
        "definitions": {
            "subtotal": {"type": "number", "value": 200}
        },
        "state_model": {
            "derived": {
                "tax": {"eval": {"*": [{"var": "subtotal"}, 0.25]}},
                "total": {"eval": {"+": [{"var": "subtotal"}, {"var": "tax"}]}}
            }
        }
    }));

    let result = evaluate(&input, noon()).unwrap();
    assert_eq!(result.definitions["tax"].value, json!(50.0));
    assert_eq!(result.definitions["total"].value, json!(250.0));
}

#[test]
fn rules_writing_derived_inputs_are_reflected_in_the_output() {
    // The rule rewrites the derived input; the second derived pass must
    // pick the new value up.
    let input = doc(json!({
        "definitions": {
            "base_rate": {"type": "number", "value": 10},
            "premium_customer": {"type": "boolean", "value": true}
        },
        "state_model": {
            "derived": {
                "fee": {"eval": {"*": [{"var": "base_rate"}, 2]}}
            }
        },
        "logic_tree": [
            {
                "id": "premium_discount",
                "when": {"==": [{"var": "premium_customer"}, true]},
                "then": {"set": {"base_rate": 5}}
            }
        ]
    }));

    let result = evaluate(&input, noon()).unwrap();
    assert_eq!(result.definitions["base_rate"].value, json!(5));
    assert_eq!(result.definitions["fee"].value, json!(10.0));
}

#[test]
fn rules_see_first_pass_derived_values() {
    // The condition reads a derived value computed before any rule ran.
    let input = doc(json!({
        "definitions": {
            "quantity": {"type": "number", "value": 12}
        },
        "state_model": {
            "derived": {
                "bulk_order": {"eval": {">": [{"var": "quantity"}, 10]}}
            }
        },
        "logic_tree": [
            {
                "id": "apply_bulk_discount",
                "when": {"var": "bulk_order"},
                "then": {"set": {"discount": 0.15}}
            }
        ]
    }));

    let result = evaluate(&input, noon()).unwrap();
    assert_eq!(result.definitions["bulk_order"].value, json!(true));
    assert_eq!(result.definitions["discount"].value, json!(0.15));
}

#[test]
fn derived_over_unset_input_is_null_but_still_created() {
    let input = doc(json!({
        "definitions": {
            "income": {"type": "number", "value": null}
        },
        "state_model": {
            "derived": {
                "projected": {"eval": {"*": [{"var": "income"}, 12]}}
            }
        }
    }));

    let result = evaluate(&input, noon()).unwrap();
    let projected = &result.definitions["projected"];
    assert_eq!(projected.value, Value::Null);
    assert!(projected.readonly);
    assert_eq!(projected.visible, Some(true));
    assert_eq!(result.status, Some(DocStatus::Ready));
}

#[test]
fn progressive_bracket_via_chained_if() {
    let bracket_doc = |income: f64| {
        doc(json!({
            "definitions": {
                "income": {"type": "number", "value": income, "required": true}
            },
            "state_model": {
                "derived": {
                    "bracket": {"eval": {"if": [
                        {"<=": [{"var": "income"}, 11000]}, "10%",
                        {"<=": [{"var": "income"}, 44725]}, "12%",
                        {"<=": [{"var": "income"}, 95375]}, "22%",
                        "24%"
                    ]}},
                    "estimated_tax": {"eval": {"if": [
                        {"<=": [{"var": "income"}, 11000]},
                        {"*": [{"var": "income"}, 0.10]},
                        {"*": [{"var": "income"}, 0.18]}
                    ]}}
                }
            }
        }))
    };

    let result = evaluate(&bracket_doc(9000.0), noon()).unwrap();
    assert_eq!(result.definitions["bracket"].value, json!("10%"));
    assert_eq!(result.definitions["estimated_tax"].value, json!(900.0));

    let result = evaluate(&bracket_doc(60000.0), noon()).unwrap();
    assert_eq!(result.definitions["bracket"].value, json!("22%"));

    let result = evaluate(&bracket_doc(200000.0), noon()).unwrap();
    assert_eq!(result.definitions["bracket"].value, json!("24%"));
}

#[test]
fn mutual_derived_recursion_degrades_to_null_with_cycle_errors() {
    let input = doc(json!({
        "definitions": {
            "seed": {"type": "number", "value": 1}
        },
        "state_model": {
            "derived": {
                "ping": {"eval": {"+": [{"var": "pong"}, 1]}},
                "pong": {"eval": {"+": [{"var": "ping"}, 1]}}
            }
        }
    }));

    let result = evaluate(&input, noon()).unwrap();
    // Both land as null; the cycle guard cut the recursion.
    assert_eq!(result.definitions["ping"].value, Value::Null);
    assert_eq!(result.definitions["pong"].value, Value::Null);
    assert!(result
        .errors
        .iter()
        .any(|e| e.kind == edict_core::ErrorKind::CycleDetected));
    // Cycles never affect status.
    assert_eq!(result.status, Some(DocStatus::Ready));
}
