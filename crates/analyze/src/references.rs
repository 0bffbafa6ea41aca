//! Reference checks: names and operators that nothing declares.
//!
//! All findings here are warnings. A `set` can create its target at
//! runtime and an undefined `var` degrades to null, so none of these
//! make a document unsound on their own.

use std::collections::BTreeSet;

use edict_core::Document;
use serde_json::Value;

use crate::expr::{is_known_operator, var_roots, walk_operators};
use crate::report::{AnalysisReport, Issue, IssueCode};

pub(crate) fn check(doc: &Document, report: &mut AnalysisReport) {
    let mut declared: BTreeSet<&str> = doc.definitions.keys().map(String::as_str).collect();
    if let Some(state_model) = &doc.state_model {
        declared.extend(state_model.derived.keys().map(String::as_str));
    }

    let versions: BTreeSet<&str> = doc
        .temporal_map
        .iter()
        .map(|b| b.logic_version.as_str())
        .filter(|v| !v.is_empty())
        .collect();

    for rule in &doc.logic_tree {
        check_expr_refs(&rule.when, &declared, Some(&rule.id), report);

        if !rule.logic_version.is_empty() && !versions.contains(rule.logic_version.as_str()) {
            report.push(
                Issue::warning(
                    IssueCode::UnknownLogicVersion,
                    format!(
                        "rule '{}' references logic_version '{}' that is not in the temporal map",
                        rule.id, rule.logic_version
                    ),
                )
                .with_rule(&rule.id),
            );
        }

        if let Some(action) = &rule.then {
            for (target, expr) in &action.set {
                if !declared.contains(target.as_str()) {
                    report.push(
                        Issue::warning(
                            IssueCode::UnknownTarget,
                            format!(
                                "rule '{}' sets undeclared field '{}' (it will be created at runtime)",
                                rule.id, target
                            ),
                        )
                        .with_field(target)
                        .with_rule(&rule.id),
                    );
                }
                check_expr_refs(expr, &declared, Some(&rule.id), report);
            }
            for target in action.ui_modify.keys() {
                if !declared.contains(target.as_str()) {
                    report.push(
                        Issue::warning(
                            IssueCode::UnknownTarget,
                            format!(
                                "rule '{}' modifies undeclared field '{}' (the modification is ignored)",
                                rule.id, target
                            ),
                        )
                        .with_field(target)
                        .with_rule(&rule.id),
                    );
                }
            }
        }
    }

    for (id, att) in &doc.attestations {
        if let Some(on_sign) = &att.on_sign {
            let rule_id = format!("attestation_{}", id);
            for expr in on_sign.set.values() {
                check_expr_refs(expr, &declared, Some(&rule_id), report);
            }
        }
    }

    if let Some(state_model) = &doc.state_model {
        for derived in state_model.derived.values() {
            check_expr_refs(&derived.eval, &declared, None, report);
        }

        for input in &state_model.inputs {
            if !declared.contains(input.as_str()) {
                report.push(
                    Issue::warning(
                        IssueCode::UnknownInput,
                        format!("state_model input '{}' does not exist", input),
                    )
                    .with_field(input),
                );
            }
        }
    }
}

fn check_expr_refs(
    expr: &Value,
    declared: &BTreeSet<&str>,
    rule_id: Option<&str>,
    report: &mut AnalysisReport,
) {
    for root in var_roots(expr) {
        if !declared.contains(root.as_str()) {
            let mut issue = Issue::warning(
                IssueCode::UndefinedReference,
                format!("reference to undeclared name '{}'", root),
            )
            .with_field(&root);
            if let Some(rule_id) = rule_id {
                issue = issue.with_rule(rule_id);
            }
            report.push(issue);
        }
    }

    walk_operators(expr, &mut |op, _| {
        if !is_known_operator(op) {
            let mut issue = Issue::warning(
                IssueCode::UnknownOperator,
                format!("unknown operator '{}'", op),
            );
            if let Some(rule_id) = rule_id {
                issue = issue.with_rule(rule_id);
            }
            report.push(issue);
        }
    });
}
