//! Structural checks: shape mistakes that make a document unsound
//! regardless of any particular evaluation, plus deprecation warnings
//! for constraints that can never fire.

use std::collections::BTreeMap;

use edict_core::Document;
use regex::Regex;

use crate::report::{AnalysisReport, Issue, IssueCode};

const FIELD_TYPES: &[&str] = &[
    "string",
    "number",
    "boolean",
    "select",
    "date",
    "attestation",
    "currency",
];

pub(crate) fn check(doc: &Document, report: &mut AnalysisReport) {
    if doc.definitions.is_empty() {
        report.push(Issue::error(
            IssueCode::EmptyDefinitions,
            "document defines no fields",
        ));
    }

    for (id, def) in &doc.definitions {
        if !FIELD_TYPES.contains(&def.field_type.as_str()) {
            report.push(
                Issue::error(
                    IssueCode::InvalidFieldType,
                    format!("field '{}' has invalid type '{}'", id, def.field_type),
                )
                .with_field(id),
            );
        }

        if def.field_type == "select" && def.options.as_deref().map_or(true, |o| o.is_empty()) {
            report.push(
                Issue::error(
                    IssueCode::MissingOptions,
                    format!("select field '{}' has no options", id),
                )
                .with_field(id),
            );
        }

        if let (Some(min), Some(max)) = (def.min, def.max) {
            if min > max {
                report.push(
                    Issue::error(
                        IssueCode::ConstraintOrder,
                        format!("field '{}' has min {} greater than max {}", id, min, max),
                    )
                    .with_field(id),
                );
            }
        }
        if let (Some(min_length), Some(max_length)) = (def.min_length, def.max_length) {
            if min_length > max_length {
                report.push(
                    Issue::error(
                        IssueCode::ConstraintOrder,
                        format!(
                            "field '{}' has min_length {} greater than max_length {}",
                            id, min_length, max_length
                        ),
                    )
                    .with_field(id),
                );
            }
        }

        if !def.pattern.is_empty() {
            if let Err(e) = Regex::new(&def.pattern) {
                report.push(
                    Issue::error(
                        IssueCode::InvalidPattern,
                        format!("field '{}' has an invalid pattern: {}", id, e),
                    )
                    .with_field(id),
                );
            }
        }

        // Constraints that the validator will never apply to this type.
        let numeric = matches!(def.field_type.as_str(), "number" | "currency");
        if !numeric && (def.min.is_some() || def.max.is_some() || def.step.is_some()) {
            report.push(
                Issue::warning(
                    IssueCode::DeprecatedConstraint,
                    format!(
                        "numeric constraints on non-numeric field '{}' have no effect",
                        id
                    ),
                )
                .with_field(id),
            );
        }
        let stringy = def.field_type == "string";
        if !stringy
            && (def.min_length.is_some() || def.max_length.is_some() || !def.pattern.is_empty())
        {
            report.push(
                Issue::warning(
                    IssueCode::DeprecatedConstraint,
                    format!(
                        "string constraints on non-string field '{}' have no effect",
                        id
                    ),
                )
                .with_field(id),
            );
        }
    }

    let mut seen_rule_ids: Vec<&str> = Vec::new();
    for rule in &doc.logic_tree {
        if rule.id.is_empty() {
            report.push(Issue::error(
                IssueCode::EmptyRuleId,
                "rule has an empty id",
            ));
        } else if seen_rule_ids.contains(&rule.id.as_str()) {
            report.push(
                Issue::error(
                    IssueCode::DuplicateRuleId,
                    format!("rule id '{}' is declared more than once", rule.id),
                )
                .with_rule(&rule.id),
            );
        } else {
            seen_rule_ids.push(&rule.id);
        }

        if rule.when.is_null() {
            report.push(
                Issue::error(
                    IssueCode::MissingWhen,
                    format!("rule '{}' has no when condition", rule.id),
                )
                .with_rule(&rule.id),
            );
        }
        if rule.then.is_none() {
            report.push(
                Issue::error(
                    IssueCode::MissingThen,
                    format!("rule '{}' has no then action", rule.id),
                )
                .with_rule(&rule.id),
            );
        }
    }

    for (id, att) in &doc.attestations {
        if att.statement.is_empty() {
            report.push(
                Issue::error(
                    IssueCode::MissingStatement,
                    format!("attestation '{}' has no statement", id),
                )
                .with_field(id),
            );
        }
    }

    for (i, branch) in doc.temporal_map.iter().enumerate() {
        if branch.logic_version.is_empty() {
            report.push(
                Issue::error(
                    IssueCode::MissingLogicVersion,
                    format!("temporal branch {} has no logic_version", i),
                )
                .with_path(format!("temporal_map[{}]", i)),
            );
        }
    }

    if let Some(state_model) = &doc.state_model {
        for (name, derived) in &state_model.derived {
            if derived.eval.is_null() {
                report.push(
                    Issue::error(
                        IssueCode::MissingEval,
                        format!("derived field '{}' has no eval expression", name),
                    )
                    .with_field(name),
                );
            }
        }
    }

    check_id_collisions(doc, report);
}

/// An id may live in exactly one of the five namespaces: definitions,
/// rules, attestations, derived fields, temporal versions.
fn check_id_collisions<'d>(doc: &'d Document, report: &mut AnalysisReport) {
    let mut map: BTreeMap<&'d str, Vec<&'static str>> = BTreeMap::new();
    {
        let mut record = |id: &'d str, ns: &'static str| {
            let entry = map.entry(id).or_default();
            if !entry.contains(&ns) {
                entry.push(ns);
            }
        };

        for id in doc.definitions.keys() {
            record(id, "definition");
        }
        for rule in &doc.logic_tree {
            if !rule.id.is_empty() {
                record(&rule.id, "rule");
            }
        }
        for id in doc.attestations.keys() {
            record(id, "attestation");
        }
        if let Some(state_model) = &doc.state_model {
            for name in state_model.derived.keys() {
                record(name, "derived");
            }
        }
        for branch in &doc.temporal_map {
            if !branch.logic_version.is_empty() {
                record(&branch.logic_version, "temporal_version");
            }
        }
    }

    for (id, kinds) in map {
        if kinds.len() > 1 {
            report.push(
                Issue::error(
                    IssueCode::IdCollision,
                    format!("id '{}' is used across namespaces: {}", id, kinds.join(", ")),
                )
                .with_field(id),
            );
        }
    }
}
