//! Write-conflict detection: a field assigned by more than one rule.
//!
//! The evaluator flags this at run time only when both writers actually
//! fire; statically every pair of potential writers is reported.

use std::collections::BTreeMap;

use edict_core::Document;

use crate::report::{AnalysisReport, Issue, IssueCode};

pub(crate) fn check(doc: &Document, report: &mut AnalysisReport) {
    let mut writers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for rule in &doc.logic_tree {
        if let Some(action) = &rule.then {
            for field in action.set.keys() {
                writers.entry(field).or_default().push(&rule.id);
            }
        }
    }

    for (field, mut rules) in writers {
        if rules.len() > 1 {
            rules.sort_unstable();
            report.push(
                Issue::warning(
                    IssueCode::ConflictingWrites,
                    format!(
                        "field '{}' may be set by multiple rules: {}",
                        field,
                        rules.join(", ")
                    ),
                )
                .with_field(field),
            );
        }
    }
}
