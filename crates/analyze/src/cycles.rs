//! Derived-field cycle detection via three-color depth-first search.
//!
//! Nodes are derived names; an edge runs from a derived field to every
//! derived field its expression references. Hitting a gray node closes a
//! cycle. Self-references are ignored: a field may mention itself and
//! simply resolve against the prior value.

use std::collections::BTreeMap;

use edict_core::Document;

use crate::expr::var_roots;
use crate::report::{AnalysisReport, Issue, IssueCode};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

pub(crate) fn check(doc: &Document, report: &mut AnalysisReport) {
    let Some(state_model) = &doc.state_model else {
        return;
    };
    if state_model.derived.is_empty() {
        return;
    }

    // Adjacency in insertion order for deterministic reporting.
    let names: Vec<&str> = state_model.derived.keys().map(String::as_str).collect();
    let mut edges: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, derived) in &state_model.derived {
        let mut targets: Vec<&str> = Vec::new();
        for root in var_roots(&derived.eval) {
            if root == *name {
                continue;
            }
            if let Some(&target) = names.iter().find(|n| **n == root) {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        edges.insert(name, targets);
    }

    let mut colors: BTreeMap<&str, Color> =
        names.iter().map(|name| (*name, Color::White)).collect();
    let mut stack: Vec<&str> = Vec::new();

    for &name in &names {
        if colors[name] == Color::White {
            visit(name, &edges, &mut colors, &mut stack, report);
        }
    }
}

fn visit<'d>(
    name: &'d str,
    edges: &BTreeMap<&'d str, Vec<&'d str>>,
    colors: &mut BTreeMap<&'d str, Color>,
    stack: &mut Vec<&'d str>,
    report: &mut AnalysisReport,
) {
    colors.insert(name, Color::Gray);
    stack.push(name);

    for &target in edges.get(name).into_iter().flatten() {
        match colors[target] {
            Color::Gray => {
                // Close the cycle at the gray node for a readable path.
                let start = stack.iter().position(|n| *n == target).unwrap_or(0);
                let mut path: Vec<&str> = stack[start..].to_vec();
                path.push(target);
                report.push(
                    Issue::error(
                        IssueCode::DerivedCycle,
                        format!(
                            "circular dependency among derived fields: {}",
                            path.join(" -> ")
                        ),
                    )
                    .with_field(target),
                );
            }
            Color::White => visit(target, edges, colors, stack, report),
            Color::Black => {}
        }
    }

    stack.pop();
    colors.insert(name, Color::Black);
}
