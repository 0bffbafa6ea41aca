//! Type inference over expression trees.
//!
//! Every operator has a known result type; `var` takes the declared type
//! of the referenced field; literals type as their JSON shape. The
//! `unknown` type participates silently -- it never triggers a mismatch,
//! so partial knowledge yields no false positives.

use std::collections::BTreeMap;

use edict_core::Document;
use serde_json::Value;

use crate::report::{AnalysisReport, Issue, IssueCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InferredType {
    Boolean,
    Number,
    String,
    Date,
    Array,
    Object,
    Unknown,
}

impl InferredType {
    fn name(self) -> &'static str {
        match self {
            InferredType::Boolean => "boolean",
            InferredType::Number => "number",
            InferredType::String => "string",
            InferredType::Date => "date",
            InferredType::Array => "array",
            InferredType::Object => "object",
            InferredType::Unknown => "unknown",
        }
    }
}

/// Map a declared field type onto the inference lattice.
pub(crate) fn declared_type(field_type: &str) -> InferredType {
    match field_type {
        "string" | "select" => InferredType::String,
        "number" | "currency" => InferredType::Number,
        "boolean" | "attestation" => InferredType::Boolean,
        "date" => InferredType::Date,
        _ => InferredType::Unknown,
    }
}

pub(crate) fn check(doc: &Document, report: &mut AnalysisReport) {
    let mut fields: BTreeMap<&str, InferredType> = doc
        .definitions
        .iter()
        .map(|(id, def)| (id.as_str(), declared_type(&def.field_type)))
        .collect();
    // Derived fields carry no declared type; they infer as unknown.
    if let Some(state_model) = &doc.state_model {
        for name in state_model.derived.keys() {
            fields.entry(name.as_str()).or_insert(InferredType::Unknown);
        }
    }

    let mut ctx = Context {
        fields: &fields,
        report,
        rule_id: None,
    };

    for rule in &doc.logic_tree {
        ctx.rule_id = Some(&rule.id);
        ctx.infer(&rule.when);

        if let Some(action) = &rule.then {
            for (target, expr) in &action.set {
                let expr_type = ctx.infer(expr);
                let target_type = ctx
                    .fields
                    .get(target.as_str())
                    .copied()
                    .unwrap_or(InferredType::Unknown);
                // Arrays are legal on any field (collection semantics).
                let comparable = expr_type != InferredType::Unknown
                    && expr_type != InferredType::Array
                    && target_type != InferredType::Unknown;
                if comparable && expr_type != target_type {
                    let issue = Issue::warning(
                        IssueCode::SetTypeMismatch,
                        format!(
                            "rule '{}' sets '{}' ({}) to a {} expression",
                            rule.id,
                            target,
                            target_type.name(),
                            expr_type.name()
                        ),
                    )
                    .with_field(target)
                    .with_rule(&rule.id);
                    ctx.report.push(issue);
                }
            }
        }
    }
    ctx.rule_id = None;

    if let Some(state_model) = &doc.state_model {
        for derived in state_model.derived.values() {
            ctx.infer(&derived.eval);
        }
    }
}

struct Context<'a> {
    fields: &'a BTreeMap<&'a str, InferredType>,
    report: &'a mut AnalysisReport,
    rule_id: Option<&'a str>,
}

impl<'a> Context<'a> {
    /// Infer the result type of an expression, reporting arithmetic and
    /// comparison misuse along the way.
    fn infer(&mut self, expr: &Value) -> InferredType {
        match expr {
            Value::Object(map) if map.len() == 1 => {
                let (op, args) = map.iter().next().expect("single-key map");
                self.infer_operator(op, args)
            }
            Value::Object(_) => InferredType::Object,
            Value::Array(_) => InferredType::Array,
            Value::String(_) => InferredType::String,
            Value::Number(_) => InferredType::Number,
            Value::Bool(_) => InferredType::Boolean,
            Value::Null => InferredType::Unknown,
        }
    }

    fn infer_operator(&mut self, op: &str, args: &Value) -> InferredType {
        match op {
            "and" | "or" | "not" | "!" | "==" | "!=" | "before" | "after" | "in" | "some"
            | "all" | "none" => {
                self.infer_args(args);
                InferredType::Boolean
            }

            "<" | "<=" | ">" | ">=" => {
                let types = self.infer_args(args);
                if let [left, right] = types[..] {
                    if left != InferredType::Unknown
                        && right != InferredType::Unknown
                        && left != right
                    {
                        let mut issue = Issue::warning(
                            IssueCode::ComparisonTypeMixed,
                            format!(
                                "comparison '{}' mixes {} and {}",
                                op,
                                left.name(),
                                right.name()
                            ),
                        );
                        if let Some(rule_id) = self.rule_id {
                            issue = issue.with_rule(rule_id);
                        }
                        self.report.push(issue);
                    }
                }
                InferredType::Boolean
            }

            "+" | "-" | "*" | "/" => {
                let types = self.infer_args(args);
                for t in types {
                    if t != InferredType::Number && t != InferredType::Unknown {
                        let mut issue = Issue::error(
                            IssueCode::ArithmeticTypeError,
                            format!("arithmetic operator '{}' applied to a {} operand", op, t.name()),
                        );
                        if let Some(rule_id) = self.rule_id {
                            issue = issue.with_rule(rule_id);
                        }
                        self.report.push(issue);
                    }
                }
                InferredType::Number
            }

            "if" => {
                let Value::Array(items) = args else {
                    return InferredType::Unknown;
                };
                // Branch types: the first then-branch decides the result.
                let result = match items.get(1) {
                    Some(branch) => self.infer(branch),
                    None => InferredType::Unknown,
                };
                for (i, item) in items.iter().enumerate() {
                    if i != 1 {
                        self.infer(item);
                    }
                }
                result
            }

            "var" => match args {
                Value::String(path) => {
                    let root = path.split('.').next().unwrap_or("");
                    if root.is_empty() || path.contains('.') {
                        // Iteration element or nested access: unknown.
                        InferredType::Unknown
                    } else {
                        self.fields
                            .get(root)
                            .copied()
                            .unwrap_or(InferredType::Unknown)
                    }
                }
                _ => InferredType::Unknown,
            },

            _ => {
                self.infer_args(args);
                InferredType::Unknown
            }
        }
    }

    /// Infer each argument of an operator application.
    fn infer_args(&mut self, args: &Value) -> Vec<InferredType> {
        match args {
            Value::Array(items) => items.iter().map(|item| self.infer(item)).collect(),
            single => vec![self.infer(single)],
        }
    }
}
