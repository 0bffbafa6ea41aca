//! Recursive expression resolution.
//!
//! An expression node is one of: an operator application (object with
//! exactly one key), a literal object (any other object), an array of
//! sub-expressions, or a scalar literal. Resolution is nil-safe all the
//! way down; failures degrade to null plus an accumulated warning.

use edict_core::ErrorKind;
use serde_json::Value;

use crate::engine::Engine;

impl Engine {
    /// Evaluate any expression node to a value.
    ///
    /// Depth is bounded by the document's own expression nesting (the
    /// resolver never re-enters a derived name thanks to the in-progress
    /// guard), so recursion here cannot run away on any input that
    /// parsed as JSON.
    pub(crate) fn resolve(&mut self, node: &Value) -> Value {
        match node {
            Value::Object(map) if map.len() == 1 => {
                let (op, args) = map.iter().next().expect("single-key map");
                self.execute_operator(op, args)
            }
            // Multi-key (or empty) objects are literal values.
            Value::Object(_) => node.clone(),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.resolve(item)).collect())
            }
            scalar => scalar.clone(),
        }
    }

    /// Dotted-path variable lookup.
    ///
    /// Empty path returns the current iteration element. The derived
    /// layer is consulted before definitions, and a derived expression
    /// is re-evaluated live on each lookup; re-entering a name already
    /// being resolved records a cycle and yields null. A missing root
    /// records a runtime warning unless a collection iteration is in
    /// progress (predicates probing element shape stay quiet).
    pub(crate) fn get_var(&mut self, path: &str) -> Value {
        if path.is_empty() {
            return self.current_element.clone();
        }

        let mut parts = path.split('.');
        let root = parts.next().expect("split yields at least one part");
        let rest: Vec<&str> = parts.collect();

        let derived_expr = self
            .doc
            .state_model
            .as_ref()
            .and_then(|sm| sm.derived.get(root))
            .map(|d| d.eval.clone());
        if let Some(expr) = derived_expr {
            if self.derived_in_progress.contains(root) {
                let message = format!(
                    "circular dependency detected in derived field '{}'",
                    root
                );
                self.add_error("", "", ErrorKind::CycleDetected, message, "");
                return Value::Null;
            }
            self.derived_in_progress.insert(root.to_string());
            let result = self.resolve(&expr);
            self.derived_in_progress.remove(root);
            if rest.is_empty() {
                return result;
            }
            return access_path(&result, &rest);
        }

        if let Some(def) = self.doc.definitions.get(root) {
            if rest.is_empty() {
                return def.value.clone();
            }
            let value = def.value.clone();
            return access_path(&value, &rest);
        }

        if self.current_element.is_null() {
            let message = format!("undefined variable '{}' in logic expression", root);
            self.add_error("", "", ErrorKind::RuntimeWarning, message, "");
        }
        Value::Null
    }

    /// Resolve an argument node into exactly `expected` values, padding
    /// with null. A non-array argument fills only the first slot.
    pub(crate) fn resolve_args(&mut self, args: &Value, expected: usize) -> Vec<Value> {
        match args {
            Value::Array(arr) => (0..expected)
                .map(|i| match arr.get(i) {
                    Some(item) => self.resolve(item),
                    None => Value::Null,
                })
                .collect(),
            single => {
                let mut out = vec![Value::Null; expected];
                if expected > 0 {
                    out[0] = self.resolve(single);
                }
                out
            }
        }
    }
}

/// Traverse nested objects with the remaining path segments; any missing
/// segment or non-object intermediate yields null.
fn access_path(value: &Value, parts: &[&str]) -> Value {
    let mut current = value;
    for part in parts {
        match current {
            Value::Object(map) => match map.get(*part) {
                Some(next) => current = next,
                None => return Value::Null,
            },
            _ => return Value::Null,
        }
    }
    current.clone()
}
