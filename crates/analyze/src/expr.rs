//! Expression-tree walking shared by the reference and type checks.
//!
//! The walker mirrors the runtime grammar: an object with exactly one
//! key is an operator application, any other object is a literal (and is
//! not descended into), arrays are element-wise sub-expressions.

use serde_json::Value;

/// Every operator the runtime dispatches.
pub(crate) const KNOWN_OPERATORS: &[&str] = &[
    "var", "==", "!=", "<", "<=", ">", ">=", "and", "or", "not", "!", "if", "+", "-", "*", "/",
    "before", "after", "in", "some", "all", "none",
];

pub(crate) fn is_known_operator(op: &str) -> bool {
    KNOWN_OPERATORS.contains(&op)
}

/// Visit every operator application in the tree, parents before
/// children.
pub(crate) fn walk_operators<'a>(expr: &'a Value, visit: &mut dyn FnMut(&'a str, &'a Value)) {
    match expr {
        Value::Object(map) if map.len() == 1 => {
            let (op, args) = map.iter().next().expect("single-key map");
            visit(op, args);
            walk_operators(args, visit);
        }
        Value::Object(_) => {}
        Value::Array(items) => {
            for item in items {
                walk_operators(item, visit);
            }
        }
        _ => {}
    }
}

/// Root segments of every `var` reference in the tree, in visit order.
/// The empty path (the iteration element) is skipped.
pub(crate) fn var_roots(expr: &Value) -> Vec<String> {
    let mut roots = Vec::new();
    walk_operators(expr, &mut |op, args| {
        if op == "var" {
            if let Value::String(path) = args {
                let root = path.split('.').next().unwrap_or("");
                if !root.is_empty() {
                    roots.push(root.to_string());
                }
            }
        }
    });
    roots
}
