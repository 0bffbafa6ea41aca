//! The operator table.
//!
//! A fixed set of nil-safe operators: comparison, logical, arithmetic,
//! date, collection, and variable access. Unknown operators degrade to
//! null with a runtime warning.

use chrono::NaiveDateTime;
use edict_core::value::{as_number, parse_date, truthy, values_equal};
use edict_core::ErrorKind;
use serde_json::Value;

use crate::engine::Engine;

fn number(x: f64) -> Value {
    // NaN and infinities have no JSON form; degrade to null.
    serde_json::Number::from_f64(x)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

impl Engine {
    /// Dispatch a single operator application.
    pub(crate) fn execute_operator(&mut self, op: &str, args: &Value) -> Value {
        match op {
            // ── Variable access ──
            "var" => match args {
                Value::String(path) => {
                    let path = path.clone();
                    self.get_var(&path)
                }
                _ => Value::Null,
            },

            // ── Comparison ──
            "==" => {
                let a = self.resolve_args(args, 2);
                Value::Bool(values_equal(&a[0], &a[1]))
            }
            "!=" => {
                let a = self.resolve_args(args, 2);
                Value::Bool(!values_equal(&a[0], &a[1]))
            }
            ">" => self.compare_numeric(args, |x, y| x > y),
            "<" => self.compare_numeric(args, |x, y| x < y),
            ">=" => self.compare_numeric(args, |x, y| x >= y),
            "<=" => self.compare_numeric(args, |x, y| x <= y),

            // ── Logical ──
            "and" => Value::Bool(self.op_and(args)),
            "or" => Value::Bool(self.op_or(args)),
            "not" | "!" => {
                let a = self.resolve_args(args, 1);
                Value::Bool(!truthy(&a[0]))
            }
            "if" => self.op_if(args),

            // ── Arithmetic ──
            "+" => self.numeric_binop(args, |x, y| Some(x + y)),
            "-" => self.numeric_binop(args, |x, y| Some(x - y)),
            "*" => self.numeric_binop(args, |x, y| Some(x * y)),
            "/" => self.numeric_binop(args, |x, y| if y == 0.0 { None } else { Some(x / y) }),

            // ── Dates ──
            "before" => self.compare_dates(args, |x, y| x < y),
            "after" => self.compare_dates(args, |x, y| x > y),

            // ── Collections ──
            "in" => {
                let a = self.resolve_args(args, 2);
                Value::Bool(op_in(&a[0], &a[1]))
            }
            "some" => Value::Bool(self.op_some(args)),
            "all" => Value::Bool(self.op_all(args)),
            "none" => Value::Bool(self.op_none(args)),

            unknown => {
                let message = format!("unknown operator '{}' in logic expression", unknown);
                self.add_error("", "", ErrorKind::RuntimeWarning, message, "");
                Value::Null
            }
        }
    }

    /// Numeric ordering; false when either operand is absent or
    /// non-numeric.
    fn compare_numeric(&mut self, args: &Value, cmp: fn(f64, f64) -> bool) -> Value {
        let a = self.resolve_args(args, 2);
        match (as_number(&a[0]), as_number(&a[1])) {
            (Some(x), Some(y)) => Value::Bool(cmp(x, y)),
            _ => Value::Bool(false),
        }
    }

    /// Binary arithmetic; null when either operand is absent,
    /// non-numeric, or the operation itself declines (zero divisor).
    fn numeric_binop(&mut self, args: &Value, f: fn(f64, f64) -> Option<f64>) -> Value {
        let a = self.resolve_args(args, 2);
        match (as_number(&a[0]), as_number(&a[1])) {
            (Some(x), Some(y)) => f(x, y).map(number).unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Date ordering; false when either operand fails to parse.
    fn compare_dates(
        &mut self,
        args: &Value,
        cmp: fn(NaiveDateTime, NaiveDateTime) -> bool,
    ) -> Value {
        let a = self.resolve_args(args, 2);
        match (parse_date(&a[0]), parse_date(&a[1])) {
            (Some(x), Some(y)) => Value::Bool(cmp(x, y)),
            _ => Value::Bool(false),
        }
    }

    /// n-ary AND over truthiness, short-circuiting on the first falsy
    /// argument. A non-array argument is its own truthiness.
    fn op_and(&mut self, args: &Value) -> bool {
        let Value::Array(items) = args else {
            let v = self.resolve(args);
            return truthy(&v);
        };
        for item in items {
            let v = self.resolve(item);
            if !truthy(&v) {
                return false;
            }
        }
        true
    }

    /// n-ary OR over truthiness, short-circuiting on the first truthy
    /// argument.
    fn op_or(&mut self, args: &Value) -> bool {
        let Value::Array(items) = args else {
            let v = self.resolve(args);
            return truthy(&v);
        };
        for item in items {
            let v = self.resolve(item);
            if truthy(&v) {
                return true;
            }
        }
        false
    }

    /// Chained conditional: pairs of (condition, branch) with an optional
    /// trailing else. The first truthy condition wins; no match and no
    /// else yields null.
    fn op_if(&mut self, args: &Value) -> Value {
        let Value::Array(items) = args else {
            return Value::Null;
        };
        if items.len() < 2 {
            return Value::Null;
        }

        let mut i = 0;
        while i + 1 < items.len() {
            let condition = self.resolve(&items[i]);
            if truthy(&condition) {
                return self.resolve(&items[i + 1]);
            }
            i += 2;
        }

        if items.len() % 2 == 1 {
            return self.resolve(&items[items.len() - 1]);
        }
        Value::Null
    }

    /// True when any element satisfies the predicate. Vacuously false on
    /// an empty or non-array collection.
    fn op_some(&mut self, args: &Value) -> bool {
        let Some((items, predicate)) = self.collection_args(args) else {
            return false;
        };
        if items.is_empty() {
            return false;
        }
        for item in items {
            if self.eval_with_element(&predicate, item) {
                return true;
            }
        }
        false
    }

    /// True when every element satisfies the predicate. Vacuously true on
    /// an empty collection, false on a non-array.
    fn op_all(&mut self, args: &Value) -> bool {
        let Some((items, predicate)) = self.collection_args(args) else {
            return false;
        };
        for item in items {
            if !self.eval_with_element(&predicate, item) {
                return false;
            }
        }
        true
    }

    /// True when no element satisfies the predicate. Vacuously true on an
    /// empty collection, false on a non-array.
    fn op_none(&mut self, args: &Value) -> bool {
        let Some((items, predicate)) = self.collection_args(args) else {
            return false;
        };
        for item in items {
            if self.eval_with_element(&predicate, item) {
                return false;
            }
        }
        true
    }

    /// Split collection-operator arguments into (resolved items,
    /// unresolved predicate). None when the shape is wrong or the first
    /// argument does not resolve to an array.
    fn collection_args(&mut self, args: &Value) -> Option<(Vec<Value>, Value)> {
        let Value::Array(parts) = args else {
            return None;
        };
        if parts.len() < 2 {
            return None;
        }
        let collection = self.resolve(&parts[0]);
        let Value::Array(items) = collection else {
            return None;
        };
        Some((items, parts[1].clone()))
    }

    /// Evaluate a predicate with `{"var": ""}` bound to `element`,
    /// restoring the previous element on the way out so nested
    /// collection operators compose.
    fn eval_with_element(&mut self, predicate: &Value, element: Value) -> bool {
        let previous = std::mem::replace(&mut self.current_element, element);
        let result = self.resolve(predicate);
        self.current_element = previous;
        truthy(&result)
    }
}

/// Membership: value equality against array elements, or substring when
/// the haystack is a string.
fn op_in(needle: &Value, haystack: &Value) -> bool {
    if needle.is_null() || haystack.is_null() {
        return false;
    }
    match haystack {
        Value::Array(items) => items.iter().any(|item| values_equal(needle, item)),
        Value::String(s) => match needle {
            Value::String(n) => s.contains(n.as_str()),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edict_core::Document;
    use serde_json::json;

    fn engine() -> Engine {
        let doc: Document = serde_json::from_value(json!({
            "definitions": {
                "n": {"type": "number", "value": 10},
                "s": {"type": "string", "value": "hello"},
                "items": {"type": "number", "value": [10, 60, 75]},
                "tags": {"type": "string", "value": ["a", "b"]},
                "start": {"type": "date", "value": "2024-01-01"},
                "end": {"type": "date", "value": "2024-12-31"}
            }
        }))
        .unwrap();
        Engine::new(doc)
    }

    fn eval(e: &mut Engine, expr: serde_json::Value) -> Value {
        e.resolve(&expr)
    }

    #[test]
    fn equality_coerces_numbers() {
        let mut e = engine();
        assert_eq!(eval(&mut e, json!({"==": [{"var": "n"}, 10]})), json!(true));
        assert_eq!(eval(&mut e, json!({"==": [{"var": "n"}, "10"]})), json!(true));
        assert_eq!(eval(&mut e, json!({"!=": [{"var": "n"}, 11]})), json!(true));
        assert_eq!(eval(&mut e, json!({"==": [null, null]})), json!(true));
        assert_eq!(eval(&mut e, json!({"==": [null, 0]})), json!(false));
    }

    #[test]
    fn ordering_is_false_on_non_numeric() {
        let mut e = engine();
        assert_eq!(eval(&mut e, json!({">": [{"var": "n"}, 5]})), json!(true));
        assert_eq!(eval(&mut e, json!({"<": [{"var": "n"}, 5]})), json!(false));
        assert_eq!(eval(&mut e, json!({">": [{"var": "s"}, 5]})), json!(false));
        assert_eq!(eval(&mut e, json!({"<=": [null, 5]})), json!(false));
    }

    #[test]
    fn logical_short_circuit() {
        let mut e = engine();
        assert_eq!(
            eval(&mut e, json!({"and": [true, {">": [{"var": "n"}, 5]}]})),
            json!(true)
        );
        assert_eq!(eval(&mut e, json!({"and": [false, true]})), json!(false));
        assert_eq!(eval(&mut e, json!({"or": [false, true]})), json!(true));
        // Short-circuit: the undefined variable is never resolved.
        assert_eq!(
            eval(&mut e, json!({"or": [true, {"var": "ghost"}]})),
            json!(true)
        );
        assert!(e.errors.is_empty());
        assert_eq!(eval(&mut e, json!({"not": [true]})), json!(false));
        assert_eq!(eval(&mut e, json!({"!": [0]})), json!(true));
    }

    #[test]
    fn if_chain_first_truthy_wins() {
        let mut e = engine();
        let expr = json!({"if": [
            {"<": [{"var": "n"}, 5]}, "small",
            {"<": [{"var": "n"}, 50]}, "medium",
            "large"
        ]});
        assert_eq!(eval(&mut e, expr), json!("medium"));

        assert_eq!(
            eval(&mut e, json!({"if": [false, "then"]})),
            Value::Null
        );
        assert_eq!(eval(&mut e, json!({"if": [true]})), Value::Null);
    }

    #[test]
    fn arithmetic_nil_safety() {
        let mut e = engine();
        assert_eq!(eval(&mut e, json!({"+": [{"var": "n"}, 5]})), json!(15.0));
        assert_eq!(eval(&mut e, json!({"-": [{"var": "n"}, 5]})), json!(5.0));
        assert_eq!(eval(&mut e, json!({"*": [{"var": "n"}, 2]})), json!(20.0));
        assert_eq!(eval(&mut e, json!({"/": [{"var": "n"}, 4]})), json!(2.5));
        assert_eq!(eval(&mut e, json!({"/": [{"var": "n"}, 0]})), Value::Null);
        assert_eq!(eval(&mut e, json!({"+": [{"var": "s"}, 1]})), Value::Null);
        assert_eq!(eval(&mut e, json!({"+": [null, 1]})), Value::Null);
    }

    #[test]
    fn date_comparisons() {
        let mut e = engine();
        assert_eq!(
            eval(&mut e, json!({"before": [{"var": "start"}, {"var": "end"}]})),
            json!(true)
        );
        assert_eq!(
            eval(&mut e, json!({"after": [{"var": "start"}, {"var": "end"}]})),
            json!(false)
        );
        assert_eq!(
            eval(&mut e, json!({"before": ["not a date", {"var": "end"}]})),
            json!(false)
        );
    }

    #[test]
    fn membership_array_and_substring() {
        let mut e = engine();
        assert_eq!(
            eval(&mut e, json!({"in": ["a", {"var": "tags"}]})),
            json!(true)
        );
        assert_eq!(
            eval(&mut e, json!({"in": ["c", {"var": "tags"}]})),
            json!(false)
        );
        assert_eq!(
            eval(&mut e, json!({"in": ["ell", {"var": "s"}]})),
            json!(true)
        );
        assert_eq!(eval(&mut e, json!({"in": [null, {"var": "tags"}]})), json!(false));
        assert_eq!(eval(&mut e, json!({"in": [1, {"var": "n"}]})), json!(false));
    }

    #[test]
    fn collection_quantifiers() {
        let mut e = engine();
        assert_eq!(
            eval(&mut e, json!({"some": [{"var": "items"}, {">": [{"var": ""}, 70]}]})),
            json!(true)
        );
        assert_eq!(
            eval(&mut e, json!({"all": [{"var": "items"}, {">=": [{"var": ""}, 10]}]})),
            json!(true)
        );
        assert_eq!(
            eval(&mut e, json!({"all": [{"var": "items"}, {">": [{"var": ""}, 10]}]})),
            json!(false)
        );
        assert_eq!(
            eval(&mut e, json!({"none": [{"var": "items"}, {">": [{"var": ""}, 100]}]})),
            json!(true)
        );
    }

    #[test]
    fn quantifier_vacuous_cases() {
        let doc: Document = serde_json::from_value(json!({
            "definitions": {"empty": {"type": "number", "value": []}}
        }))
        .unwrap();
        let mut e = Engine::new(doc);
        assert_eq!(
            eval(&mut e, json!({"some": [{"var": "empty"}, true]})),
            json!(false)
        );
        assert_eq!(
            eval(&mut e, json!({"all": [{"var": "empty"}, false]})),
            json!(true)
        );
        assert_eq!(
            eval(&mut e, json!({"none": [{"var": "empty"}, true]})),
            json!(true)
        );
        // Non-array collections fail closed.
        assert_eq!(eval(&mut e, json!({"some": [5, true]})), json!(false));
        assert_eq!(eval(&mut e, json!({"all": [5, true]})), json!(false));
    }

    #[test]
    fn nested_quantifiers_restore_element_context() {
        let doc: Document = serde_json::from_value(json!({
            "definitions": {
                "groups": {"type": "number", "value": [[1, 2], [3, 4]]}
            }
        }))
        .unwrap();
        let mut e = Engine::new(doc);
        // Some group has all elements >= 3.
        let expr = json!({"some": [
            {"var": "groups"},
            {"all": [{"var": ""}, {">=": [{"var": ""}, 3]}]}
        ]});
        assert_eq!(eval(&mut e, expr), json!(true));
    }

    #[test]
    fn unknown_operator_warns_and_yields_null() {
        let mut e = engine();
        assert_eq!(eval(&mut e, json!({"frobnicate": [1, 2]})), Value::Null);
        assert_eq!(e.errors.len(), 1);
        assert_eq!(e.errors[0].kind, ErrorKind::RuntimeWarning);
        assert!(e.errors[0].message.contains("frobnicate"));
    }

    #[test]
    fn var_with_non_string_argument_is_null() {
        let mut e = engine();
        assert_eq!(eval(&mut e, json!({"var": 42})), Value::Null);
        assert!(e.errors.is_empty());
    }
}
