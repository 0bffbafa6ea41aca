//! Evaluation pipeline: the engine state and the totally-ordered pass
//! structure (materialize, route, derive, fire rules, re-derive,
//! validate, status).

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use edict_core::value::{as_number, infer_type};
use edict_core::{Action, Definition, Document, ErrorKind, ValidationError};
use serde_json::Value;

/// Working state for a single evaluation. Owns the document clone; all
/// mutation during a call happens through these fields.
pub(crate) struct Engine {
    pub(crate) doc: Document,
    pub(crate) errors: Vec<ValidationError>,
    /// Which rule last wrote each field; a second writer records a
    /// `cycle_detected` warning.
    pub(crate) fields_set: BTreeMap<String, String>,
    /// Current element for collection operators; `{"var": ""}` resolves
    /// to this. Null means no iteration is in progress.
    pub(crate) current_element: Value,
    /// Derived names on the active resolution stack (cycle guard).
    pub(crate) derived_in_progress: BTreeSet<String>,
}

/// Run the full evaluation pipeline over an owned working document.
pub(crate) fn run_pipeline(mut doc: Document, instant: NaiveDateTime) -> Document {
    for def in doc.definitions.values_mut() {
        if def.visible.is_none() {
            def.visible = Some(true);
        }
    }

    let mut engine = Engine::new(doc);

    if !engine.doc.temporal_map.is_empty() {
        engine.validate_temporal_map();
        if let Some(version) = engine.select_branch(instant) {
            engine.prune(&version);
        }
    }

    // Derived pass 1: rules may read computed values.
    engine.compute_derived();
    engine.evaluate_logic_tree();
    // Derived pass 2: recompute over whatever the rules changed.
    engine.compute_derived();

    engine.validate_definitions();
    engine.check_attestations();

    engine.finish()
}

impl Engine {
    pub(crate) fn new(doc: Document) -> Engine {
        Engine {
            doc,
            errors: Vec::new(),
            fields_set: BTreeMap::new(),
            current_element: Value::Null,
            derived_in_progress: BTreeSet::new(),
        }
    }

    /// Append a validation error.
    pub(crate) fn add_error(
        &mut self,
        field_id: &str,
        rule_id: &str,
        kind: ErrorKind,
        message: String,
        law_ref: &str,
    ) {
        self.errors.push(ValidationError {
            field_id: field_id.to_string(),
            rule_id: rule_id.to_string(),
            kind,
            message,
            law_ref: law_ref.to_string(),
        });
    }

    /// Fire every non-disabled rule in declaration order.
    pub(crate) fn evaluate_logic_tree(&mut self) {
        let rules = self.doc.logic_tree.clone();
        for rule in &rules {
            if rule.disabled {
                continue;
            }
            let condition = self.resolve(&rule.when);
            if edict_core::value::truthy(&condition) {
                if let Some(action) = &rule.then {
                    self.apply_action(action, &rule.id, &rule.law_ref);
                }
            }
        }
    }

    /// Execute an action: value assignments, UI mutations, error emission.
    pub(crate) fn apply_action(&mut self, action: &Action, rule_id: &str, law_ref: &str) {
        for (key, expr) in &action.set {
            let resolved = self.resolve(expr);
            self.set_definition_value(key, resolved, rule_id);
        }

        for (key, mods) in &action.ui_modify {
            self.apply_ui_modify(key, mods);
        }

        if !action.error_msg.is_empty() {
            let kind = action.error_kind.unwrap_or(ErrorKind::ConstraintViolation);
            self.add_error("", rule_id, kind, action.error_msg.clone(), law_ref);
        }
    }

    /// Assign a value to a definition, creating it when absent. Tracks
    /// the writing rule so competing writers surface as a cycle warning.
    fn set_definition_value(&mut self, key: &str, value: Value, rule_id: &str) {
        if let Some(prev_rule) = self.fields_set.get(key) {
            if prev_rule != rule_id {
                let message = format!(
                    "potential cycle: field '{}' set by rule '{}' and again by rule '{}'",
                    key, prev_rule, rule_id
                );
                self.add_error(key, rule_id, ErrorKind::CycleDetected, message, "");
            }
        }
        self.fields_set.insert(key.to_string(), rule_id.to_string());

        match self.doc.definitions.get_mut(key) {
            Some(def) => {
                def.value = value;
            }
            None => {
                self.doc.definitions.insert(
                    key.to_string(),
                    Definition {
                        field_type: infer_type(&value).to_string(),
                        value,
                        visible: Some(true),
                        ..Definition::default()
                    },
                );
            }
        }
    }

    /// Overwrite UI/constraint attributes on an existing definition.
    /// Unknown attributes are ignored; a missing target ignores the
    /// whole modification.
    fn apply_ui_modify(&mut self, key: &str, mods: &Value) {
        let Some(def) = self.doc.definitions.get_mut(key) else {
            return;
        };
        let Value::Object(mods) = mods else {
            return;
        };

        if let Some(Value::Bool(visible)) = mods.get("visible") {
            def.visible = Some(*visible);
        }
        if let Some(Value::Bool(required)) = mods.get("required") {
            def.required = *required;
        }
        if let Some(Value::String(ui_class)) = mods.get("ui_class") {
            def.ui_class = ui_class.clone();
        }
        if let Some(Value::String(ui_message)) = mods.get("ui_message") {
            def.ui_message = ui_message.clone();
        }

        if let Some(min) = mods.get("min").and_then(as_number) {
            def.min = Some(min);
        }
        if let Some(max) = mods.get("max").and_then(as_number) {
            def.max = Some(max);
        }
        if let Some(step) = mods.get("step").and_then(as_number) {
            def.step = Some(step);
        }

        if let Some(min_length) = mods.get("min_length").and_then(as_number) {
            def.min_length = Some(min_length as usize);
        }
        if let Some(max_length) = mods.get("max_length").and_then(as_number) {
            def.max_length = Some(max_length as usize);
        }
        if let Some(Value::String(pattern)) = mods.get("pattern") {
            def.pattern = pattern.clone();
        }
    }

    /// Evaluate every derived expression in insertion order and write the
    /// results into definitions as readonly fields.
    pub(crate) fn compute_derived(&mut self) {
        let derived: Vec<(String, Value)> = match &self.doc.state_model {
            Some(sm) => sm
                .derived
                .iter()
                .filter(|(_, d)| !d.eval.is_null())
                .map(|(name, d)| (name.clone(), d.eval.clone()))
                .collect(),
            None => return,
        };

        for (name, eval) in derived {
            let value = self.resolve(&eval);

            match self.doc.definitions.get_mut(&name) {
                Some(existing) => {
                    existing.value = value;
                    existing.readonly = true;
                    if existing.visible.is_none() {
                        existing.visible = Some(true);
                    }
                }
                None => {
                    self.doc.definitions.insert(
                        name,
                        Definition {
                            field_type: infer_type(&value).to_string(),
                            value,
                            readonly: true,
                            visible: Some(true),
                            ..Definition::default()
                        },
                    );
                }
            }
        }
    }

    /// Attach accumulated errors and the derived status, consuming the
    /// engine.
    pub(crate) fn finish(mut self) -> Document {
        let status = self.determine_status();
        self.doc.errors = self.errors;
        self.doc.status = Some(status);
        self.doc
    }
}
