//! Definition and attestation validation, plus status determination.
//!
//! Validation accumulates; nothing here aborts the pipeline. Array
//! values skip scalar type checks: the declared type describes the
//! element type consumed by the collection operators.

use edict_core::value::{as_number, parse_date};
use edict_core::{Definition, DocStatus, ErrorKind};
use regex::Regex;
use serde_json::Value;

use crate::engine::Engine;

impl Engine {
    /// Check every definition for required presence, type shape, and
    /// declared constraints.
    pub(crate) fn validate_definitions(&mut self) {
        let ids: Vec<String> = self.doc.definitions.keys().cloned().collect();
        for id in ids {
            let def = self.doc.definitions[&id].clone();

            if def.required {
                let empty_string = matches!(def.field_type.as_str(), "string" | "select")
                    && matches!(&def.value, Value::String(s) if s.is_empty());
                if !def.has_value() || empty_string {
                    let message = format!("required field '{}' is missing", id);
                    self.add_error(&id, "", ErrorKind::MissingRequired, message, "");
                }
            }

            if def.has_value() {
                self.validate_type(&id, &def);
            }
        }
    }

    /// Type and constraint checks for a single definition with a value.
    fn validate_type(&mut self, id: &str, def: &Definition) {
        // Arrays feed the collection operators; the declared type is the
        // element type and scalar checks do not apply.
        if def.value.is_array() {
            return;
        }

        match def.field_type.as_str() {
            "string" => match &def.value {
                Value::String(s) => {
                    let s = s.clone();
                    self.validate_string_constraints(id, &s, def);
                }
                _ => {
                    let message = format!("field '{}' must be a string", id);
                    self.add_error(id, "", ErrorKind::TypeMismatch, message, "");
                }
            },

            "number" | "currency" => match as_number(&def.value) {
                Some(n) => self.validate_numeric_constraints(id, n, def),
                None => {
                    let message = format!("field '{}' must be a number", id);
                    self.add_error(id, "", ErrorKind::TypeMismatch, message, "");
                }
            },

            "boolean" => {
                if !def.value.is_boolean() {
                    let message = format!("field '{}' must be a boolean", id);
                    self.add_error(id, "", ErrorKind::TypeMismatch, message, "");
                }
            }

            "select" => match &def.value {
                Value::String(s) => {
                    if !is_valid_option(s, def.options.as_deref()) {
                        let message =
                            format!("field '{}' value '{}' is not a valid option", id, s);
                        self.add_error(id, "", ErrorKind::ConstraintViolation, message, "");
                    }
                }
                _ => {
                    let message = format!("field '{}' must be a string", id);
                    self.add_error(id, "", ErrorKind::TypeMismatch, message, "");
                }
            },

            "attestation" => {
                if !def.value.is_boolean() {
                    let message = format!("attestation '{}' must be a boolean", id);
                    self.add_error(id, "", ErrorKind::TypeMismatch, message, "");
                }
            }

            "date" => {
                if parse_date(&def.value).is_none() {
                    let message = format!("field '{}' must be a valid date", id);
                    self.add_error(id, "", ErrorKind::TypeMismatch, message, "");
                }
            }

            _ => {}
        }
    }

    fn validate_numeric_constraints(&mut self, id: &str, value: f64, def: &Definition) {
        if let Some(min) = def.min {
            if value < min {
                let message = format!(
                    "field '{}' value {} is below minimum {}",
                    id, value, min
                );
                self.add_error(id, "", ErrorKind::ConstraintViolation, message, "");
            }
        }
        if let Some(max) = def.max {
            if value > max {
                let message = format!(
                    "field '{}' value {} exceeds maximum {}",
                    id, value, max
                );
                self.add_error(id, "", ErrorKind::ConstraintViolation, message, "");
            }
        }
    }

    // Lengths are UTF-8 byte counts, not character counts.
    fn validate_string_constraints(&mut self, id: &str, value: &str, def: &Definition) {
        if let Some(min_length) = def.min_length {
            if value.len() < min_length {
                let message = format!(
                    "field '{}' is too short (minimum {} characters)",
                    id, min_length
                );
                self.add_error(id, "", ErrorKind::ConstraintViolation, message, "");
            }
        }
        if let Some(max_length) = def.max_length {
            if value.len() > max_length {
                let message = format!(
                    "field '{}' is too long (maximum {} characters)",
                    id, max_length
                );
                self.add_error(id, "", ErrorKind::ConstraintViolation, message, "");
            }
        }
        if !def.pattern.is_empty() {
            // An uncompilable pattern is the analyzer's problem, not a
            // document error; skip it here.
            if let Ok(re) = Regex::new(&def.pattern) {
                if !re.is_match(value) {
                    let message = format!("field '{}' does not match required pattern", id);
                    self.add_error(id, "", ErrorKind::ConstraintViolation, message, "");
                }
            }
        }
    }

    /// Attestation completeness: legacy attestation-typed definitions
    /// and rich attestations with evidence.
    pub(crate) fn check_attestations(&mut self) {
        let legacy: Vec<String> = self
            .doc
            .definitions
            .iter()
            .filter(|(_, def)| def.field_type == "attestation")
            .filter(|(_, def)| def.required && def.value != Value::Bool(true))
            .map(|(id, _)| id.clone())
            .collect();
        for id in legacy {
            let message = format!("required attestation '{}' not confirmed", id);
            self.add_error(&id, "", ErrorKind::AttestationIncomplete, message, "");
        }

        let attestations: Vec<(String, edict_core::Attestation)> = self
            .doc
            .attestations
            .iter()
            .map(|(id, att)| (id.clone(), att.clone()))
            .collect();

        for (id, att) in attestations {
            if att.signed {
                if let Some(on_sign) = &att.on_sign {
                    let rule_id = format!("attestation_{}", id);
                    self.apply_action(on_sign, &rule_id, &att.law_ref);
                }
            }

            if att.required {
                if !att.signed {
                    let message = format!("required attestation '{}' not signed", id);
                    self.add_error(&id, "", ErrorKind::AttestationIncomplete, message, &att.law_ref);
                } else {
                    let has_audit_id = att
                        .evidence
                        .as_ref()
                        .map(|ev| !ev.provider_audit_id.is_empty())
                        .unwrap_or(false);
                    if !has_audit_id {
                        let message =
                            format!("attestation '{}' signed but missing evidence", id);
                        self.add_error(
                            &id,
                            "",
                            ErrorKind::AttestationIncomplete,
                            message,
                            &att.law_ref,
                        );
                    }
                }
            }
        }
    }

    /// Derive the document status from accumulated error kinds. Type
    /// errors dominate, then incompleteness, then constraint violations;
    /// the runtime kinds never count.
    pub(crate) fn determine_status(&self) -> DocStatus {
        if self
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::TypeMismatch)
        {
            return DocStatus::Invalid;
        }
        if self.errors.iter().any(|e| {
            e.kind == ErrorKind::MissingRequired || e.kind == ErrorKind::AttestationIncomplete
        }) {
            return DocStatus::Incomplete;
        }
        if self
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::ConstraintViolation)
        {
            return DocStatus::Invalid;
        }
        DocStatus::Ready
    }
}

/// Absent options mean no restriction; an explicitly empty list rejects
/// every value.
fn is_valid_option(value: &str, options: Option<&[String]>) -> bool {
    match options {
        None => true,
        Some(opts) => opts.iter().any(|opt| opt == value),
    }
}
