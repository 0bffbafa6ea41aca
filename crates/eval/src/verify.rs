//! Replay verification: prove a completed document is derivable from a
//! base document by a legitimate user journey.
//!
//! The verifier copies user-editable values from the completed document
//! into the base, evaluates, and repeats until the set of visible field
//! names stops changing. Sets, not counts: a simultaneous hide/reveal
//! must not look like a fixed point. After convergence the final state
//! is compared field by field, collecting every issue.

use chrono::Utc;
use edict_core::value::{parse_date_str, values_equal};
use edict_core::{DocStatus, Document};
use serde::Serialize;
use serde_json::Value;

/// Machine-readable verification issue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyCode {
    /// A field in the completed document does not exist after replay.
    UnknownField,
    /// A readonly value differs from what the replay computed.
    ComputedMismatch,
    AttestationUnsigned,
    AttestationNoEvidence,
    AttestationNoTimestamp,
    StatusMismatch,
    /// The visible-field set never stabilized within the iteration cap.
    ConvergenceFailed,
    InternalError,
}

/// A single verification finding.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyIssue {
    pub code: VerifyCode,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub field_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub expected: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub claimed: Value,
}

impl VerifyIssue {
    fn new(code: VerifyCode, field_id: &str, message: String) -> VerifyIssue {
        VerifyIssue {
            code,
            field_id: field_id.to_string(),
            message,
            expected: Value::Null,
            claimed: Value::Null,
        }
    }
}

/// Outcome of a replay verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DocStatus>,
    pub issues: Vec<VerifyIssue>,
    /// The converged document, when replay completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    /// Message of the internal failure, when one occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyReport {
    pub(crate) fn internal_error(message: String) -> VerifyReport {
        VerifyReport {
            valid: false,
            status: None,
            issues: vec![VerifyIssue::new(
                VerifyCode::InternalError,
                "",
                message.clone(),
            )],
            document: None,
            error: Some(message),
        }
    }
}

/// Fixed-point replay of `completed` over `base`.
pub(crate) fn replay(completed: &Document, base: &Document, max_iterations: usize) -> VerifyReport {
    let instant = if completed.valid_from.is_empty() {
        Utc::now().naive_utc()
    } else {
        parse_date_str(&completed.valid_from).unwrap_or_else(|| Utc::now().naive_utc())
    };

    let mut current = base.clone();
    let mut previous_visible = String::new();

    for iteration in 0..max_iterations {
        // Copy the user's inputs: values of fields that are currently
        // visible and editable.
        let editable: Vec<String> = current
            .definitions
            .iter()
            .filter(|(_, def)| def.is_visible() && !def.readonly)
            .map(|(id, _)| id.clone())
            .collect();
        for id in editable {
            if let Some(new_def) = completed.definitions.get(&id) {
                if let Some(current_def) = current.definitions.get_mut(&id) {
                    current_def.value = new_def.value.clone();
                }
            }
        }

        // Copy attestation state for attestations both documents know.
        for (id, current_att) in current.attestations.iter_mut() {
            if let Some(new_att) = completed.attestations.get(id) {
                current_att.signed = new_att.signed;
                current_att.evidence = new_att.evidence.clone();
            }
        }

        let result = match crate::evaluate(&current, instant) {
            Ok(doc) => doc,
            Err(e) => {
                return VerifyReport::internal_error(format!(
                    "evaluation failed at iteration {}: {}",
                    iteration, e
                ));
            }
        };

        let visible = visible_field_set(&result);
        if visible == previous_visible {
            return validate_final_state(completed, result);
        }
        previous_visible = visible;
        current = result;
    }

    VerifyReport {
        valid: false,
        status: None,
        issues: vec![VerifyIssue::new(
            VerifyCode::ConvergenceFailed,
            "",
            format!("document did not converge after {} iterations", max_iterations),
        )],
        document: None,
        error: None,
    }
}

/// Canonical form of the visible-field set: sorted names joined with
/// commas.
fn visible_field_set(doc: &Document) -> String {
    let mut ids: Vec<&str> = doc
        .definitions
        .iter()
        .filter(|(_, def)| def.is_visible())
        .map(|(id, _)| id.as_str())
        .collect();
    ids.sort_unstable();
    ids.join(",")
}

/// Compare the converged replay against the submitted document,
/// collecting every issue rather than stopping at the first.
fn validate_final_state(completed: &Document, converged: Document) -> VerifyReport {
    let mut issues = Vec::new();

    // Injected fields: present in the submission, absent after replay.
    for id in completed.definitions.keys() {
        if !converged.definitions.contains_key(id) {
            issues.push(VerifyIssue::new(
                VerifyCode::UnknownField,
                id,
                format!("field '{}' does not exist in the document", id),
            ));
        }
    }

    // Computed values: every readonly field must match what replay
    // derived.
    for (id, converged_def) in &converged.definitions {
        if !converged_def.readonly {
            continue;
        }
        match completed.definitions.get(id) {
            None => {
                issues.push(VerifyIssue {
                    code: VerifyCode::ComputedMismatch,
                    field_id: id.clone(),
                    message: format!(
                        "computed field '{}' is missing from the submitted document",
                        id
                    ),
                    expected: converged_def.value.clone(),
                    claimed: Value::Null,
                });
            }
            Some(new_def) => {
                if !values_equal(&new_def.value, &converged_def.value) {
                    issues.push(VerifyIssue {
                        code: VerifyCode::ComputedMismatch,
                        field_id: id.clone(),
                        message: format!("computed field '{}' was modified", id),
                        expected: converged_def.value.clone(),
                        claimed: new_def.value.clone(),
                    });
                }
            }
        }
    }

    // Required attestations must be signed with complete evidence.
    for (id, converged_att) in &converged.attestations {
        if !converged_att.required {
            continue;
        }
        let Some(new_att) = completed.attestations.get(id) else {
            continue;
        };

        if !new_att.signed {
            issues.push(VerifyIssue::new(
                VerifyCode::AttestationUnsigned,
                id,
                format!("required attestation '{}' has not been signed", id),
            ));
            continue;
        }

        let audit_id = new_att
            .evidence
            .as_ref()
            .map(|ev| ev.provider_audit_id.as_str())
            .unwrap_or("");
        if audit_id.is_empty() {
            issues.push(VerifyIssue::new(
                VerifyCode::AttestationNoEvidence,
                id,
                format!("attestation '{}' is signed but missing proof of signing", id),
            ));
        }

        let timestamp = new_att
            .evidence
            .as_ref()
            .map(|ev| ev.timestamp.as_str())
            .unwrap_or("");
        if timestamp.is_empty() {
            issues.push(VerifyIssue::new(
                VerifyCode::AttestationNoTimestamp,
                id,
                format!("attestation '{}' is signed but missing a timestamp", id),
            ));
        }
    }

    if completed.status != converged.status {
        issues.push(VerifyIssue {
            code: VerifyCode::StatusMismatch,
            field_id: String::new(),
            message: "the document status does not match what was computed".to_string(),
            expected: converged
                .status
                .map(|s| Value::String(s.to_string()))
                .unwrap_or(Value::Null),
            claimed: completed
                .status
                .map(|s| Value::String(s.to_string()))
                .unwrap_or(Value::Null),
        });
    }

    VerifyReport {
        valid: issues.is_empty(),
        status: converged.status,
        issues,
        document: Some(converged),
        error: None,
    }
}
