//! Validation-error taxonomy and document status.
//!
//! Six error kinds, each with a fixed influence on status: type errors
//! invalidate, missing requirements mark incomplete, constraint
//! violations invalidate, and the two runtime kinds never touch status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Value's runtime shape disagrees with the declared type.
    TypeMismatch,
    /// Required field absent, null, or empty string.
    MissingRequired,
    /// min/max/length/pattern/option failure, or a rule-emitted error.
    ConstraintViolation,
    /// Required signature missing or lacking evidence.
    AttestationIncomplete,
    /// Undefined variable or unknown operator; never affects status.
    RuntimeWarning,
    /// Derived or rule-write cycle; never affects status.
    CycleDetected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::TypeMismatch => "type_mismatch",
            ErrorKind::MissingRequired => "missing_required",
            ErrorKind::ConstraintViolation => "constraint_violation",
            ErrorKind::AttestationIncomplete => "attestation_incomplete",
            ErrorKind::RuntimeWarning => "runtime_warning",
            ErrorKind::CycleDetected => "cycle_detected",
        };
        write!(f, "{}", s)
    }
}

/// A validation failure tied to a field and, when rule-emitted, a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rule_id: String,
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub law_ref: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field_id.is_empty() {
            write!(f, "[{}] {}", self.kind, self.message)
        } else {
            write!(f, "[{}] {}: {}", self.kind, self.field_id, self.message)
        }
    }
}

/// Overall document status derived from accumulated error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocStatus {
    #[serde(rename = "READY")]
    Ready,
    #[serde(rename = "INCOMPLETE")]
    Incomplete,
    #[serde(rename = "INVALID")]
    Invalid,
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocStatus::Ready => "READY",
            DocStatus::Incomplete => "INCOMPLETE",
            DocStatus::Invalid => "INVALID",
        };
        write!(f, "{}", s)
    }
}
