//! Typed structs for the document wire format.
//!
//! Field names match the JSON wire format exactly. Only `definitions` is
//! required; everything else is optional. Mappings that the engine
//! iterates (`definitions`, `attestations`, `state_model.derived`) use
//! `IndexMap` so that evaluation order and error ordering follow document
//! order deterministically.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocStatus, ErrorKind, ValidationError};

fn is_false(b: &bool) -> bool {
    !*b
}

/// Root container for a rules document.
///
/// `errors` and `status` are output fields populated by evaluation; they
/// round-trip so that an evaluated document can be fed back in (the
/// verifier relies on this).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// Effective date of the document, used by `verify` to pick the
    /// replay instant.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub valid_from: String,
    #[serde(default)]
    pub definitions: IndexMap<String, Definition>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attestations: IndexMap<String, Attestation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logic_tree: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub temporal_map: Vec<TemporalBranch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_model: Option<StateModel>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DocStatus>,
}

impl Document {
    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> Result<Document, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serialize with 2-space indentation (the CLI output form).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A typed named field with a value and constraints.
///
/// `value` is `Value::Null` when unset; null and absent are the same
/// state, distinct from the declared type's zero value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Definition {
    /// One of "string", "number", "boolean", "select", "date",
    /// "attestation", "currency".
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    /// Permitted values when `type = "select"`. Absent means
    /// unrestricted; an explicitly empty list permits nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// True marks the field as computed; the verifier treats readonly
    /// values as claims to re-derive, never as user input.
    #[serde(default, skip_serializing_if = "is_false")]
    pub readonly: bool,
    /// Defaults to true when unset; evaluation materializes the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ui_class: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ui_message: String,
}

impl Definition {
    /// Visibility with the default applied.
    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }

    /// Whether the field carries a value (null means unset).
    pub fn has_value(&self) -> bool {
        !self.value.is_null()
    }
}

/// A when-then rule over the expression language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub law_ref: String,
    /// Ties the rule to a temporal branch; empty means always active.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub logic_version: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub when: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<Action>,
    /// Set by the temporal router when the rule's version is not in force.
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

/// What a rule does when its condition holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Action {
    /// Field name -> expression to evaluate and assign.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub set: IndexMap<String, Value>,
    /// Field name -> UI/constraint attributes to overwrite.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub ui_modify: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_msg: String,
    /// Overrides the default `constraint_violation` tag of `error_msg`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

/// A dated interval paired with a logic-version label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemporalBranch {
    /// `[start, end?]` ISO dates; a null or missing end is open-ended.
    #[serde(default)]
    pub valid_range: Vec<Option<String>>,
    #[serde(default)]
    pub logic_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
}

impl TemporalBranch {
    pub fn start(&self) -> Option<&str> {
        self.valid_range.first().and_then(|s| s.as_deref())
    }

    pub fn end(&self) -> Option<&str> {
        self.valid_range.get(1).and_then(|s| s.as_deref())
    }
}

/// Inputs and derived (computed) expressions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateModel {
    /// Advisory: fields whose changes should trigger recomputation in
    /// host applications. The engine itself recomputes unconditionally.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    /// Insertion-ordered: derived fields evaluate in document order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub derived: IndexMap<String, DerivedDef>,
}

/// A computed field driven by a pure expression.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerivedDef {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub eval: Value,
}

/// A signed affirmation gating completion.
///
/// The engine validates that supplied evidence is present and shaped
/// correctly; it never verifies signatures cryptographically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attestation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub law_ref: String,
    #[serde(default)]
    pub statement: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub required_role: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default)]
    pub signed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,

    /// Executed as an Action when `signed` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_sign: Option<Action>,
}

/// Audit trail supplied by a signing provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider_audit_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signer_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub logic_version: String,
}
