//! Document model and value semantics for the edict rules VM.
//!
//! A document carries three colocated layers: typed field definitions
//! (data), ordered when-then rules (logic), and named pure expressions
//! (derived). This crate owns the canonical in-memory representation plus
//! the small value-semantics helpers (truthiness, numeric coercion,
//! equality, date parsing) that the evaluator and analyzer share.
//!
//! Expression trees stay as `serde_json::Value` -- the engine interprets
//! them at evaluation time, so forcing a typed parse here would only add
//! a lossy translation layer.

pub mod document;
pub mod error;
pub mod value;

pub use document::{
    Action, Attestation, Definition, DerivedDef, Document, Evidence, Rule, StateModel,
    TemporalBranch,
};
pub use error::{DocStatus, ErrorKind, ValidationError};
