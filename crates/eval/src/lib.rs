//! Evaluation engine for edict documents -- consumes a self-describing
//! document, produces the deterministically transformed document.
//!
//! Two entry points:
//! - [`evaluate`] runs the fixed pipeline (temporal routing, derived
//!   computation, rule firing, validation, status) exactly once over a
//!   working clone of the input.
//! - [`verify`] replays a user journey over a base document to prove a
//!   submitted completed document could have been produced legitimately.
//!
//! Both are panic-safe: internal failures surface as error results, never
//! as unwinds into the host.

mod engine;
mod operators;
mod resolver;
mod temporal;
mod validate;
mod verify;

use std::panic::{self, AssertUnwindSafe};

use chrono::NaiveDateTime;
use edict_core::Document;

pub use verify::{VerifyCode, VerifyIssue, VerifyReport};

/// Default iteration cap for [`verify`] replay.
pub const DEFAULT_VERIFY_ITERATIONS: usize = 100;

/// Failure at the public evaluation boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An unexpected internal failure was caught; the document was not
    /// evaluated. The message carries whatever the failure reported.
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Evaluate a document at an effective instant.
///
/// The input is deep-cloned; the returned document carries rule-driven
/// mutations, computed derived values, accumulated `errors`, and an
/// overall `status`. Validation failures accumulate in the result rather
/// than failing the call; `Err` is reserved for internal failures.
pub fn evaluate(doc: &Document, instant: NaiveDateTime) -> Result<Document, EngineError> {
    let working = doc.clone();
    match panic::catch_unwind(AssertUnwindSafe(|| engine::run_pipeline(working, instant))) {
        Ok(result) => Ok(result),
        Err(payload) => Err(EngineError::Internal {
            message: panic_message(payload),
        }),
    }
}

/// Replay a completed document against its base, with the default
/// iteration cap.
pub fn verify(completed: &Document, base: &Document) -> VerifyReport {
    verify_with_cap(completed, base, DEFAULT_VERIFY_ITERATIONS)
}

/// Replay a completed document against its base with an explicit
/// iteration cap. Never fails: internal failures become an
/// `internal_error` issue in the report.
pub fn verify_with_cap(completed: &Document, base: &Document, max_iterations: usize) -> VerifyReport {
    match panic::catch_unwind(AssertUnwindSafe(|| {
        verify::replay(completed, base, max_iterations)
    })) {
        Ok(report) => report,
        Err(payload) => VerifyReport::internal_error(format!(
            "internal panic: {}",
            panic_message(payload)
        )),
    }
}

/// The logic version the temporal router would select at `instant`, or
/// empty when no branch covers it. Hosts use this to label documents.
pub fn active_version(doc: &Document, instant: NaiveDateTime) -> String {
    temporal::select_branch(&doc.temporal_map, instant)
        .map(|b| b.logic_version.clone())
        .unwrap_or_default()
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ──────────────────────────────────────────────
// Integration tests
// ──────────────────────────────────────────────
