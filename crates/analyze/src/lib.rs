//! Static analyzer for edict documents -- structural, reference, type,
//! temporal, conflict, and cycle checks without executing anything.
//!
//! [`analyze`] runs every check in a fixed order and returns an ordered
//! issue list. A document is valid iff no error-severity issue was
//! found; warnings (undefined references, potential conflicts, mixed
//! comparisons) flag risks the evaluator tolerates at run time.

mod conflicts;
mod cycles;
mod expr;
mod references;
mod report;
mod structural;
mod temporal;
mod typecheck;

use std::panic::{self, AssertUnwindSafe};

use edict_core::Document;

pub use report::{AnalysisReport, Issue, IssueCode, Severity};

/// Run the full analysis suite over a document.
///
/// Check order is fixed: structural shape, references, types, temporal
/// map, write conflicts, derived cycles. Issue ordering is stable for a
/// given input. Panic-safe: an internal failure yields a single
/// `internal_error` issue instead of unwinding.
pub fn analyze(doc: &Document) -> AnalysisReport {
    match panic::catch_unwind(AssertUnwindSafe(|| analyze_inner(doc))) {
        Ok(report) => report,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            let mut report = AnalysisReport::new();
            report.push(Issue::error(
                IssueCode::InternalError,
                format!("internal panic: {}", message),
            ));
            report
        }
    }
}

fn analyze_inner(doc: &Document) -> AnalysisReport {
    let mut report = AnalysisReport::new();
    structural::check(doc, &mut report);
    references::check(doc, &mut report);
    typecheck::check(doc, &mut report);
    temporal::check(doc, &mut report);
    conflicts::check(doc, &mut report);
    cycles::check(doc, &mut report);
    report
}
