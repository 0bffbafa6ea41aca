//! Temporal-map sanity: zero-length and overlapping ranges.
//!
//! The evaluator reports the same conditions at run time; here they are
//! caught without executing anything.

use edict_core::value::parse_date_str;
use edict_core::Document;

use crate::report::{AnalysisReport, Issue, IssueCode};

pub(crate) fn check(doc: &Document, report: &mut AnalysisReport) {
    for (i, branch) in doc.temporal_map.iter().enumerate() {
        if let (Some(start), Some(end)) = (branch.start(), branch.end()) {
            if start == end {
                report.push(
                    Issue::warning(
                        IssueCode::ZeroLengthRange,
                        format!(
                            "temporal branch {} has the same start and end date '{}'",
                            i, start
                        ),
                    )
                    .with_path(format!("temporal_map[{}]", i)),
                );
            }
        }

        if i > 0 {
            let prev = &doc.temporal_map[i - 1];
            let prev_end = prev.end().and_then(parse_date_str);
            let curr_start = branch.start().and_then(parse_date_str);
            let overlaps = match (curr_start, prev_end) {
                (Some(start), Some(end)) => start <= end,
                // Open-ended previous branch or a start that reaches
                // back indefinitely overlaps by construction.
                _ => true,
            };
            if overlaps {
                report.push(
                    Issue::warning(
                        IssueCode::OverlappingRanges,
                        format!("temporal branch {} overlaps with branch {}", i, i - 1),
                    )
                    .with_path(format!("temporal_map[{}]", i)),
                );
            }
        }
    }
}
