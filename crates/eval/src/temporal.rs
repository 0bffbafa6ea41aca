//! Temporal routing: pick the branch in force at an instant and disable
//! rules tied to other logic versions.

use chrono::NaiveDateTime;
use edict_core::value::parse_date_str;
use edict_core::{ErrorKind, TemporalBranch};

use crate::engine::Engine;

/// Select the first branch whose range covers `instant`. Start is
/// inclusive; a missing end is open-ended, a present end is inclusive.
/// Branches without a parseable start never match.
pub(crate) fn select_branch(
    branches: &[TemporalBranch],
    instant: NaiveDateTime,
) -> Option<&TemporalBranch> {
    branches.iter().find(|branch| {
        let Some(start) = branch.start().and_then(parse_date_str) else {
            return false;
        };
        if instant < start {
            return false;
        }
        match branch.end().and_then(parse_date_str) {
            Some(end) => instant <= end,
            None => true,
        }
    })
}

impl Engine {
    /// Check the temporal map for configuration mistakes: zero-length
    /// ranges, ranges starting inside the previous branch's range, and
    /// branches with no logic version. All are recorded as warnings;
    /// routing proceeds regardless.
    pub(crate) fn validate_temporal_map(&mut self) {
        for i in 0..self.doc.temporal_map.len() {
            let branch = &self.doc.temporal_map[i];

            let mut messages: Vec<String> = Vec::new();

            if let (Some(start), Some(end)) = (branch.start(), branch.end()) {
                if start == end {
                    messages.push(format!(
                        "temporal branch {} has same start and end date '{}' (invalid range)",
                        i, start
                    ));
                }
            }

            if branch.logic_version.is_empty() {
                messages.push(format!("temporal branch {} has no logic_version", i));
            }

            if i > 0 {
                let prev = &self.doc.temporal_map[i - 1];
                // A missing or unparseable previous end is open-ended; a
                // missing current start reaches back indefinitely. Both
                // overlap by construction.
                let prev_end = prev.end().and_then(parse_date_str);
                let curr_start = branch.start().and_then(parse_date_str);
                let overlaps = match (curr_start, prev_end) {
                    (Some(start), Some(end)) => start <= end,
                    _ => true,
                };
                if overlaps {
                    messages.push(format!(
                        "temporal branch {} overlaps with branch {} (ranges must not overlap)",
                        i,
                        i - 1
                    ));
                }
            }

            for message in messages {
                self.add_error("", "", ErrorKind::RuntimeWarning, message, "");
            }
        }
    }

    /// The logic version in force at `instant`, if any branch matches.
    pub(crate) fn select_branch(&self, instant: NaiveDateTime) -> Option<String> {
        select_branch(&self.doc.temporal_map, instant).map(|b| b.logic_version.clone())
    }

    /// Disable every rule whose `logic_version` differs from the active
    /// one. Unversioned rules are always active.
    pub(crate) fn prune(&mut self, active_version: &str) {
        for rule in &mut self.doc.logic_tree {
            if rule.logic_version.is_empty() {
                continue;
            }
            if rule.logic_version != active_version {
                rule.disabled = true;
            }
        }
    }
}
