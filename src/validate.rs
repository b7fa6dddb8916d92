//! Work-item validation and normalization: required-field checks plus
//! empty-vs-absent canonicalization so serialized output is stable.

use crate::errors::{Error, Result};
use crate::model::WorkItem;

/// Fails if `repo`, `module`, `branch`, or `commit_message` is empty, or
/// `timeout_secs` would be negative — moot for `u64`, so this only guards
/// the string fields (the type system already rules out negative timeouts).
pub fn validate(item: &WorkItem) -> Result<()> {
    if item.repo.is_empty() {
        return Err(Error::InvalidTarget { field: "repo" });
    }
    if item.module.is_empty() {
        return Err(Error::InvalidTarget { field: "module" });
    }
    if item.branch.is_empty() {
        return Err(Error::InvalidTarget { field: "branch" });
    }
    if item.commit_message.is_empty() {
        return Err(Error::InvalidTarget {
            field: "commit_message",
        });
    }
    Ok(())
}

/// Canonicalizes a validated work item in place:
/// - `tests`/`extra_commands`/`labels` are already `Vec<String>` (never
///   "absent" in this representation) and are left as-is — this is the
///   Rust-native shape of "absent sequences become empty".
/// - `env` is left exactly as provided, absent-or-present.
/// - `pr.reviewers`/`pr.team_reviewers` collapse `Some(vec![])` to `None` so
///   an explicitly-empty list and an unset one serialize identically as
///   absent.
pub fn normalize(mut item: WorkItem) -> WorkItem {
    if item.pr.reviewers.as_ref().is_some_and(Vec::is_empty) {
        item.pr.reviewers = None;
    }
    if item.pr.team_reviewers.as_ref().is_some_and(Vec::is_empty) {
        item.pr.team_reviewers = None;
    }
    item
}
