//! Filter / canary-select / sort: three pure functions over a list of
//! dependents. None of them mutate or alias their input — each returns a
//! fresh `Vec`.

use crate::model::Dependent;

/// Drops every dependent with `skip == true`.
pub fn filter_skipped(dependents: &[Dependent]) -> Vec<Dependent> {
    dependents
        .iter()
        .filter(|d| !d.skip)
        .cloned()
        .collect()
}

/// A pure pass-through today — a placeholder for future canary-selection
/// logic. Still returns a fresh `Vec` rather than aliasing `dependents`,
/// since callers downstream (e.g. `sort_dependents`) assume every pipeline
/// stage hands back an owned sequence.
pub fn select_canaries(dependents: &[Dependent]) -> Vec<Dependent> {
    dependents.to_vec()
}

/// Sorts by `repo` in ascending byte order. Stable, so dependents that
/// compare equal (identical `repo`) keep their relative input order.
pub fn sort_dependents(dependents: &[Dependent]) -> Vec<Dependent> {
    let mut sorted = dependents.to_vec();
    sorted.sort_by(|a, b| a.repo.as_bytes().cmp(b.repo.as_bytes()));
    sorted
}
