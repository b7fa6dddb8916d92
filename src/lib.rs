//! Deterministic planning core for a cross-repository dependency-cascade
//! tool.
//!
//! Given a manifest describing a released module and the downstream
//! repositories that consume it, plus a target `(module, version)`, [`plan`]
//! produces an ordered, deterministic list of [`model::WorkItem`]s — the
//! update operations needed to propagate the release.
//!
//! This crate does not mutate remote state, resolve transitive dependency
//! graphs, choose which module to release, or guarantee a work item is
//! executable — only that it is well-formed and internally consistent.

pub mod cache;
pub mod cancel;
pub mod checker;
pub mod config;
pub mod defaults;
pub mod errors;
pub mod fetch;
pub mod manifest;
pub mod model;
pub mod pipeline;
pub mod planner;
pub mod template;
pub mod validate;
pub mod version;

pub use cancel::CancellationToken;
pub use checker::{CheckOutcome, DependencyChecker};
pub use config::{CheckOptions, CheckStrategy};
pub use errors::{Error, Result};
pub use model::{Dependent, Defaults, Manifest, ManifestLookup, Module, Plan, Target, WorkItem};
pub use planner::plan;

/// Installs a `tracing-subscriber` `fmt` layer filtered by `RUST_LOG` (falling
/// back to `debug`) for tests that want to see log output on failure. Safe to
/// call from multiple tests — only the first call wins.
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}
