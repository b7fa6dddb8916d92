//! Pluggable dependency-check capability. One operation (`needs_update`)
//! with four variants: local, remote, hybrid (strategy-dispatching), and
//! parallel (fan-out over many dependents). No inheritance hierarchy — each
//! variant composes or wraps the capability.
//!
//! `DependencyChecker` is one of the two trait-object boundaries this crate
//! calls for (the other is `fetch::GitFetchAdapter`); it returns a boxed
//! future rather than using an `async fn` in the trait so `dyn
//! DependencyChecker` stays usable.

pub mod hybrid;
pub mod local;
pub mod parallel;
pub mod remote;

use std::path::Path;

use crate::errors::Error;
use crate::fetch::BoxFuture;
use crate::cancel::CancellationToken;
use crate::model::{Dependent, Target};

/// The outcome of one `needs_update` call: even on error there may be a
/// meaningful `needs_update` value, but every caller in this crate only
/// consults it when `error` is `None` and otherwise fails open.
#[derive(Debug)]
pub struct CheckOutcome {
    pub needs_update: bool,
    pub error: Option<Error>,
}

impl CheckOutcome {
    pub fn ok(needs_update: bool) -> Self {
        Self {
            needs_update,
            error: None,
        }
    }

    pub fn fail_open(error: Error) -> Self {
        Self {
            needs_update: true,
            error: Some(error),
        }
    }
}

/// A capability that decides whether a dependent needs the target version
/// propagated to it.
pub trait DependencyChecker: Send + Sync {
    fn needs_update<'a>(
        &'a self,
        cancel: CancellationToken,
        dependent: &'a Dependent,
        target: &'a Target,
        workspace: Option<&'a Path>,
    ) -> BoxFuture<'a, CheckOutcome>;
}
