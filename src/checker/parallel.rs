//! Wraps any `DependencyChecker` with a bounded-concurrency fan-out over many
//! dependents, using a `Semaphore` plus spawned tasks.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tracing::instrument;

use crate::cancel::CancellationToken;
use crate::fetch::BoxFuture;
use crate::model::{Dependent, Target};

use super::{CheckOutcome, DependencyChecker};

/// Wraps a `DependencyChecker`, adding a bounded-concurrency `check_many`
/// that fans a batch of independent checks out across worker tasks.
pub struct ParallelDispatcher {
    inner: Arc<dyn DependencyChecker>,
    parallel_checks: usize,
}

impl ParallelDispatcher {
    /// `parallel_checks <= 0` (represented here as `0`) defaults to the
    /// number of logical processors.
    pub fn new(inner: Arc<dyn DependencyChecker>, parallel_checks: usize) -> Self {
        let parallel_checks = if parallel_checks == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            parallel_checks
        };
        Self {
            inner,
            parallel_checks,
        }
    }

    /// Runs `needs_update` for every dependent concurrently, bounded by
    /// `parallel_checks` in-flight tasks at a time. Returns a map keyed by
    /// each dependent's `repo`. Never returns an error itself — per-repo
    /// failures live in the map's `CheckOutcome::error` field.
    #[instrument(skip(self, dependents, workspace), fields(total = dependents.len(), workers = self.parallel_checks))]
    pub async fn check_many(
        &self,
        cancel: CancellationToken,
        dependents: &[Dependent],
        target: &Target,
        workspace: Option<&Path>,
    ) -> HashMap<String, CheckOutcome> {
        let sem = Arc::new(Semaphore::new(self.parallel_checks.max(1)));
        let results = Arc::new(Mutex::new(HashMap::with_capacity(dependents.len())));
        let workspace = workspace.map(Path::to_path_buf);

        let mut handles = Vec::with_capacity(dependents.len());
        for dependent in dependents {
            let dependent = dependent.clone();
            let target = target.clone();
            let cancel = cancel.clone();
            let inner = self.inner.clone();
            let results = results.clone();
            let workspace = workspace.clone();
            let permit = sem.clone().acquire_owned().await.expect("semaphore closed");

            handles.push(tokio::spawn(async move {
                let outcome = if cancel.is_cancelled() {
                    CheckOutcome::fail_open(crate::errors::Error::Canceled)
                } else {
                    inner
                        .needs_update(cancel, &dependent, &target, workspace.as_deref())
                        .await
                };
                drop(permit);
                results.lock().expect("results lock poisoned").insert(dependent.repo, outcome);
            }));
        }

        for handle in handles {
            // A panicking task must not be silently lost; it simply has no
            // entry in the result map, which the caller can detect against
            // the input dependent list if it cares to.
            let _ = handle.await;
        }

        // Every spawned task has completed and dropped its clone of `results`
        // by now, so this `Arc` is uniquely held.
        Arc::try_unwrap(results)
            .unwrap_or_else(|_| panic!("a check_many task outlived its handle"))
            .into_inner()
            .expect("results lock poisoned")
    }
}

impl DependencyChecker for ParallelDispatcher {
    fn needs_update<'a>(
        &'a self,
        cancel: CancellationToken,
        dependent: &'a Dependent,
        target: &'a Target,
        workspace: Option<&'a Path>,
    ) -> BoxFuture<'a, CheckOutcome> {
        self.inner.needs_update(cancel, dependent, target, workspace)
    }
}
