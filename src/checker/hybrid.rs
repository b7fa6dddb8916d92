//! Dispatches `needs_update` to local, remote, or
//! "local-then-fallback-to-remote" depending on the configured strategy.

use std::path::Path;

use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::config::{CheckOptions, CheckStrategy};
use crate::fetch::BoxFuture;
use crate::model::{Dependent, Target};

use super::local::LocalChecker;
use super::remote::RemoteChecker;
use super::{CheckOutcome, DependencyChecker};

/// Detects the effective strategy:
/// - an explicitly configured non-`Auto` strategy always wins;
/// - otherwise `Local` when `workspace` is a readable directory, else `Remote`.
pub fn detect_check_strategy(workspace: Option<&Path>, options: &CheckOptions) -> CheckStrategy {
    if !matches!(options.strategy, CheckStrategy::Auto) {
        return options.strategy;
    }
    match workspace {
        Some(path) if path.is_dir() => CheckStrategy::Local,
        _ => CheckStrategy::Remote,
    }
}

/// Dispatches to `local`/`remote` per a configured or auto-detected
/// strategy. `Auto` tries `local` first and falls back to `remote` on any
/// error — `remote` is already fail-open internally, so the fallback never
/// itself fails open a second time.
pub struct HybridChecker {
    local: LocalChecker,
    remote: RemoteChecker,
    strategy: CheckStrategy,
    workspace: Option<std::path::PathBuf>,
}

impl HybridChecker {
    pub fn new(
        local: LocalChecker,
        remote: RemoteChecker,
        strategy: CheckStrategy,
        workspace: Option<std::path::PathBuf>,
    ) -> Self {
        Self {
            local,
            remote,
            strategy,
            workspace,
        }
    }

    async fn check(
        &self,
        cancel: CancellationToken,
        dependent: &Dependent,
        target: &Target,
    ) -> CheckOutcome {
        match self.strategy {
            CheckStrategy::Local => {
                self.local
                    .needs_update(cancel, dependent, target, self.workspace.as_deref())
                    .await
            }
            CheckStrategy::Remote => {
                self.remote.needs_update(cancel, dependent, target, None).await
            }
            CheckStrategy::Auto => {
                let local_outcome = self
                    .local
                    .needs_update(cancel.clone(), dependent, target, self.workspace.as_deref())
                    .await;
                match local_outcome.error {
                    None => {
                        debug!(repo = %dependent.repo, "auto strategy resolved locally");
                        local_outcome
                    }
                    Some(err) => {
                        warn!(repo = %dependent.repo, error = %err, "local check failed, falling back to remote");
                        self.remote.needs_update(cancel, dependent, target, None).await
                    }
                }
            }
        }
    }
}

impl DependencyChecker for HybridChecker {
    fn needs_update<'a>(
        &'a self,
        cancel: CancellationToken,
        dependent: &'a Dependent,
        target: &'a Target,
        _workspace: Option<&'a Path>,
    ) -> BoxFuture<'a, CheckOutcome> {
        Box::pin(async move { self.check(cancel, dependent, target).await })
    }
}
