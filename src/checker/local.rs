//! Locates a dependent's already-cloned working copy inside a workspace
//! directory and compares versions by reading its dependency-manifest file
//! straight off disk. No network I/O.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::cancel::CancellationToken;
use crate::errors::Error;
use crate::fetch::BoxFuture;
use crate::manifest;
use crate::model::{Dependent, Target};
use crate::version;

use super::{CheckOutcome, DependencyChecker};

/// Filename of the dependency-manifest file expected at a cloned
/// dependent's repository root.
const MANIFEST_FILE_NAME: &str = "go.mod";

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalChecker;

impl LocalChecker {
    pub fn new() -> Self {
        Self
    }

    /// The directory-candidate search order for `dependent.repo` under
    /// `workspace`: `workspace/<leaf>`, `workspace/<org>/<leaf>`,
    /// `workspace/<host>/<org>/<leaf>`, derived from the slash-split repo.
    fn candidate_dirs(workspace: &Path, repo: &str) -> Vec<PathBuf> {
        let segments: Vec<&str> = repo.split('/').filter(|s| !s.is_empty()).collect();
        let mut candidates = Vec::with_capacity(3);

        if let Some(leaf) = segments.last() {
            candidates.push(workspace.join(leaf));
        }
        if segments.len() >= 2 {
            let org = segments[segments.len() - 2];
            let leaf = segments[segments.len() - 1];
            candidates.push(workspace.join(org).join(leaf));
        }
        if segments.len() >= 3 {
            let host = segments[segments.len() - 3];
            let org = segments[segments.len() - 2];
            let leaf = segments[segments.len() - 1];
            candidates.push(workspace.join(host).join(org).join(leaf));
        }
        candidates
    }

    fn locate(workspace: &Path, repo: &str) -> Option<PathBuf> {
        Self::candidate_dirs(workspace, repo)
            .into_iter()
            .find(|dir| dir.is_dir())
    }

    async fn check(
        dependent: &Dependent,
        target: &Target,
        workspace: &Path,
    ) -> CheckOutcome {
        let Some(dir) = Self::locate(workspace, &dependent.repo) else {
            return CheckOutcome::ok(true);
        };

        let manifest_path = dir.join(MANIFEST_FILE_NAME);
        let raw = match tokio::fs::read_to_string(&manifest_path).await {
            Ok(raw) => raw,
            Err(io_err) => {
                let cause = Error::ManifestParse(format!(
                    "no dependency manifest at {}: {io_err}",
                    manifest_path.display()
                ));
                return hard_error(dependent, target, cause);
            }
        };

        let parsed = match manifest::parse_detailed(&raw) {
            Ok(parsed) => parsed,
            Err(cause) => return hard_error(dependent, target, cause),
        };

        if parsed.locally_replaced.contains(&target.module) {
            warn!(
                repo = %dependent.repo,
                module = %target.module,
                "dependency locally replaced with a filesystem path; manual review needed"
            );
            return CheckOutcome::ok(true);
        }

        let Some(current_version) = parsed.dependencies.get(&target.module) else {
            warn!(
                repo = %dependent.repo,
                module = %target.module,
                "target module not required by dependent's manifest"
            );
            return CheckOutcome::ok(false);
        };

        match version::compare_versions(current_version, &target.version) {
            Ok(needs_update) => CheckOutcome::ok(needs_update),
            Err(err) => CheckOutcome::fail_open(err),
        }
    }
}

fn hard_error(dependent: &Dependent, target: &Target, cause: Error) -> CheckOutcome {
    CheckOutcome {
        needs_update: true,
        error: Some(Error::DependencyCheckError {
            dependent_repo: dependent.repo.clone(),
            target: target.clone(),
            cause: Box::new(cause),
        }),
    }
}

impl DependencyChecker for LocalChecker {
    fn needs_update<'a>(
        &'a self,
        _cancel: CancellationToken,
        dependent: &'a Dependent,
        target: &'a Target,
        workspace: Option<&'a Path>,
    ) -> BoxFuture<'a, CheckOutcome> {
        Box::pin(async move {
            match workspace {
                Some(workspace) => Self::check(dependent, target, workspace).await,
                None => CheckOutcome::ok(true),
            }
        })
    }
}
