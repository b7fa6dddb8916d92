//! The planner orchestrator: the crate's single public entry point.
//!
//! `plan` runs the full pipeline — validate target, locate the target
//! module, filter → canary-select → sort, optionally consult a dependency
//! checker, expand defaults, render, assemble, validate, normalize — and
//! returns a `Plan` whose item order depends only on the (sorted) dependent
//! list, never on check-task completion order.

use std::path::Path;

use tracing::{info, instrument, warn};

use crate::cancel::CancellationToken;
use crate::checker::DependencyChecker;
use crate::defaults;
use crate::errors::{Error, Result};
use crate::model::{Dependent, ManifestLookup, Plan, Target, WorkItem};
use crate::pipeline;
use crate::template;
use crate::validate;

/// Runs the full planning pipeline for `target` against `manifest`.
///
/// `checker` is optional: its absence means "include every non-skipped
/// dependent". `workspace` enables local or hybrid-auto checking and is
/// forwarded to the checker verbatim; the planner itself never reads the
/// filesystem.
#[instrument(skip(manifest, checker), fields(module = %target.module, version = %target.version))]
pub async fn plan(
    cancel: CancellationToken,
    manifest: &dyn ManifestLookup,
    target: &Target,
    checker: Option<&dyn DependencyChecker>,
    workspace: Option<&Path>,
) -> Result<Plan> {
    validate_target(target)?;

    let module = manifest
        .find_module_by_path(&target.module)
        .ok_or_else(|| Error::TargetNotFound {
            module: target.module.clone(),
        })?;

    let filtered = pipeline::filter_skipped(&module.dependents);
    let canaries = pipeline::select_canaries(&filtered);
    let sorted = pipeline::sort_dependents(&canaries);

    let mut items = Vec::new();
    for dependent in &sorted {
        cancel.check()?;

        // A checker is consulted only when both it and a workspace are
        // configured — a bare `RemoteChecker` with no workspace is reached
        // only through `HybridChecker`/`ParallelDispatcher` wiring that the
        // embedder sets up itself, never directly by the orchestrator.
        if let (Some(checker), Some(workspace)) = (checker, workspace) {
            let outcome = checker
                .needs_update(cancel.clone(), dependent, target, Some(workspace))
                .await;
            if let Some(err) = outcome.error {
                warn!(repo = %dependent.repo, error = %err, "dependency check failed; failing open");
            } else if !outcome.needs_update {
                info!(repo = %dependent.repo, "already up to date; skipping");
                continue;
            }
        }

        let item = build_work_item(dependent, &module.defaults, target)
            .map_err(|cause| Error::PlanningError {
                target: target.clone(),
                cause: Box::new(cause),
            })?;
        items.push(item);
    }

    info!(item_count = items.len(), "plan complete");
    Ok(Plan {
        target: target.clone(),
        items,
    })
}

fn validate_target(target: &Target) -> Result<()> {
    if target.module.is_empty() {
        return Err(Error::InvalidTarget { field: "module" });
    }
    if target.version.is_empty() {
        return Err(Error::InvalidTarget { field: "version" });
    }
    Ok(())
}

fn build_work_item(
    dependent: &Dependent,
    defaults: &crate::model::Defaults,
    target: &Target,
) -> Result<WorkItem> {
    let (mut expanded, had_original_pr) = defaults::expand_defaults(dependent, defaults);

    if !had_original_pr {
        // Preserve "the dependent never set a PR template" as empty strings
        // rather than silently inheriting the manifest defaults. No
        // dependent-name special case here — this rule applies uniformly.
        expanded.pr.title_template.clear();
        expanded.pr.body_template.clear();
    }

    let branch_name = template::generate_branch_name(&target.module, &target.version);
    let commit_message = template::render_commit_message(&defaults.commit_template, target);

    let item = WorkItem {
        repo: expanded.repo,
        clone_url: None,
        module: expanded.module,
        module_path: expanded.module_path,
        source_module: target.module.clone(),
        source_version: target.version.clone(),
        branch: expanded.branch,
        branch_name,
        commit_message,
        tests: expanded.tests,
        extra_commands: expanded.extra_commands,
        labels: expanded.labels,
        pr: expanded.pr,
        notifications: expanded.notifications,
        env: expanded.env,
        timeout_secs: expanded.timeout_secs,
        canary: expanded.canary,
        skip: expanded.skip,
    };

    validate::validate(&item)?;
    Ok(validate::normalize(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{CheckOutcome, DependencyChecker};
    use crate::fetch::BoxFuture;
    use crate::model::{Defaults, Manifest, Module};
    use std::sync::{Arc, Mutex};

    fn dependent(repo: &str, skip: bool) -> Dependent {
        Dependent {
            repo: repo.to_string(),
            branch: "main".to_string(),
            module: "github.com/x/dependent".to_string(),
            skip,
            ..Default::default()
        }
    }

    fn manifest_with(dependents: Vec<Dependent>) -> Manifest {
        Manifest {
            modules: vec![Module {
                path: "github.com/x/a".to_string(),
                source_repo: "github.com/x/a".to_string(),
                dependents,
                defaults: Defaults::default(),
            }],
        }
    }

    fn target() -> Target {
        Target {
            module: "github.com/x/a".to_string(),
            version: "v1.2.3".to_string(),
        }
    }

    #[tokio::test]
    async fn s1_basic_plan_sorted_with_default_rendering() {
        let manifest = manifest_with(vec![dependent("b/z", false), dependent("b/a", false)]);
        let result = plan(CancellationToken::new(), &manifest, &target(), None, None)
            .await
            .unwrap();

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].repo, "b/a");
        assert_eq!(result.items[1].repo, "b/z");
        assert_eq!(result.items[0].branch_name, "auto/a-v1.2.3");
        assert_eq!(
            result.items[0].commit_message,
            "Update github.com/x/a to v1.2.3"
        );
    }

    #[tokio::test]
    async fn s2_skip_filter_drops_skipped_dependents() {
        let manifest = manifest_with(vec![dependent("b/z", false), dependent("b/a", true)]);
        let result = plan(CancellationToken::new(), &manifest, &target(), None, None)
            .await
            .unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].repo, "b/z");
    }

    #[tokio::test]
    async fn s3_missing_target_module_errors() {
        let manifest = manifest_with(vec![]);
        let missing = Target {
            module: "github.com/x/missing".to_string(),
            version: "v1.0.0".to_string(),
        };
        let err = plan(CancellationToken::new(), &manifest, &missing, None, None)
            .await
            .unwrap_err();
        assert!(crate::errors::is_target_not_found(&err));
    }

    #[tokio::test]
    async fn s4_empty_target_fields_are_invalid() {
        let manifest = manifest_with(vec![]);
        let empty_module = Target {
            module: String::new(),
            version: "v1".to_string(),
        };
        let err = plan(CancellationToken::new(), &manifest, &empty_module, None, None)
            .await
            .unwrap_err();
        assert!(crate::errors::is_invalid_target(&err));

        let empty_version = Target {
            module: "x".to_string(),
            version: String::new(),
        };
        let err = plan(CancellationToken::new(), &manifest, &empty_version, None, None)
            .await
            .unwrap_err();
        assert!(crate::errors::is_invalid_target(&err));
    }

    struct AlwaysUpToDate;
    impl DependencyChecker for AlwaysUpToDate {
        fn needs_update<'a>(
            &'a self,
            _cancel: CancellationToken,
            _dependent: &'a Dependent,
            _target: &'a Target,
            _workspace: Option<&'a Path>,
        ) -> BoxFuture<'a, CheckOutcome> {
            Box::pin(async move { CheckOutcome::ok(false) })
        }
    }

    #[tokio::test]
    async fn s5_checker_skipping_everything_yields_empty_not_absent_items() {
        crate::init_test_tracing();
        let manifest = manifest_with(vec![dependent("b/z", false), dependent("b/a", false)]);
        let checker = AlwaysUpToDate;
        let tmp = tempfile::TempDir::new().unwrap();
        let result = plan(
            CancellationToken::new(),
            &manifest,
            &target(),
            Some(&checker),
            Some(tmp.path()),
        )
        .await
        .unwrap();
        assert_eq!(result.items, Vec::new());
    }

    struct AlwaysErrors;
    impl DependencyChecker for AlwaysErrors {
        fn needs_update<'a>(
            &'a self,
            _cancel: CancellationToken,
            _dependent: &'a Dependent,
            _target: &'a Target,
            _workspace: Option<&'a Path>,
        ) -> BoxFuture<'a, CheckOutcome> {
            Box::pin(async move {
                CheckOutcome::fail_open(Error::NotImplemented("boom"))
            })
        }
    }

    #[tokio::test]
    async fn fail_open_includes_dependent_on_checker_error() {
        let manifest = manifest_with(vec![dependent("b/a", false)]);
        let checker = AlwaysErrors;
        let result = plan(
            CancellationToken::new(),
            &manifest,
            &target(),
            Some(&checker),
            None,
        )
        .await
        .unwrap();
        assert_eq!(result.items.len(), 1);
    }

    #[tokio::test]
    async fn determinism_two_calls_yield_equal_plans() {
        let manifest = manifest_with(vec![dependent("b/z", false), dependent("b/a", false)]);
        let first = plan(CancellationToken::new(), &manifest, &target(), None, None)
            .await
            .unwrap();
        let second = plan(CancellationToken::new(), &manifest, &target(), None, None)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn no_mutation_of_input_dependents() {
        let original = vec![dependent("b/z", false), dependent("b/a", false)];
        let manifest = manifest_with(original.clone());
        let _ = plan(CancellationToken::new(), &manifest, &target(), None, None).await;
        assert_eq!(manifest.modules[0].dependents, original);
    }

    #[tokio::test]
    async fn pr_templates_blanked_when_dependent_had_no_original_pr_block() {
        let manifest = Manifest {
            modules: vec![Module {
                path: "github.com/x/a".to_string(),
                source_repo: "github.com/x/a".to_string(),
                dependents: vec![dependent("b/a", false)],
                defaults: Defaults {
                    pr: crate::model::PrConfig {
                        title_template: "default title".to_string(),
                        body_template: "default body".to_string(),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            }],
        };
        let result = plan(CancellationToken::new(), &manifest, &target(), None, None)
            .await
            .unwrap();
        assert_eq!(result.items[0].pr.title_template, "");
        assert_eq!(result.items[0].pr.body_template, "");
    }

    #[tokio::test]
    async fn cancellation_aborts_planning_before_the_pipeline_runs() {
        let manifest = manifest_with(vec![dependent("b/a", false)]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = plan(cancel, &manifest, &target(), None, None).await.unwrap_err();
        assert!(matches!(err, Error::Canceled));
    }

    #[tokio::test]
    async fn checker_without_a_workspace_is_never_consulted() {
        let manifest = manifest_with(vec![dependent("b/a", false)]);
        let seen = Arc::new(Mutex::new(Vec::new()));

        struct Recording(Arc<Mutex<Vec<String>>>);
        impl DependencyChecker for Recording {
            fn needs_update<'a>(
                &'a self,
                _cancel: CancellationToken,
                dependent: &'a Dependent,
                _target: &'a Target,
                _workspace: Option<&'a Path>,
            ) -> BoxFuture<'a, CheckOutcome> {
                self.0.lock().unwrap().push(dependent.repo.clone());
                Box::pin(async move { CheckOutcome::ok(true) })
            }
        }

        let checker = Recording(seen.clone());
        let result = plan(
            CancellationToken::new(),
            &manifest,
            &target(),
            Some(&checker),
            None,
        )
        .await
        .unwrap();
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(result.items.len(), 1, "no workspace => no checker => included");
    }

    #[tokio::test]
    async fn checker_with_a_workspace_is_consulted() {
        let manifest = manifest_with(vec![dependent("b/a", false)]);
        let tmp = tempfile::TempDir::new().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        struct Recording(Arc<Mutex<Vec<String>>>);
        impl DependencyChecker for Recording {
            fn needs_update<'a>(
                &'a self,
                _cancel: CancellationToken,
                dependent: &'a Dependent,
                _target: &'a Target,
                _workspace: Option<&'a Path>,
            ) -> BoxFuture<'a, CheckOutcome> {
                self.0.lock().unwrap().push(dependent.repo.clone());
                Box::pin(async move { CheckOutcome::ok(true) })
            }
        }

        let checker = Recording(seen.clone());
        let _ = plan(
            CancellationToken::new(),
            &manifest,
            &target(),
            Some(&checker),
            Some(tmp.path()),
        )
        .await
        .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["b/a".to_string()]);
    }
}
