//! Cache-first strategy over fetch + parse, fail-open on every recoverable
//! failure, with a `warm` pre-fetch and cache-stats logging.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheStats, TtlCache};
use crate::cancel::CancellationToken;
use crate::config::CheckOptions;
use crate::errors::Error;
use crate::fetch::{BoxFuture, GitFetchAdapter};
use crate::manifest;
use crate::model::{Dependent, Target};
use crate::version;

use super::{CheckOutcome, DependencyChecker};

const DEFAULT_BRANCH: &str = "main";

/// Cache-first dependency checker backed by a `GitFetchAdapter`. Owns its
/// `TtlCache` exclusively.
pub struct RemoteChecker {
    options: CheckOptions,
    adapter: Arc<dyn GitFetchAdapter>,
    cache: TtlCache,
}

impl RemoteChecker {
    pub fn new(options: CheckOptions, adapter: Arc<dyn GitFetchAdapter>) -> Self {
        Self {
            cache: TtlCache::new(options.cache_ttl),
            options,
            adapter,
        }
    }

    fn branch_ref(dependent: &Dependent) -> &str {
        if dependent.branch.is_empty() {
            DEFAULT_BRANCH
        } else {
            &dependent.branch
        }
    }

    #[instrument(skip(self, cancel, dependent), fields(repo = %dependent.repo, module = %target.module))]
    async fn check(&self, cancel: CancellationToken, dependent: &Dependent, target: &Target) -> CheckOutcome {
        let url = match self.adapter.parse_clone_url(dependent) {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "failed to derive clone url; failing open");
                return CheckOutcome::fail_open(err);
            }
        };
        let git_ref = Self::branch_ref(dependent);

        if self.options.cache_enabled {
            if let Some(cached_version) = self.cache.get(&url, git_ref, &target.module, None) {
                debug!(cache_hit = true, "resolved from cache");
                if cached_version.is_empty() {
                    return CheckOutcome::ok(false);
                }
                return match version::compare_versions(&cached_version, &target.version) {
                    Ok(needs_update) => CheckOutcome::ok(needs_update),
                    Err(err) => CheckOutcome::fail_open(err),
                };
            }
        }

        if let Err(err) = cancel.check() {
            return CheckOutcome::fail_open(err);
        }

        let raw = match self
            .adapter
            .fetch_dependency_manifest(cancel, &url, git_ref, self.options.timeout)
            .await
        {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "fetch failed; failing open");
                return CheckOutcome::fail_open(err);
            }
        };

        let parsed = match manifest::parse(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "parse failed; failing open");
                return CheckOutcome::fail_open(err);
            }
        };

        if self.options.cache_enabled {
            self.cache.set(&url, git_ref, parsed.clone());
        }

        let Some(current_version) = parsed.get(&target.module) else {
            return CheckOutcome::ok(false);
        };

        match version::compare_versions(current_version, &target.version) {
            Ok(needs_update) => CheckOutcome::ok(needs_update),
            Err(err) => CheckOutcome::fail_open(err),
        }
    }

    /// Pre-populates the cache for `dependents` with bounded concurrency.
    /// Per-entry failures are counted but non-fatal; no-op when caching is
    /// disabled.
    #[instrument(skip(self, dependents), fields(total = dependents.len()))]
    pub async fn warm(&self, cancel: CancellationToken, dependents: &[Dependent]) -> Result<(), Error> {
        if !self.options.cache_enabled {
            return Ok(());
        }

        let sem = Arc::new(Semaphore::new(self.options.parallel_checks.max(1)));
        let mut failures = 0usize;
        let mut handles = Vec::with_capacity(dependents.len());

        for dependent in dependents {
            let url = match self.adapter.parse_clone_url(dependent) {
                Ok(url) => url,
                Err(_) => {
                    failures += 1;
                    continue;
                }
            };
            let git_ref = Self::branch_ref(dependent).to_string();
            let permit = sem.clone().acquire_owned().await.expect("semaphore closed");
            let adapter = self.adapter.clone();
            let timeout = self.options.timeout;
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                let result = adapter
                    .fetch_dependency_manifest(cancel, &url, &git_ref, timeout)
                    .await
                    .and_then(|raw| manifest::parse(&raw));
                drop(permit);
                (url, git_ref, result)
            }));
        }

        for handle in handles {
            match handle.await {
                Ok((url, git_ref, Ok(parsed))) => self.cache.set(&url, &git_ref, parsed),
                Ok((url, git_ref, Err(err))) => {
                    warn!(%url, %git_ref, error = %err, "warm-up fetch failed");
                    failures += 1;
                }
                Err(join_err) => {
                    warn!(error = %join_err, "warm-up task panicked");
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            return Err(Error::ManifestParse(format!(
                "{failures} of {} warm-up fetches failed",
                dependents.len()
            )));
        }
        Ok(())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn log_cache_stats(&self) {
        let stats = self.cache_stats();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            size = stats.size,
            hit_rate = stats.hit_rate(),
            "remote checker cache stats"
        );
    }
}

impl DependencyChecker for RemoteChecker {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    struct StaticAdapter {
        manifest: Mutex<String>,
        fetch_count: std::sync::atomic::AtomicUsize,
    }

    impl StaticAdapter {
        fn new(manifest: &str) -> Self {
            Self {
                manifest: Mutex::new(manifest.to_string()),
                fetch_count: std::sync::atomic::AtomicUsize::new(0),
            }
        }
    }

    impl GitFetchAdapter for StaticAdapter {
        fn fetch_dependency_manifest<'a>(
            &'a self,
            _cancel: CancellationToken,
            _url: &'a str,
            _git_ref: &'a str,
            _timeout: Duration,
        ) -> BoxFuture<'a, Result<String, Error>> {
            self.fetch_count
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let body = self.manifest.lock().unwrap().clone();
            Box::pin(async move { Ok(body) })
        }
    }

    fn dependent() -> Dependent {
        Dependent {
            repo: "x/dependent".to_string(),
            ..Default::default()
        }
    }

    fn target() -> Target {
        Target {
            module: "github.com/x/a".to_string(),
            version: "v1.0.0".to_string(),
        }
    }

    #[tokio::test]
    async fn fetches_then_caches_on_second_call() {
        let adapter = Arc::new(StaticAdapter::new(
            "module github.com/x/dependent\n\nrequire github.com/x/a v0.9.0\n",
        ));
        let checker = RemoteChecker::new(CheckOptions::default(), adapter.clone());

        let first = checker
            .needs_update(CancellationToken::new(), &dependent(), &target(), None)
            .await;
        assert!(first.needs_update);
        assert!(first.error.is_none());

        let second = checker
            .needs_update(CancellationToken::new(), &dependent(), &target(), None)
            .await;
        assert!(second.needs_update);
        assert_eq!(
            adapter.fetch_count.load(std::sync::atomic::Ordering::SeqCst),
            1,
            "second call must be served from cache"
        );
    }

    #[tokio::test]
    async fn module_absent_from_manifest_does_not_need_update() {
        let adapter = Arc::new(StaticAdapter::new("module github.com/x/dependent\n"));
        let checker = RemoteChecker::new(CheckOptions::default(), adapter);
        let outcome = checker
            .needs_update(CancellationToken::new(), &dependent(), &target(), None)
            .await;
        assert!(!outcome.needs_update);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn parse_failure_fails_open() {
        let adapter = Arc::new(StaticAdapter::new(""));
        let checker = RemoteChecker::new(CheckOptions::default(), adapter);
        let outcome = checker
            .needs_update(CancellationToken::new(), &dependent(), &target(), None)
            .await;
        assert!(outcome.needs_update);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn clone_url_failure_fails_open() {
        let adapter = Arc::new(StaticAdapter::new("module x\n"));
        let checker = RemoteChecker::new(CheckOptions::default(), adapter);
        let bad_dependent = Dependent {
            repo: "not-a-valid-shorthand".to_string(),
            ..Default::default()
        };
        let outcome = checker
            .needs_update(CancellationToken::new(), &bad_dependent, &target(), None)
            .await;
        assert!(outcome.needs_update);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn warm_populates_cache_for_subsequent_checks() {
        let adapter = Arc::new(StaticAdapter::new(
            "module github.com/x/dependent\n\nrequire github.com/x/a v2.0.0\n",
        ));
        let checker = RemoteChecker::new(CheckOptions::default(), adapter.clone());
        checker
            .warm(CancellationToken::new(), std::slice::from_ref(&dependent()))
            .await
            .unwrap();

        let outcome = checker
            .needs_update(CancellationToken::new(), &dependent(), &target(), None)
            .await;
        assert!(!outcome.needs_update);
        assert_eq!(
            adapter.fetch_count.load(std::sync::atomic::Ordering::SeqCst),
            1,
            "needs_update must be served from the warm-populated cache"
        );
    }

    #[tokio::test]
    async fn log_cache_stats_does_not_panic() {
        let adapter = Arc::new(StaticAdapter::new("module x\n"));
        let checker = RemoteChecker::new(CheckOptions::default(), adapter);
        checker.log_cache_stats();
    }
}
