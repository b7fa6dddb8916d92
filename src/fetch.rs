//! The git-fetch adapter: the interface the remote checker consumes, not an
//! implementation. The actual shallow-clone transport (git over HTTPS/SSH,
//! credential lookup) is an external collaborator; this crate only fixes the
//! contract.
//!
//! The trait returns boxed futures (rather than an `async fn` in the trait)
//! so it stays object-safe — this crate needs `dyn GitFetchAdapter` at this
//! boundary for dynamic dispatch.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::errors::{Error, Result};
use crate::model::Dependent;

/// A boxed, `Send` future — the trait-object-friendly stand-in for `async fn`
/// in a trait.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The two operations a remote dependency checker needs from a git
/// transport: deriving a clone URL for a dependent, and fetching the raw
/// text of its dependency-manifest file at a ref.
pub trait GitFetchAdapter: Send + Sync {
    /// Derives the clone URL for `dependent`.
    ///
    /// If the dependent carries an explicit `clone_url`, it is used
    /// verbatim. Else if `repo` already looks like a URL (`https://`,
    /// `http://`, or `git@`), it is used verbatim. Otherwise `repo` is
    /// treated as GitHub shorthand: `"a/b"` → `https://github.com/a/b.git`,
    /// `"host/a/b"` → `https://host/a/b.git`; anything else is an error.
    fn parse_clone_url(&self, dependent: &Dependent) -> Result<String> {
        parse_clone_url(dependent)
    }

    /// Fetches the raw text of the dependency-manifest file at `url`@`ref`.
    ///
    /// Must honor `timeout` and observe `cancel` at least once before
    /// returning; must clean up any temporary resources (e.g. a shallow
    /// clone's working directory) before returning, success or failure.
    fn fetch_dependency_manifest<'a>(
        &'a self,
        cancel: CancellationToken,
        url: &'a str,
        git_ref: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<String>>;
}

/// Shared, default implementation of `parse_clone_url`, usable both as the
/// trait's default method and standalone by adapters that want to reuse it
/// verbatim.
pub fn parse_clone_url(dependent: &Dependent) -> Result<String> {
    if let Some(url) = dependent.clone_url.as_ref().filter(|u| !u.is_empty()) {
        return Ok(url.clone());
    }

    let repo = dependent.repo.as_str();
    if repo.starts_with("https://") || repo.starts_with("http://") || repo.starts_with("git@") {
        return Ok(repo.to_string());
    }

    let segments: Vec<&str> = repo.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [owner, name] => Ok(format!("https://github.com/{owner}/{name}.git")),
        [host, owner, name] => Ok(format!("https://{host}/{owner}/{name}.git")),
        _ => Err(Error::InvalidCloneUrl(repo.to_string())),
    }
}

/// A `GitFetchAdapter` with no working transport. Every fetch fails
/// immediately with [`Error::NotImplemented`]; this crate is intentionally
/// transport-agnostic, so this type exists only so downstream code and tests
/// have a concrete adapter to construct without pulling in a real git
/// client.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFetchAdapter;

impl GitFetchAdapter for NullFetchAdapter {
    fn fetch_dependency_manifest<'a>(
        &'a self,
        _cancel: CancellationToken,
        _url: &'a str,
        _git_ref: &'a str,
        _timeout: Duration,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move { Err(Error::NotImplemented("no git transport configured")) })
    }
}
