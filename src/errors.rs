//! Crate-wide error hierarchy for the planner core.
//!
//! Goals:
//! - Single root `Error` for all public functions.
//! - Structural classification (predicates), never message inspection.
//! - Ergonomic `?` via `From`/`#[source]` so causes stay inspectable.

use std::fmt;
use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the planner core.
#[derive(Debug, Error)]
pub enum Error {
    /// A target field was empty where a non-empty value is required.
    #[error("invalid target: field {field} must not be empty")]
    InvalidTarget { field: &'static str },

    /// The manifest has no module matching the requested target.
    #[error("target module not found: {module}")]
    TargetNotFound { module: String },

    /// A downstream failure surfaced while assembling a work item.
    #[error("planning failed for {}@{}: {cause}", target.module, target.version)]
    PlanningError {
        target: crate::model::Target,
        #[source]
        cause: Box<Error>,
    },

    /// A dependency checker failed in a way that could not be fail-opened
    /// (currently only the local checker's hard failures).
    #[error("dependency check failed for {dependent_repo} against {}@{}: {cause}", target.module, target.version)]
    DependencyCheckError {
        dependent_repo: String,
        target: crate::model::Target,
        #[source]
        cause: Box<Error>,
    },

    /// `HybridChecker` was configured with a strategy it does not recognize.
    #[error("unknown check strategy: {0}")]
    UnknownStrategy(String),

    /// Failure parsing a dependency-manifest file body.
    #[error("failed to parse dependency manifest: {0}")]
    ManifestParse(String),

    /// Failure parsing a version string (not a valid semver and not a
    /// pseudo-version).
    #[error("invalid version for {role}: {value}")]
    InvalidVersion { role: VersionRole, value: String },

    /// Could not derive a clone URL from a dependent's `repo` shorthand.
    #[error("cannot derive clone url from repo shorthand: {0}")]
    InvalidCloneUrl(String),

    /// Transport-level failure fetching a dependent's manifest. Carried as a
    /// string because the concrete transport lives outside this crate.
    #[error("fetch failed for {url}@{git_ref}: {message}")]
    Fetch {
        url: String,
        git_ref: String,
        message: String,
    },

    /// The operation was canceled via its cancellation token.
    #[error("operation canceled")]
    Canceled,

    /// Placeholder for capabilities the planner core intentionally leaves
    /// to collaborators (e.g. manifest persistence).
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

/// Which side of a version comparison failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionRole {
    Current,
    Target,
}

impl fmt::Display for VersionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRole::Current => write!(f, "current"),
            VersionRole::Target => write!(f, "target"),
        }
    }
}

/// True if `err` is `Error::TargetNotFound`.
pub fn is_target_not_found(err: &Error) -> bool {
    matches!(err, Error::TargetNotFound { .. })
}

/// True if `err` is `Error::InvalidTarget`.
pub fn is_invalid_target(err: &Error) -> bool {
    matches!(err, Error::InvalidTarget { .. })
}

/// True if `err` is `Error::PlanningError`.
pub fn is_planning_error(err: &Error) -> bool {
    matches!(err, Error::PlanningError { .. })
}
