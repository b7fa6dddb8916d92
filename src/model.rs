//! Shared data model: the vocabulary the planner, the (external) manifest
//! subsystem, and the (external) downstream executor all speak.
//!
//! These types intentionally carry no behavior beyond simple constructors —
//! the operations that act on them live in `planner`, `pipeline`,
//! `defaults`, `template`, and `validate`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A `(module, version)` pair being propagated to dependents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub module: String,
    pub version: String,
}

/// Pull-request configuration carried by a dependent or by manifest defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrConfig {
    #[serde(default)]
    pub title_template: String,
    #[serde(default)]
    pub body_template: String,
    /// `None` means "not set"; `Some(vec![])` means "explicitly empty".
    /// Normalization collapses both to "absent".
    #[serde(default)]
    pub reviewers: Option<Vec<String>>,
    #[serde(default)]
    pub team_reviewers: Option<Vec<String>>,
}

impl PrConfig {
    /// A `PrConfig` is "unset" (no original PR block) when every field is at
    /// its zero value. Used to compute `had_original_pr` when merging manifest
    /// defaults into a dependent's own settings.
    pub fn is_zero(&self) -> bool {
        self.title_template.is_empty()
            && self.body_template.is_empty()
            && self.reviewers.as_ref().is_none_or(Vec::is_empty)
            && self.team_reviewers.as_ref().is_none_or(Vec::is_empty)
    }
}

/// Notification routing configuration (Slack channels, emails, etc.) —
/// opaque to the planner beyond merge semantics, so it is a plain string map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub on_failure_only: bool,
}

impl NotificationsConfig {
    pub fn is_zero(&self) -> bool {
        self.channels.is_empty() && !self.on_failure_only
    }
}

/// One repository that consumes the released module and must be updated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dependent {
    pub repo: String,
    #[serde(default)]
    pub clone_url: Option<String>,
    #[serde(default)]
    pub module: String,
    /// Position of the module within the dependent's own repository.
    /// Defaults to `"."` when unset.
    #[serde(default = "default_module_path")]
    pub module_path: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub extra_commands: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub pr: PrConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub timeout_secs: u64,
    #[serde(default)]
    pub canary: bool,
    #[serde(default)]
    pub skip: bool,
}

fn default_module_path() -> String {
    ".".to_string()
}

/// Manifest-level defaults merged into each `Dependent` by `defaults::expand_defaults`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub extra_commands: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub pr: PrConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub timeout_secs: u64,
    #[serde(default)]
    pub commit_template: String,
}

/// The planner's output element: a self-contained description of the update
/// operation for one dependent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub repo: String,
    /// Declared but never populated by the orchestrator.
    #[serde(default)]
    pub clone_url: Option<String>,
    pub module: String,
    pub module_path: String,
    pub source_module: String,
    pub source_version: String,
    pub branch: String,
    pub branch_name: String,
    pub commit_message: String,
    pub tests: Vec<String>,
    pub extra_commands: Vec<String>,
    pub labels: Vec<String>,
    pub pr: PrConfig,
    pub notifications: NotificationsConfig,
    pub env: HashMap<String, String>,
    pub timeout_secs: u64,
    pub canary: bool,
    pub skip: bool,
}

/// The planner's output: the original target plus an ordered item list.
/// `items` is never absent — an empty `Vec` when no dependent survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub target: Target,
    pub items: Vec<WorkItem>,
}

/// A released module as it appears inside a manifest: its path plus the
/// ordered dependents and defaults the planner walks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub path: String,
    pub source_repo: String,
    pub dependents: Vec<Dependent>,
    pub defaults: Defaults,
}

/// Borrowed read-only view over the (externally loaded, externally
/// persisted) manifest. The planner never owns or mutates a manifest; it
/// only looks up the target module by path.
pub trait ManifestLookup {
    fn find_module_by_path(&self, path: &str) -> Option<&Module>;
}

/// The simplest possible `ManifestLookup`: a flat list of modules, as the
/// YAML manifest loader (out of scope here) would hand back after parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub modules: Vec<Module>,
}

impl ManifestLookup for Manifest {
    fn find_module_by_path(&self, path: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.path == path)
    }
}
