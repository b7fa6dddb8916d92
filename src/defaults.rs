//! Merges manifest-level `Defaults` into a single `Dependent` without ever
//! mutating the dependent the caller passed in.
//!
//! Scalar fields: dependent overrides win when non-zero, else the default is
//! used. Sequence fields: "non-empty side wins", the dependent's own
//! sequence takes priority over the default's when both are non-empty — they
//! are never concatenated. Map fields (`env`): merged key-wise, dependent
//! entries win on conflict. Composite fields (`pr`, `notifications`): merged
//! field-by-field using the same rules, recursively.

use std::collections::HashMap;

use crate::model::{Defaults, Dependent, NotificationsConfig, PrConfig};

fn pick_vec(dependent: &[String], default: &[String]) -> Vec<String> {
    if dependent.is_empty() {
        default.to_vec()
    } else {
        dependent.to_vec()
    }
}

fn pick_string(dependent: &str, default: &str) -> String {
    if dependent.is_empty() {
        default.to_string()
    } else {
        dependent.to_string()
    }
}

fn pick_opt_vec(
    dependent: &Option<Vec<String>>,
    default: &Option<Vec<String>>,
) -> Option<Vec<String>> {
    match dependent {
        Some(v) if !v.is_empty() => Some(v.clone()),
        _ => default.clone(),
    }
}

fn merge_pr(dependent: &PrConfig, default: &PrConfig) -> PrConfig {
    PrConfig {
        title_template: pick_string(&dependent.title_template, &default.title_template),
        body_template: pick_string(&dependent.body_template, &default.body_template),
        reviewers: pick_opt_vec(&dependent.reviewers, &default.reviewers),
        team_reviewers: pick_opt_vec(&dependent.team_reviewers, &default.team_reviewers),
    }
}

fn merge_notifications(
    dependent: &NotificationsConfig,
    default: &NotificationsConfig,
) -> NotificationsConfig {
    NotificationsConfig {
        channels: pick_vec(&dependent.channels, &default.channels),
        on_failure_only: dependent.on_failure_only || default.on_failure_only,
    }
}

fn merge_env(
    dependent: &HashMap<String, String>,
    default: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut merged = default.clone();
    merged.extend(dependent.clone());
    merged
}

/// Expands `defaults` into `dependent`, returning the merged copy plus
/// whether the dependent originally carried any PR configuration of its own
/// (`had_original_pr`, consumed by the planner to decide whether a rendered
/// `pr.title_template`/`body_template` should fall back to a built-in
/// default).
pub fn expand_defaults(dependent: &Dependent, defaults: &Defaults) -> (Dependent, bool) {
    let had_original_pr = !dependent.pr.is_zero();

    let expanded = Dependent {
        repo: dependent.repo.clone(),
        clone_url: dependent.clone_url.clone(),
        module: dependent.module.clone(),
        module_path: dependent.module_path.clone(),
        branch: pick_string(&dependent.branch, &defaults.branch),
        tests: pick_vec(&dependent.tests, &defaults.tests),
        extra_commands: pick_vec(&dependent.extra_commands, &defaults.extra_commands),
        labels: pick_vec(&dependent.labels, &defaults.labels),
        pr: merge_pr(&dependent.pr, &defaults.pr),
        notifications: merge_notifications(&dependent.notifications, &defaults.notifications),
        env: merge_env(&dependent.env, &defaults.env),
        timeout_secs: if dependent.timeout_secs == 0 {
            defaults.timeout_secs
        } else {
            dependent.timeout_secs
        },
        canary: dependent.canary,
        skip: dependent.skip,
    };

    (expanded, had_original_pr)
}
