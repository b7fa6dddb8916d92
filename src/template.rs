//! Commit-message rendering and branch-name generation. Both are pure
//! string functions; neither touches the filesystem or any git state.

use crate::model::Target;

/// Replaces `{{ module }}` / `{{ .Module }}` and `{{ version }}` /
/// `{{ .Version }}` placeholders (case-insensitive, tolerant of surrounding
/// whitespace inside the braces) with `target`'s fields. An empty template
/// renders as `"Update <module> to <version>"`.
pub fn render_commit_message(template: &str, target: &Target) -> String {
    if template.is_empty() {
        return format!("Update {} to {}", target.module, target.version);
    }
    replace_placeholder(
        &replace_placeholder(template, &["module", ".module"], &target.module),
        &["version", ".version"],
        &target.version,
    )
}

/// Scans `text` for `{{ <name> }}` where `<name>` case-insensitively matches
/// one of `names`, replacing each occurrence with `value`.
fn replace_placeholder(text: &str, names: &[&str], value: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(start) = rest.find("{{") else {
            result.push_str(rest);
            break;
        };
        let Some(end_offset) = rest[start..].find("}}") else {
            result.push_str(rest);
            break;
        };
        let end = start + end_offset;
        let inner = rest[start + 2..end].trim().to_ascii_lowercase();
        result.push_str(&rest[..start]);
        if names.iter().any(|n| *n == inner) {
            result.push_str(value);
        } else {
            result.push_str(&rest[start..end + 2]);
        }
        rest = &rest[end + 2..];
    }
    result
}

/// Derives a branch name: `"auto/" + leaf(module) + "-" + version`, both
/// sides lowercased, whitespace turned to `-`, consecutive `/` collapsed,
/// `@#$%^&*()+=[]{}|\:;"'<>,?` \` ~` turned to `-`, consecutive `-`
/// collapsed, and leading/trailing `-` trimmed.
pub fn generate_branch_name(module: &str, version: &str) -> String {
    let leaf = module.rsplit('/').next().unwrap_or(module);
    format!("auto/{}-{}", clean(leaf), clean(version))
}

fn clean(raw: &str) -> String {
    const SPECIAL: &[char] = &[
        '@', '#', '$', '%', '^', '&', '*', '(', ')', '+', '=', '[', ']', '{', '}', '|', '\\', ':',
        ';', '"', '\'', '<', '>', ',', '?', '`', '~',
    ];

    let lowered = raw.to_lowercase();
    let mut collapsed_slashes = String::with_capacity(lowered.len());
    let mut prev_was_slash = false;
    for c in lowered.chars() {
        if c == '/' {
            if !prev_was_slash {
                collapsed_slashes.push('/');
            }
            prev_was_slash = true;
        } else {
            collapsed_slashes.push(c);
            prev_was_slash = false;
        }
    }

    let substituted: String = collapsed_slashes
        .chars()
        .map(|c| {
            if c.is_whitespace() || SPECIAL.contains(&c) {
                '-'
            } else {
                c
            }
        })
        .collect();

    let mut collapsed_dashes = String::with_capacity(substituted.len());
    let mut prev_was_dash = false;
    for c in substituted.chars() {
        if c == '-' {
            if !prev_was_dash {
                collapsed_dashes.push('-');
            }
            prev_was_dash = true;
        } else {
            collapsed_dashes.push(c);
            prev_was_dash = false;
        }
    }

    collapsed_dashes.trim_matches('-').to_string()
}
