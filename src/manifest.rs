//! Parses a dependent's own module-dependency file — a Go-module-shaped
//! `module` / `require` / `replace` text file — into a flat `module →
//! version` map. This is deliberately line-oriented rather than a full
//! module-file grammar: the planner only needs the resulting version map.

use std::collections::{HashMap, HashSet};

use crate::errors::{Error, Result};

/// Parsed dependencies: `module path → version`.
pub type DependencyMap = HashMap<String, String>;

/// The result of parsing a manifest with local-replace tracking retained,
/// for callers (the local checker) that must tell "never required" apart
/// from "required but replaced with a local path".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedManifest {
    pub dependencies: DependencyMap,
    pub locally_replaced: HashSet<String>,
}

/// Parses the raw text of a dependent's dependency-manifest file.
///
/// - Every explicit `require` with a non-empty version contributes an entry.
/// - A `replace` directive with a new version overrides the required entry.
/// - A `replace` directive with a local path (no version) removes the
///   module from the result (versions cannot be compared against a path).
/// - An empty file, a file with no usable directives, or a file missing the
///   leading `module` directive is a parse error.
pub fn parse(raw: &str) -> Result<DependencyMap> {
    Ok(parse_detailed(raw)?.dependencies)
}

/// Like [`parse`], but also reports which modules were dropped because of a
/// local-path `replace` directive (rather than simply never required).
pub fn parse_detailed(raw: &str) -> Result<ParsedManifest> {
    if raw.trim().is_empty() {
        return Err(Error::ManifestParse("empty manifest".to_string()));
    }

    let mut saw_module_directive = false;
    let mut deps: DependencyMap = HashMap::new();
    let mut removed: Vec<String> = Vec::new();

    let mut lines = raw.lines().peekable();
    while let Some(raw_line) = lines.next() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("module ") {
            saw_module_directive = true;
            let _ = rest.trim();
            continue;
        }
        if line == "module" {
            saw_module_directive = true;
            continue;
        }

        if let Some(rest) = line.strip_prefix("require ") {
            let rest = rest.trim();
            if rest == "(" {
                consume_block(&mut lines, |entry| {
                    if let Some((path, version)) = parse_require_entry(entry) {
                        deps.insert(path, version);
                    }
                });
            } else if let Some((path, version)) = parse_require_entry(rest) {
                deps.insert(path, version);
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("replace ") {
            let rest = rest.trim();
            if rest == "(" {
                consume_block(&mut lines, |entry| {
                    apply_replace_entry(entry, &mut deps, &mut removed);
                });
            } else {
                apply_replace_entry(rest, &mut deps, &mut removed);
            }
            continue;
        }
    }

    if !saw_module_directive {
        return Err(Error::ManifestParse(
            "missing leading `module` directive".to_string(),
        ));
    }

    let locally_replaced: HashSet<String> = removed.into_iter().collect();
    for module in &locally_replaced {
        deps.remove(module);
    }

    Ok(ParsedManifest {
        dependencies: deps,
        locally_replaced,
    })
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Consumes lines up to and including a closing `)`, calling `on_entry` for
/// each non-empty, non-comment line inside the block.
fn consume_block<'a, I, F>(lines: &mut std::iter::Peekable<I>, mut on_entry: F)
where
    I: Iterator<Item = &'a str>,
    F: FnMut(&str),
{
    for raw_line in lines.by_ref() {
        let line = strip_comment(raw_line).trim();
        if line == ")" {
            break;
        }
        if line.is_empty() {
            continue;
        }
        on_entry(line);
    }
}

/// Parses a `<module-path> <version>` entry (the body of a `require` line or
/// block row).
fn parse_require_entry(entry: &str) -> Option<(String, String)> {
    let mut parts = entry.split_whitespace();
    let path = parts.next()?;
    let version = parts.next()?;
    if version.is_empty() {
        return None;
    }
    Some((path.to_string(), version.to_string()))
}

/// Parses a `<old-path> => <new-path> [<new-version>]` entry and applies it:
/// overrides the required version when a new version is present, or marks
/// the module for removal when the replacement is a bare local path.
fn apply_replace_entry(entry: &str, deps: &mut DependencyMap, removed: &mut Vec<String>) {
    let Some((old, new)) = entry.split_once("=>") else {
        return;
    };
    let Some(old_path) = old.split_whitespace().next() else {
        return;
    };
    let new_tokens: Vec<&str> = new.split_whitespace().collect();
    match new_tokens.as_slice() {
        [new_path, new_version] => {
            deps.insert(old_path.to_string(), new_version.to_string());
            let _ = new_path;
        }
        _ => {
            // Local path replace (or malformed) — cannot compare versions.
            removed.push(old_path.to_string());
        }
    }
}
