//! Wildcard path resolution against the current state of the project tree

use crate::error::{Result, RuleError};
use crate::files::safety::{relative_display, resolve_within_root};
use globset::{GlobBuilder, GlobMatcher};
use std::path::Path;
use walkdir::WalkDir;

/// Characters that turn a rule path into a pattern
const GLOB_METACHARACTERS: &[char] = &['*', '?', '{', '}', '[', ']'];

/// Check whether a rule path must be expanded against the filesystem
pub fn is_glob_pattern(value: &str) -> bool {
    value.contains(GLOB_METACHARACTERS)
}

/// Expand `pattern` to the relative paths currently present under `root`.
///
/// `*` and `?` do not cross `/`; use `**` for that. When a directory
/// matches, its contents are not reported separately. The tree is scanned on
/// every call, so earlier removals and copies are always visible.
pub fn expand_pattern(root: &Path, pattern: &str, rule_id: &str) -> Result<Vec<String>> {
    // A pattern that leaves the root can never match inside it; fail loudly instead.
    resolve_within_root(root, pattern, rule_id)?;

    let matcher = compile(pattern.trim_start_matches("./"), rule_id)?;

    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            RuleError::io(path, e.into())
        })?;

        let relative = relative_display(root, entry.path());
        if matcher.is_match(&relative) {
            matches.push(relative);
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
        }
    }

    Ok(matches)
}

fn compile(pattern: &str, rule_id: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| RuleError::InvalidGlob {
            rule_id: rule_id.to_string(),
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}
