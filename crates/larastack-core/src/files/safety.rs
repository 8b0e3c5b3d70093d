//! Project-root containment checks for rule paths

use crate::error::{Result, RuleError};
use std::path::{Component, Path, PathBuf};

/// Resolve `value` against `root` and make sure the result stays inside it.
///
/// Resolution is lexical (`.` and `..` segments are folded without touching
/// the filesystem) so it works for paths that do not exist yet, such as copy
/// destinations. A path is rejected when its form relative to `root` would
/// begin with `..` or would still be absolute.
pub fn resolve_within_root(root: &Path, value: &str, rule_id: &str) -> Result<PathBuf> {
    let root = normalize(root);
    let resolved = normalize(&root.join(value));

    match resolved.strip_prefix(&root) {
        Ok(_) => Ok(resolved),
        Err(_) => Err(RuleError::PathEscape {
            rule_id: rule_id.to_string(),
            path: value.to_string(),
        }),
    }
}

/// Relative form of `path` under `root`, with forward slashes
pub fn relative_display(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Fold `.` and `..` components. A `..` at the filesystem root is dropped,
/// matching how path resolution treats `/..`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_anchor = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                );
                if at_anchor {
                    if !out.has_root() {
                        out.push("..");
                    }
                } else if out.components().next_back() == Some(Component::ParentDir) {
                    out.push("..");
                } else {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
