//! Filesystem primitives used by rule operations
//!
//! Callers are expected to have passed every path through
//! [`resolve_within_root`](super::safety::resolve_within_root) first.

use crate::error::{Result, RuleError};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

/// Remove a file or directory tree. Returns false when nothing was there.
pub async fn remove_path(path: &Path) -> Result<bool> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(RuleError::io(path, e)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RuleError::io(path, e)),
    }
}

/// Check existence without following the last symlink
pub async fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).await.is_ok()
}

/// Copy a file or a directory tree, merging into and overwriting whatever is
/// at `to`. Missing parent directories are created. Returns the number of
/// files written.
pub async fn copy_path(from: &Path, to: &Path) -> Result<usize> {
    let metadata = fs::metadata(from)
        .await
        .map_err(|e| RuleError::io(from, e))?;

    if !metadata.is_dir() {
        copy_file(from, to).await?;
        return Ok(1);
    }

    let mut copied = 0;
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(from).to_path_buf();
            RuleError::io(path, e.into())
        })?;

        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .await
                .map_err(|e| RuleError::io(&target, e))?;
        } else {
            copy_file(entry.path(), &target).await?;
            copied += 1;
        }
    }

    Ok(copied)
}

async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| RuleError::io(parent, e))?;
    }
    fs::copy(from, to)
        .await
        .map_err(|e| RuleError::io(to, e))?;
    Ok(())
}

/// Read a UTF-8 text file
pub async fn read_text(path: &Path) -> std::io::Result<String> {
    fs::read_to_string(path).await
}

/// Write `after` only when it differs from `before`. Returns whether a write happened.
pub async fn write_if_changed(path: &Path, before: &str, after: &str) -> Result<bool> {
    if before == after {
        return Ok(false);
    }
    fs::write(path, after)
        .await
        .map_err(|e| RuleError::io(path, e))?;
    Ok(true)
}
