//! Path safety, glob expansion and file operations
//!
//! This module provides:
//! - Root containment checks applied to every rule path
//! - Wildcard expansion against the live project tree
//! - Remove/copy/write primitives used by rule operations

pub mod glob;
pub mod ops;
pub mod safety;

pub use glob::{expand_pattern, is_glob_pattern};
pub use ops::{copy_path, path_exists, read_text, remove_path, write_if_changed};
pub use safety::{relative_display, resolve_within_root};
