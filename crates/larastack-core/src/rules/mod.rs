//! Conditional rules: what to remove, copy or rewrite for a module selection
//!
//! This module provides:
//! - The rule, condition and operation model
//! - Manifest loading and validation (`manifest`)
//! - Built-in default rules generated per module (`defaults`)
//! - The [`RuleEngine`] that evaluates and executes rules in order

pub mod defaults;
pub mod engine;
pub mod manifest;

use crate::modules::{Module, ModuleSet};
use crate::transform::TransformerId;
use serde_json::{Map, Value};
use std::fmt;

pub use defaults::{default_rules, workflow_rules};
pub use engine::{apply_rules, prune_ci_workflows, prune_for_modules, RuleEngine, RunSummary};
pub use manifest::{load_rules, parse_manifest};

/// One membership test against the selected modules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    ModuleSelected(Module),
    ModuleNotSelected(Module),
}

impl Clause {
    pub fn matches(&self, modules: &ModuleSet) -> bool {
        match self {
            Clause::ModuleSelected(module) => modules.contains(*module),
            Clause::ModuleNotSelected(module) => !modules.contains(*module),
        }
    }
}

/// Rule predicate. Empty lists hold vacuously.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Condition {
    pub all_of: Vec<Clause>,
    pub any_of: Vec<Clause>,
    pub none_of: Vec<Clause>,
}

impl Condition {
    pub fn matches(&self, modules: &ModuleSet) -> bool {
        self.all_of.iter().all(|clause| clause.matches(modules))
            && (self.any_of.is_empty() || self.any_of.iter().any(|clause| clause.matches(modules)))
            && !self.none_of.iter().any(|clause| clause.matches(modules))
    }
}

/// Kind tag of an [`Operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Remove,
    Copy,
    Transform,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Remove,
        OperationKind::Copy,
        OperationKind::Transform,
    ];

    /// Value of the `type` field in a manifest
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Remove => "remove",
            OperationKind::Copy => "copy",
            OperationKind::Transform => "transform",
        }
    }

    pub fn parse(s: &str) -> Option<OperationKind> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single filesystem action. Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Delete each path; entries with wildcards are expanded when the operation runs
    Remove { paths: Vec<String> },
    /// Copy a file or directory, merging into an existing destination
    Copy { from: String, to: String },
    /// Rewrite one file with a registered transform
    Transform {
        path: String,
        transform: TransformerId,
        /// Transform-specific settings such as `profile`, checked when the manifest loads
        options: Map<String, Value>,
    },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Remove { .. } => OperationKind::Remove,
            Operation::Copy { .. } => OperationKind::Copy,
            Operation::Transform { .. } => OperationKind::Transform,
        }
    }
}

/// A named, optionally conditional list of operations
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub condition: Option<Condition>,
    pub operations: Vec<Operation>,
}

impl Rule {
    /// Whether the rule applies to this selection. A rule without a condition always does.
    pub fn matches(&self, modules: &ModuleSet) -> bool {
        self.condition
            .as_ref()
            .map_or(true, |condition| condition.matches(modules))
    }
}
