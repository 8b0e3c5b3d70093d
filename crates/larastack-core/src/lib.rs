//! Larastack Core - Conditional rules for generated Larastack projects
//!
//! After a project tree has been materialized from the starter template, this
//! library removes, copies and rewrites files depending on which application
//! modules (`frontend`, `backend`, `mobile`) were selected.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Files** - Root containment checks, glob expansion, remove/copy primitives
//! - **Layer 2: Source** - tree-sitter syntax trees and byte-range edit sets
//! - **Layer 3: Transforms** - Registered, format-preserving rewrites of known files
//! - **Layer 4: Rules** - Manifest validation and the ordered `RuleEngine`
//!
//! # Example Usage
//!
//! ```ignore
//! use larastack_core::{apply_rules, ModuleSet};
//!
//! let modules: ModuleSet = "frontend,backend".parse()?;
//! let summary = apply_rules(Path::new("my-app"), &modules).await?;
//! println!("{} files rewritten", summary.files_rewritten);
//! ```

pub mod error;
pub mod files;
pub mod modules;
pub mod product;
pub mod rules;
pub mod source;
pub mod transform;

// Re-export main types for convenience
pub use error::{Result, RuleError};
pub use modules::{Module, ModuleSet, UnknownModule};
pub use product::{LarastackProduct, ProductConfig};
pub use rules::{
    apply_rules, prune_ci_workflows, prune_for_modules, Clause, Condition, Operation,
    OperationKind, Rule, RuleEngine, RunSummary,
};
pub use transform::{Profile, TransformerId, TransformerRegistry};
