//! Product configuration trait for the rule engine
//!
//! This trait describes where a product keeps its rule manifest and which CI
//! workflow files belong to each module, so the same engine can serve other
//! starter kits laid out the same way.

use crate::modules::Module;

/// Configuration trait for products generated by the rule engine
///
/// Each product defines:
/// - Product identity (name, display name)
/// - Location of the project-supplied rule manifest
/// - CI workflow files owned by each module
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Directory (relative to the project root) holding generator metadata.
    /// Removed after rules run.
    fn manifest_dir(&self) -> &'static str {
        ".create-larastack"
    }

    /// Manifest file name inside `manifest_dir`
    fn manifest_file(&self) -> &'static str {
        "rules.json"
    }

    /// Manifest path relative to the project root, with forward slashes
    fn manifest_path(&self) -> String {
        format!("{}/{}", self.manifest_dir(), self.manifest_file())
    }

    /// Directory holding CI workflow definitions
    fn workflows_dir(&self) -> &'static str {
        ".github/workflows"
    }

    /// Workflow file names belonging to a module
    fn workflow_files(&self, module: Module) -> Vec<String> {
        vec![
            format!("{}-ci.yaml", module.id()),
            format!("{}-ci.yml", module.id()),
        ]
    }

    /// Workflow paths relative to the project root
    fn workflow_paths(&self, module: Module) -> Vec<String> {
        self.workflow_files(module)
            .into_iter()
            .map(|file| format!("{}/{}", self.workflows_dir(), file))
            .collect()
    }
}

/// The Larastack starter kit
#[derive(Debug, Clone, Copy, Default)]
pub struct LarastackProduct;

impl ProductConfig for LarastackProduct {
    fn name(&self) -> &'static str {
        "create-larastack-app"
    }

    fn display_name(&self) -> &'static str {
        "Larastack"
    }
}
