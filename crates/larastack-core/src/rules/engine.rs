//! Rule evaluation and execution
//!
//! Rules run strictly in order and operations within a rule run in declared
//! order; each is awaited before the next starts, since later rules see the
//! tree left by earlier ones. The first failure aborts the run.

use super::{default_rules, load_rules, workflow_rules, Operation, Rule};
use crate::error::{Result, RuleError};
use crate::files::{
    copy_path, expand_pattern, is_glob_pattern, path_exists, remove_path, resolve_within_root,
};
use crate::modules::ModuleSet;
use crate::product::{LarastackProduct, ProductConfig};
use crate::transform::{TransformContext, TransformerId, TransformerRegistry};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info, warn};

/// Counts gathered while running rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub rules_matched: usize,
    pub rules_skipped: usize,
    pub paths_removed: usize,
    pub files_copied: usize,
    pub files_rewritten: usize,
}

/// Runs default and project rules for one product
#[derive(Debug, Clone)]
pub struct RuleEngine<C: ProductConfig = LarastackProduct> {
    product: C,
    registry: TransformerRegistry,
}

impl Default for RuleEngine<LarastackProduct> {
    fn default() -> Self {
        Self::new(LarastackProduct)
    }
}

impl<C: ProductConfig> RuleEngine<C> {
    /// Engine with every built-in transform registered
    pub fn new(product: C) -> Self {
        Self::with_registry(product, TransformerRegistry::builtin())
    }

    pub fn with_registry(product: C, registry: TransformerRegistry) -> Self {
        Self { product, registry }
    }

    pub fn product(&self) -> &C {
        &self.product
    }

    pub fn registry(&self) -> &TransformerRegistry {
        &self.registry
    }

    /// Validated project rules from the manifest under `root`
    pub async fn project_rules(&self, root: &Path) -> Result<Vec<Rule>> {
        load_rules(root, &self.product, &self.registry).await
    }

    /// Default rules followed by project rules, in execution order
    pub async fn effective_rules(&self, root: &Path) -> Result<Vec<Rule>> {
        let mut rules = default_rules(&self.product);
        rules.extend(self.project_rules(root).await?);
        Ok(rules)
    }

    /// Run default and project rules, then remove the manifest directory
    pub async fn apply(&self, root: &Path, modules: &ModuleSet) -> Result<RunSummary> {
        let rules = self.effective_rules(root).await?;
        info!(
            product = self.product.name(),
            modules = %modules,
            rules = rules.len(),
            "Applying rules"
        );

        let summary = self.run(root, modules, &rules).await?;

        let manifest_dir = root.join(self.product.manifest_dir());
        if remove_path(&manifest_dir).await? {
            debug!(dir = self.product.manifest_dir(), "Removed manifest directory");
        }
        Ok(summary)
    }

    /// Run only the default module pruning rules; no manifest is read
    pub async fn prune(&self, root: &Path, modules: &ModuleSet) -> Result<RunSummary> {
        self.run(root, modules, &default_rules(&self.product)).await
    }

    /// Run only the CI workflow pruning rules
    pub async fn prune_workflows(&self, root: &Path, modules: &ModuleSet) -> Result<RunSummary> {
        self.run(root, modules, &workflow_rules(&self.product)).await
    }

    /// Evaluate and execute `rules` in order
    pub async fn run(
        &self,
        root: &Path,
        modules: &ModuleSet,
        rules: &[Rule],
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for rule in rules {
            if !rule.matches(modules) {
                debug!(rule = %rule.id, "Skipped");
                summary.rules_skipped += 1;
                continue;
            }

            debug!(rule = %rule.id, operations = rule.operations.len(), "Matched");
            summary.rules_matched += 1;

            for (index, operation) in rule.operations.iter().enumerate() {
                self.execute(root, modules, &rule.id, operation, &mut summary)
                    .await
                    .map_err(|e| e.in_operation(&rule.id, index))?;
            }
        }

        Ok(summary)
    }

    async fn execute(
        &self,
        root: &Path,
        modules: &ModuleSet,
        rule_id: &str,
        operation: &Operation,
        summary: &mut RunSummary,
    ) -> Result<()> {
        debug!(rule = rule_id, kind = %operation.kind(), "Executing operation");

        match operation {
            Operation::Remove { paths } => {
                for pattern in paths {
                    summary.paths_removed += remove_pattern(root, pattern, rule_id).await?;
                }
            }
            Operation::Copy { from, to } => {
                summary.files_copied += copy_within_root(root, from, to, rule_id).await?;
            }
            Operation::Transform {
                path,
                transform,
                options,
            } => {
                let rewritten = self
                    .transform(root, modules, rule_id, path, *transform, options)
                    .await?;
                if rewritten {
                    summary.files_rewritten += 1;
                }
            }
        }

        Ok(())
    }

    async fn transform(
        &self,
        root: &Path,
        modules: &ModuleSet,
        rule_id: &str,
        path: &str,
        transform: TransformerId,
        options: &Map<String, Value>,
    ) -> Result<bool> {
        let file = resolve_within_root(root, path, rule_id)?;
        if !path_exists(&file).await {
            return Err(RuleError::MissingTransformTarget {
                rule_id: rule_id.to_string(),
                path: path.to_string(),
            });
        }

        let ctx = TransformContext {
            rule_id,
            file: &file,
            options,
            modules,
        };
        self.registry.run(transform, &ctx).await
    }
}

/// Remove a literal path or every current match of a pattern. Returns how many paths were removed.
async fn remove_pattern(root: &Path, pattern: &str, rule_id: &str) -> Result<usize> {
    let targets = if is_glob_pattern(pattern) {
        expand_pattern(root, pattern, rule_id)?
    } else {
        vec![pattern.to_string()]
    };

    let mut removed = 0;
    for target in &targets {
        let path = resolve_within_root(root, target, rule_id)?;
        if remove_path(&path).await? {
            debug!(rule = rule_id, path = %target, "Removed");
            removed += 1;
        }
    }
    Ok(removed)
}

async fn copy_within_root(root: &Path, from: &str, to: &str, rule_id: &str) -> Result<usize> {
    let source = resolve_within_root(root, from, rule_id)?;
    let destination = resolve_within_root(root, to, rule_id)?;

    if !path_exists(&source).await {
        return Err(RuleError::MissingSource {
            rule_id: rule_id.to_string(),
            path: from.to_string(),
        });
    }
    if path_exists(&destination).await {
        warn!(rule = rule_id, from, to, "Copy destination exists and will be overwritten");
    }

    let copied = copy_path(&source, &destination).await?;
    debug!(rule = rule_id, from, to, files = copied, "Copied");
    Ok(copied)
}

/// Run default and project rules for the Larastack product
pub async fn apply_rules(root: &Path, modules: &ModuleSet) -> Result<RunSummary> {
    RuleEngine::new(LarastackProduct).apply(root, modules).await
}

/// Remove folders and CI workflows of unselected modules, without a manifest
pub async fn prune_for_modules(root: &Path, modules: &ModuleSet) -> Result<RunSummary> {
    RuleEngine::new(LarastackProduct).prune(root, modules).await
}

/// Remove CI workflow files of unselected modules
pub async fn prune_ci_workflows(root: &Path, modules: &ModuleSet) -> Result<RunSummary> {
    RuleEngine::new(LarastackProduct).prune_workflows(root, modules).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::Module;
    use crate::rules::{Clause, Condition, OperationKind};
    use crate::transform::testing::profile_options;
    use crate::transform::Profile;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    fn rule(id: &str, operations: Vec<Operation>) -> Rule {
        Rule {
            id: id.to_string(),
            condition: None,
            operations,
        }
    }

    fn remove(paths: &[&str]) -> Operation {
        Operation::Remove {
            paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn transform(path: &str, transform: TransformerId, profile: Option<Profile>) -> Operation {
        Operation::Transform {
            path: path.to_string(),
            transform,
            options: profile_options(profile),
        }
    }

    #[tokio::test]
    async fn test_every_operation_kind_has_a_handler() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src.txt");
        touch(dir.path(), "routes/web.php");

        let operations = vec![
            remove(&["missing"]),
            Operation::Copy {
                from: "src.txt".to_string(),
                to: "dst.txt".to_string(),
            },
            transform(
                "routes/web.php",
                TransformerId::PhpRoutesWeb,
                Some(Profile::NoFrontend),
            ),
        ];
        let kinds: Vec<OperationKind> = operations.iter().map(Operation::kind).collect();
        assert_eq!(kinds, OperationKind::ALL.to_vec());

        let engine = RuleEngine::new(LarastackProduct);
        let summary = engine
            .run(dir.path(), &ModuleSet::default(), &[rule("all", operations)])
            .await
            .unwrap();
        assert_eq!(summary.files_copied, 1);
        assert_eq!(summary.files_rewritten, 1);
    }

    #[tokio::test]
    async fn test_skipped_rule_has_no_side_effects() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "keep/file.txt");

        let mut skipped = rule("skip", vec![remove(&["keep"])]);
        skipped.condition = Some(Condition {
            all_of: vec![Clause::ModuleSelected(Module::Mobile)],
            ..Default::default()
        });

        let summary = RuleEngine::new(LarastackProduct)
            .run(dir.path(), &"backend".parse().unwrap(), &[skipped])
            .await
            .unwrap();
        assert_eq!(summary.rules_skipped, 1);
        assert!(dir.path().join("keep/file.txt").exists());
    }

    #[tokio::test]
    async fn test_copy_missing_source_names_rule() {
        let dir = TempDir::new().unwrap();
        let op = Operation::Copy {
            from: "nope".to_string(),
            to: "dst".to_string(),
        };
        let err = RuleEngine::new(LarastackProduct)
            .run(dir.path(), &ModuleSet::default(), &[rule("copy-rule", vec![op])])
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Rule \"copy-rule\" copy source does not exist: nope"
        );
    }

    #[tokio::test]
    async fn test_copy_overwrites_destination() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/x.txt");
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/x.txt"), "old").unwrap();
        fs::write(dir.path().join("b/y.txt"), "kept").unwrap();

        let op = Operation::Copy {
            from: "a".to_string(),
            to: "b".to_string(),
        };
        RuleEngine::new(LarastackProduct)
            .run(dir.path(), &ModuleSet::default(), &[rule("c", vec![op])])
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("b/x.txt")).unwrap(), "a/x.txt");
        assert_eq!(fs::read_to_string(dir.path().join("b/y.txt")).unwrap(), "kept");
    }

    #[tokio::test]
    async fn test_escaping_path_is_rejected() {
        let dir = TempDir::new().unwrap();
        for op in [
            remove(&["../outside"]),
            Operation::Copy {
                from: "a".to_string(),
                to: "../../b".to_string(),
            },
            transform("../x", TransformerId::EnvBackend, Some(Profile::NoMobile)),
        ] {
            let err = RuleEngine::new(LarastackProduct)
                .run(dir.path(), &ModuleSet::default(), &[rule("escape", vec![op])])
                .await
                .unwrap_err();
            assert!(
                matches!(err, RuleError::PathEscape { ref rule_id, .. } if rule_id == "escape")
            );
        }
    }

    #[tokio::test]
    async fn test_transform_missing_file() {
        let dir = TempDir::new().unwrap();
        let op = transform(
            "backend/app/Models/User.php",
            TransformerId::PhpUser,
            Some(Profile::NoMobile),
        );
        let err = RuleEngine::new(LarastackProduct)
            .run(dir.path(), &ModuleSet::default(), &[rule("t", vec![op])])
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Rule \"t\" transform file does not exist: backend/app/Models/User.php"
        );
    }

    #[tokio::test]
    async fn test_unreadable_target_names_rule_and_operation() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("backend/config/services.php")).unwrap();

        let operations = vec![
            remove(&["nothing-here"]),
            transform(
                "backend/config/services.php",
                TransformerId::PhpConfigServices,
                Some(Profile::NoMobile),
            ),
        ];
        let err = RuleEngine::new(LarastackProduct)
            .run(
                dir.path(),
                &ModuleSet::default(),
                &[rule("services", operations)],
            )
            .await
            .unwrap_err();

        match &err {
            RuleError::Operation {
                rule_id,
                index,
                source,
            } => {
                assert_eq!(rule_id, "services");
                assert_eq!(*index, 1);
                assert!(matches!(**source, RuleError::Io { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err
            .to_string()
            .starts_with("Rule \"services\" operations[1] failed: "));
    }

    #[tokio::test]
    async fn test_malformed_json_target_names_rule_and_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "{").unwrap();

        let op = transform("bad.json", TransformerId::JsonOpencode, None);
        let err = RuleEngine::new(LarastackProduct)
            .run(dir.path(), &ModuleSet::default(), &[rule("opencode", vec![op])])
            .await
            .unwrap_err();

        match &err {
            RuleError::Parse { rule_id, file, .. } => {
                assert_eq!(rule_id, "opencode");
                assert!(file.ends_with("bad.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("Rule \"opencode\" could not parse "));
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = RunSummary {
            rules_matched: 2,
            files_rewritten: 1,
            ..Default::default()
        };
        let value = serde_json::to_value(summary).unwrap();
        assert_eq!(value["rulesMatched"], 2);
        assert_eq!(value["filesRewritten"], 1);
        assert_eq!(value["pathsRemoved"], 0);
    }

    #[tokio::test]
    async fn test_prune_workflows_keeps_folders() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "mobile/app.json");
        touch(dir.path(), ".github/workflows/mobile-ci.yml");
        touch(dir.path(), ".github/workflows/backend-ci.yaml");

        prune_ci_workflows(dir.path(), &"backend".parse().unwrap())
            .await
            .unwrap();

        assert!(dir.path().join("mobile/app.json").exists());
        assert!(!dir.path().join(".github/workflows/mobile-ci.yml").exists());
        assert!(dir.path().join(".github/workflows/backend-ci.yaml").exists());
    }
}
