//! Rule manifest loading and validation
//!
//! The manifest is checked in full before anything touches the filesystem.
//! Error messages name the manifest and the failing location, for example
//! `rules[2].operations[0].transform must be one of ...`.

use super::{Clause, Condition, Operation, OperationKind, Rule};
use crate::error::{Result, RuleError};
use crate::modules::Module;
use crate::product::ProductConfig;
use crate::transform::{TransformerId, TransformerRegistry};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Only supported manifest schema version
pub const MANIFEST_VERSION: u64 = 1;

/// Load project rules from the product's manifest. A missing manifest yields no rules.
pub async fn load_rules<C: ProductConfig>(
    root: &Path,
    product: &C,
    registry: &TransformerRegistry,
) -> Result<Vec<Rule>> {
    let manifest = product.manifest_path();
    let path = root.join(&manifest);

    let text = match fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(manifest = %manifest, "No rule manifest, using default rules only");
            return Ok(Vec::new());
        }
        Err(e) => return Err(RuleError::io(path, e)),
    };

    let rules = parse_manifest(&text, &manifest, registry)?;
    info!(manifest = %manifest, rules = rules.len(), "Loaded rule manifest");
    Ok(rules)
}

/// Parse and validate manifest text. `manifest` is the name used in error messages.
pub fn parse_manifest(
    text: &str,
    manifest: &str,
    registry: &TransformerRegistry,
) -> Result<Vec<Rule>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| RuleError::validation(manifest, format!("invalid JSON ({}).", e)))?;

    Validator { manifest, registry }.manifest(&value)
}

struct Validator<'a> {
    manifest: &'a str,
    registry: &'a TransformerRegistry,
}

impl Validator<'_> {
    fn fail<T>(&self, message: impl Into<String>) -> Result<T> {
        Err(RuleError::validation(self.manifest, message))
    }

    fn manifest(&self, value: &Value) -> Result<Vec<Rule>> {
        let Some(object) = value.as_object() else {
            return self.fail("expected an object.");
        };

        if object.get("version").and_then(Value::as_u64) != Some(MANIFEST_VERSION) {
            return self.fail(format!("version must be {}.", MANIFEST_VERSION));
        }

        let Some(rules) = object.get("rules").and_then(Value::as_array) else {
            return self.fail("rules must be an array.");
        };

        let mut seen = HashSet::new();
        rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                let rule = self.rule(rule, index)?;
                if !seen.insert(rule.id.clone()) {
                    return self.fail(format!("duplicate rule id \"{}\".", rule.id));
                }
                Ok(rule)
            })
            .collect()
    }

    fn rule(&self, value: &Value, index: usize) -> Result<Rule> {
        let at = format!("rules[{}]", index);
        let Some(object) = value.as_object() else {
            return self.fail(format!("{} must be an object.", at));
        };

        let id = object
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if id.is_empty() {
            return self.fail(format!("{}.id is required.", at));
        }

        let condition = match object.get("when") {
            None => None,
            Some(when) => Some(self.condition(when, &at)?),
        };

        let operations = match object.get("operations").and_then(Value::as_array) {
            Some(operations) if !operations.is_empty() => operations
                .iter()
                .enumerate()
                .map(|(j, op)| self.operation(op, &format!("{}.operations[{}]", at, j)))
                .collect::<Result<Vec<_>>>()?,
            _ => return self.fail(format!("{}.operations must be a non-empty array.", at)),
        };

        Ok(Rule {
            id: id.to_string(),
            condition,
            operations,
        })
    }

    fn condition(&self, value: &Value, rule_at: &str) -> Result<Condition> {
        let at = format!("{}.when", rule_at);
        let Some(object) = value.as_object() else {
            return self.fail(format!("{} must be an object.", at));
        };

        Ok(Condition {
            all_of: self.clauses(object, "allOf", &at)?,
            any_of: self.clauses(object, "anyOf", &at)?,
            none_of: self.clauses(object, "noneOf", &at)?,
        })
    }

    fn clauses(
        &self,
        object: &Map<String, Value>,
        field: &str,
        when_at: &str,
    ) -> Result<Vec<Clause>> {
        let at = format!("{}.{}", when_at, field);
        let Some(value) = object.get(field) else {
            return Ok(Vec::new());
        };
        let Some(list) = value.as_array() else {
            return self.fail(format!("{} must be an array.", at));
        };

        list.iter()
            .enumerate()
            .map(|(k, clause)| self.clause(clause, &format!("{}[{}]", at, k)))
            .collect()
    }

    fn clause(&self, value: &Value, at: &str) -> Result<Clause> {
        let Some(object) = value.as_object() else {
            return self.fail(format!("{} must be an object.", at));
        };

        // `app*` keys are accepted as aliases of the `module*` keys.
        let keys: [(&str, fn(Module) -> Clause); 4] = [
            ("moduleSelected", Clause::ModuleSelected),
            ("appSelected", Clause::ModuleSelected),
            ("moduleNotSelected", Clause::ModuleNotSelected),
            ("appNotSelected", Clause::ModuleNotSelected),
        ];

        for (key, build) in keys {
            if let Some(id) = object.get(key).and_then(Value::as_str) {
                return match Module::parse(id) {
                    Some(module) => Ok(build(module)),
                    None => self.fail(format!(
                        "{}.{} must be one of {}.",
                        at,
                        key,
                        Module::allowed_ids()
                    )),
                };
            }
        }

        self.fail(format!("{} must define moduleSelected or moduleNotSelected.", at))
    }

    fn operation(&self, value: &Value, at: &str) -> Result<Operation> {
        let Some(object) = value.as_object() else {
            return self.fail(format!("{} must be an object.", at));
        };

        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .and_then(OperationKind::parse);

        match kind {
            Some(OperationKind::Remove) => self.remove(object, at),
            Some(OperationKind::Copy) => self.copy(object, at),
            Some(OperationKind::Transform) => self.transform(object, at),
            None => self.fail(format!(
                "{}.type must be \"remove\", \"copy\" or \"transform\".",
                at
            )),
        }
    }

    fn remove(&self, object: &Map<String, Value>, at: &str) -> Result<Operation> {
        let paths: Option<Vec<&str>> = object
            .get("paths")
            .and_then(Value::as_array)
            .filter(|paths| !paths.is_empty())
            .and_then(|paths| paths.iter().map(Value::as_str).collect());

        let Some(paths) = paths else {
            return self.fail(format!("{}.paths must be a non-empty string array.", at));
        };

        let paths: Vec<String> = paths.into_iter().map(|p| p.trim().to_string()).collect();
        if paths.iter().any(|p| !is_usable_path(p)) {
            return self.fail(format!("{}.paths cannot contain empty values or \".\".", at));
        }

        Ok(Operation::Remove { paths })
    }

    fn copy(&self, object: &Map<String, Value>, at: &str) -> Result<Operation> {
        let from = object.get("from").and_then(Value::as_str);
        let to = object.get("to").and_then(Value::as_str);

        let (Some(from), Some(to)) = (from, to) else {
            return self.fail(format!("{} copy operation requires from and to strings.", at));
        };

        let (from, to) = (from.trim(), to.trim());
        if !is_usable_path(from) || !is_usable_path(to) {
            return self.fail(format!(
                "{} copy operation from/to cannot be empty or \".\".",
                at
            ));
        }

        Ok(Operation::Copy {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    fn transform(&self, object: &Map<String, Value>, at: &str) -> Result<Operation> {
        let path = object.get("path").and_then(Value::as_str).map(str::trim);
        let path = match path {
            Some(path) if is_usable_path(path) => path.to_string(),
            Some(_) => return self.fail(format!("{}.path cannot be empty or \".\".", at)),
            None => return self.fail(format!("{}.path must be a string.", at)),
        };

        let transform = object
            .get("transform")
            .and_then(Value::as_str)
            .and_then(|id| TransformerId::parse(id.trim()));
        let Some(transform) = transform else {
            return self.fail(format!(
                "{}.transform must be one of {}.",
                at,
                TransformerId::allowed_ids()
            ));
        };

        let options = match object.get("options") {
            None => Map::new(),
            Some(Value::Object(options)) => options.clone(),
            Some(_) => return self.fail(format!("{}.options must be an object.", at)),
        };

        if let Err(message) = self.registry.check_options(transform, Some(&options)) {
            return self.fail(format!("{}.{}", at, message));
        }

        Ok(Operation::Transform {
            path,
            transform,
            options,
        })
    }
}

/// Non-empty and not the project root itself, so `./` and `backend/..` are
/// rejected like `.`. Paths that climb out of the root are left to the
/// containment check at execution time.
fn is_usable_path(path: &str) -> bool {
    let mut depth = 0usize;
    let mut escapes = false;
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => match depth.checked_sub(1) {
                Some(parent) => depth = parent,
                None => escapes = true,
            },
            _ => depth += 1,
        }
    }
    depth > 0 || escapes
}
