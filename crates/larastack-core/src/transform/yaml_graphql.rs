//! `yaml.graphql.syncProjects`: one GraphQL config project per selected module

use super::TransformContext;
use crate::error::{Result, RuleError};
use crate::modules::Module;
use serde_yaml::{Mapping, Value};

fn strings(items: &[&str]) -> Value {
    Value::Sequence(items.iter().map(|s| Value::from(*s)).collect())
}

fn project(module: Module) -> Mapping {
    let mut project = Mapping::new();
    match module {
        Module::Frontend => {
            project.insert(
                "schema".into(),
                strings(&["./frontend/client.schema.graphql", "./frontend/schema.graphql"]),
            );
            project.insert("documents".into(), "./frontend/**/*.graphql".into());
        }
        Module::Backend => {
            project.insert(
                "include".into(),
                strings(&[
                    "./backend/schema-directives.graphql",
                    "./backend/programmatic-types.graphql",
                    "./backend/graphql/**/*.graphql",
                ]),
            );
            project.insert("schema".into(), "./backend/graphql/schema.graphql".into());
        }
        Module::Mobile => {
            project.insert(
                "schema".into(),
                strings(&["./mobile/client.schema.graphql", "./mobile/schema.graphql"]),
            );
            project.insert(
                "documents".into(),
                strings(&[
                    "./mobile/src/**/*.ts",
                    "./mobile/src/**/*.tsx",
                    "./mobile/src/**/*.graphql",
                ]),
            );
        }
    }
    project
}

pub fn apply(ctx: &TransformContext<'_>, source: &str) -> Result<String> {
    let yaml_error = |source: serde_yaml::Error| RuleError::Yaml {
        path: ctx.file.to_path_buf(),
        source,
    };

    let parsed = serde_yaml::from_str::<Value>(source).map_err(|e| ctx.parse_error(e))?;
    let mut config = match parsed {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => return Err(ctx.not_found("top-level mapping")),
    };

    let projects: Mapping = Module::ALL
        .into_iter()
        .filter(|module| ctx.modules.contains(*module))
        .map(|module| (Value::from(module.id()), Value::Mapping(project(module))))
        .collect();
    config.insert("projects".into(), Value::Mapping(projects));

    serde_yaml::to_string(&config).map_err(yaml_error)
}
