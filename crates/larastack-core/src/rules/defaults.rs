//! Built-in rules that run before any project-supplied rule

use super::{Clause, Condition, Operation, Rule};
use crate::modules::Module;
use crate::product::ProductConfig;

fn when_not_selected(module: Module) -> Option<Condition> {
    Some(Condition {
        all_of: vec![Clause::ModuleNotSelected(module)],
        ..Default::default()
    })
}

/// One rule per module removing its folder and CI workflow files when it is not selected
pub fn default_rules<C: ProductConfig>(product: &C) -> Vec<Rule> {
    Module::ALL
        .into_iter()
        .map(|module| {
            let mut paths = vec![module.id().to_string()];
            paths.extend(product.workflow_paths(module));

            Rule {
                id: format!("remove-{}-files-when-not-selected", module.id()),
                condition: when_not_selected(module),
                operations: vec![Operation::Remove { paths }],
            }
        })
        .collect()
}

/// One rule per module removing only its CI workflow files when it is not selected
pub fn workflow_rules<C: ProductConfig>(product: &C) -> Vec<Rule> {
    Module::ALL
        .into_iter()
        .map(|module| Rule {
            id: format!("remove-{}-workflows-when-not-selected", module.id()),
            condition: when_not_selected(module),
            operations: vec![Operation::Remove {
                paths: product.workflow_paths(module),
            }],
        })
        .collect()
}
