//! Immutable mapping from transformer id to transform function

use super::{
    env_backend, json_opencode, php_config_services, php_migration_users, php_routes_api,
    php_routes_web, php_user, yaml_graphql, Profile, TransformContext, TransformerId,
};
use crate::error::{Result, RuleError};
use crate::files::{read_text, write_if_changed};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Pure transform: original file content in, rewritten content out
pub type TransformFn = fn(&TransformContext<'_>, &str) -> Result<String>;

/// Transforms that take no `options.profile`
const NO_PROFILES: &[Profile] = &[];

/// One registered transform
#[derive(Clone, Copy)]
pub struct TransformerEntry {
    pub id: TransformerId,
    /// Accepted `options.profile` values; empty when the transform takes no profile
    pub profiles: &'static [Profile],
    pub apply: TransformFn,
}

impl fmt::Debug for TransformerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerEntry")
            .field("id", &self.id)
            .field("profiles", &self.profiles)
            .finish_non_exhaustive()
    }
}

/// Registered transforms, built once and handed to the engine
#[derive(Debug, Clone)]
pub struct TransformerRegistry {
    entries: BTreeMap<TransformerId, TransformerEntry>,
}

impl TransformerRegistry {
    /// Registry holding every built-in transform
    pub fn builtin() -> Self {
        let entries = [
            (TransformerId::PhpUser, php_user::PROFILES, php_user::apply as TransformFn),
            (TransformerId::PhpRoutesApi, php_routes_api::PROFILES, php_routes_api::apply),
            (TransformerId::PhpRoutesWeb, php_routes_web::PROFILES, php_routes_web::apply),
            (
                TransformerId::PhpMigrationUsers,
                php_migration_users::PROFILES,
                php_migration_users::apply,
            ),
            (
                TransformerId::PhpConfigServices,
                php_config_services::PROFILES,
                php_config_services::apply,
            ),
            (TransformerId::EnvBackend, env_backend::PROFILES, env_backend::apply),
            (TransformerId::YamlGraphql, NO_PROFILES, yaml_graphql::apply),
            (TransformerId::JsonOpencode, NO_PROFILES, json_opencode::apply),
        ]
        .into_iter()
        .map(|(id, profiles, apply)| {
            (
                id,
                TransformerEntry {
                    id,
                    profiles,
                    apply,
                },
            )
        })
        .collect();

        Self { entries }
    }

    pub fn get(&self, id: TransformerId) -> Option<&TransformerEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check `options` for a transform and extract its profile. The error is
    /// the failing field and reason, relative to the operation.
    pub fn check_options(
        &self,
        id: TransformerId,
        options: Option<&Map<String, Value>>,
    ) -> std::result::Result<Option<Profile>, String> {
        let entry = self
            .get(id)
            .ok_or_else(|| format!("transform {} is not registered.", id))?;

        if entry.profiles.is_empty() {
            return Ok(None);
        }

        let allowed = Profile::quoted_list(entry.profiles);
        let profile = options
            .and_then(|options| options.get("profile"))
            .and_then(Value::as_str)
            .and_then(Profile::parse)
            .filter(|profile| entry.profiles.contains(profile));

        match profile {
            Some(profile) => Ok(Some(profile)),
            None => Err(format!("options.profile must be one of {}.", allowed)),
        }
    }

    /// Read the context's file, run the transform and write the result back
    /// when it differs. Returns whether the file was rewritten.
    pub async fn run(&self, id: TransformerId, ctx: &TransformContext<'_>) -> Result<bool> {
        let entry = self.get(id).ok_or_else(|| RuleError::Validation {
            manifest: "transformer registry".to_string(),
            message: format!("transform must be one of {}.", TransformerId::allowed_ids()),
        })?;

        let source = read_text(ctx.file)
            .await
            .map_err(|e| RuleError::io(ctx.file, e))?;
        let output = (entry.apply)(ctx, &source)?;

        let written = write_if_changed(ctx.file, &source, &output).await?;
        if written {
            info!(
                rule = ctx.rule_id,
                transform = %id,
                file = %ctx.file.display(),
                "Rewrote file"
            );
        } else {
            debug!(
                rule = ctx.rule_id,
                transform = %id,
                file = %ctx.file.display(),
                "Already up to date"
            );
        }
        Ok(written)
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
