//! Named, registered file transforms
//!
//! This module provides:
//! - The closed set of transformer identifiers a manifest may name
//! - Behaviour profiles selected through `options.profile`
//! - [`TransformerRegistry`], the immutable id-to-function mapping the engine runs
//! - One submodule per transform; each is a pure `source -> output` function

pub mod env_backend;
pub mod json_opencode;
pub mod php_config_services;
pub mod php_migration_users;
pub mod php_routes_api;
pub mod php_routes_web;
pub mod php_user;
pub mod registry;
pub mod yaml_graphql;

use crate::error::{Result, RuleError};
use crate::modules::ModuleSet;
use crate::source::{parse_php, SyntaxNode};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

pub use registry::{TransformFn, TransformerEntry, TransformerRegistry};

/// Identifier of a registered transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransformerId {
    PhpUser,
    PhpRoutesApi,
    PhpRoutesWeb,
    PhpMigrationUsers,
    PhpConfigServices,
    EnvBackend,
    YamlGraphql,
    JsonOpencode,
}

impl TransformerId {
    pub const ALL: [TransformerId; 8] = [
        TransformerId::PhpUser,
        TransformerId::PhpRoutesApi,
        TransformerId::PhpRoutesWeb,
        TransformerId::PhpMigrationUsers,
        TransformerId::PhpConfigServices,
        TransformerId::EnvBackend,
        TransformerId::YamlGraphql,
        TransformerId::JsonOpencode,
    ];

    /// Identifier as written in a manifest
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformerId::PhpUser => "php.user.applyProfile",
            TransformerId::PhpRoutesApi => "php.routes.api.applyProfile",
            TransformerId::PhpRoutesWeb => "php.routes.web.applyProfile",
            TransformerId::PhpMigrationUsers => "php.migration.users.applyProfile",
            TransformerId::PhpConfigServices => "php.config.services.applyProfile",
            TransformerId::EnvBackend => "env.backend.applyProfile",
            TransformerId::YamlGraphql => "yaml.graphql.syncProjects",
            TransformerId::JsonOpencode => "json.opencode.syncMcp",
        }
    }

    pub fn parse(s: &str) -> Option<TransformerId> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }

    /// Every identifier, comma separated, for error messages
    pub fn allowed_ids() -> String {
        Self::ALL
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for TransformerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behaviour variant of a profile-driven transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    NoMobile,
    NoFrontend,
    BackendOnly,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::NoMobile => "no-mobile",
            Profile::NoFrontend => "no-frontend",
            Profile::BackendOnly => "backend-only",
        }
    }

    pub fn parse(s: &str) -> Option<Profile> {
        [Profile::NoMobile, Profile::NoFrontend, Profile::BackendOnly]
            .into_iter()
            .find(|p| p.as_str() == s)
    }

    /// Quoted, comma separated list, e.g. `"no-mobile", "backend-only"`
    pub fn quoted_list(profiles: &[Profile]) -> String {
        profiles
            .iter()
            .map(|p| format!("\"{}\"", p.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a transform knows about the file it is rewriting
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub rule_id: &'a str,
    pub file: &'a Path,
    /// The operation's `options` object, as written in the manifest
    pub options: &'a Map<String, Value>,
    pub modules: &'a ModuleSet,
}

impl<'a> TransformContext<'a> {
    /// `options.profile`, when present and known
    pub fn profile(&self) -> Option<Profile> {
        self.options
            .get("profile")
            .and_then(Value::as_str)
            .and_then(Profile::parse)
    }

    /// The profile, which must be one of `allowed`
    pub fn require_profile(&self, allowed: &[Profile]) -> Result<Profile> {
        match self.profile() {
            Some(profile) if allowed.contains(&profile) => Ok(profile),
            _ => Err(RuleError::Validation {
                manifest: format!("transform options for rule \"{}\"", self.rule_id),
                message: format!(
                    "options.profile must be one of {}.",
                    Profile::quoted_list(allowed)
                ),
            }),
        }
    }

    /// Parse the file as PHP, attributing failures to this rule
    pub fn parse_php(&self, source: &str) -> Result<SyntaxNode> {
        parse_php(source).map_err(|e| self.parse_error(e))
    }

    /// The file could not be read as the format this transform expects
    pub fn parse_error(&self, message: impl fmt::Display) -> RuleError {
        RuleError::Parse {
            rule_id: self.rule_id.to_string(),
            file: self.file.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn not_found(&self, construct: &str) -> RuleError {
        RuleError::StructuralNotFound {
            rule_id: self.rule_id.to_string(),
            file: self.file.to_path_buf(),
            construct: construct.to_string(),
        }
    }
}
