//! Error types for rule loading and execution
//!
//! Every failure is fatal to a generation run. Variants carry the rule id and
//! path needed to find the offending manifest entry or template file.

use crate::source::edit::EditError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rule engine operations
pub type Result<T> = std::result::Result<T, RuleError>;

/// Main error type for the rule engine
#[derive(Error, Debug)]
pub enum RuleError {
    /// Malformed manifest; raised before any filesystem mutation
    #[error("Invalid {manifest}: {message}")]
    Validation { manifest: String, message: String },

    /// A rule path resolves outside the project root
    #[error("Rule \"{rule_id}\" points outside target directory: {path}")]
    PathEscape { rule_id: String, path: String },

    /// A `copy` source does not exist
    #[error("Rule \"{rule_id}\" copy source does not exist: {path}")]
    MissingSource { rule_id: String, path: String },

    /// A `transform` target does not exist
    #[error("Rule \"{rule_id}\" transform file does not exist: {path}")]
    MissingTransformTarget { rule_id: String, path: String },

    /// A `remove` pattern could not be compiled
    #[error("Rule \"{rule_id}\" has an invalid path pattern {pattern}: {message}")]
    InvalidGlob {
        rule_id: String,
        pattern: String,
        message: String,
    },

    /// The structural reader rejected a transform target
    #[error("Rule \"{rule_id}\" could not parse {file}: {message}")]
    Parse {
        rule_id: String,
        file: PathBuf,
        message: String,
    },

    /// A construct a transform depends on is absent from its target
    #[error("Rule \"{rule_id}\" could not find {construct} in {file}")]
    StructuralNotFound {
        rule_id: String,
        file: PathBuf,
        construct: String,
    },

    /// A transform produced overlapping edits
    #[error(transparent)]
    Edit(#[from] EditError),

    /// A failure without rule context, raised while running one operation
    #[error("Rule \"{rule_id}\" operations[{index}] failed: {source}")]
    Operation {
        rule_id: String,
        index: usize,
        #[source]
        source: Box<RuleError>,
    },

    /// Filesystem failure on a specific path
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON transform target could not be read or written
    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// YAML transform target could not be read or written
    #[error("YAML error in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl RuleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RuleError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn validation(manifest: &str, message: impl Into<String>) -> Self {
        RuleError::Validation {
            manifest: manifest.to_string(),
            message: message.into(),
        }
    }

    /// Attach the rule id and operation index to errors that do not name a rule
    pub(crate) fn in_operation(self, rule_id: &str, index: usize) -> Self {
        match self {
            RuleError::Edit(_)
            | RuleError::Io { .. }
            | RuleError::Json { .. }
            | RuleError::Yaml { .. } => RuleError::Operation {
                rule_id: rule_id.to_string(),
                index,
                source: Box::new(self),
            },
            other => other,
        }
    }

    /// Whether this error was raised while validating the manifest
    pub fn is_validation(&self) -> bool {
        matches!(self, RuleError::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_manifest() {
        let err = RuleError::validation(".create-larastack/rules.json", "version must be 1.");
        assert_eq!(
            err.to_string(),
            "Invalid .create-larastack/rules.json: version must be 1."
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_operation_context_wraps_anonymous_errors() {
        let io = RuleError::io("backend/config", std::io::Error::other("Is a directory"));
        let err = io.in_operation("services", 1);
        assert_eq!(
            err.to_string(),
            "Rule \"services\" operations[1] failed: IO error on backend/config: Is a directory"
        );
        assert!(std::error::Error::source(&err).is_some());

        let overlap = RuleError::Edit(EditError::OutOfBounds {
            span: crate::source::Span::new(4, 9),
            len: 2,
        });
        match overlap.in_operation("user", 0) {
            RuleError::Operation {
                rule_id,
                index,
                source,
            } => {
                assert_eq!(rule_id, "user");
                assert_eq!(index, 0);
                assert!(matches!(*source, RuleError::Edit(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_operation_context_keeps_named_errors() {
        let err = RuleError::MissingSource {
            rule_id: "copy-env".to_string(),
            path: "env".to_string(),
        }
        .in_operation("copy-env", 0);
        assert!(matches!(err, RuleError::MissingSource { .. }));
    }

    #[test]
    fn test_path_escape_names_rule_and_path() {
        let err = RuleError::PathEscape {
            rule_id: "copy-env".to_string(),
            path: "../outside".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("copy-env"));
        assert!(msg.contains("../outside"));
        assert!(!err.is_validation());
    }
}
