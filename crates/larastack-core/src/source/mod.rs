//! Structural source reading and format-preserving edits
//!
//! This module provides:
//! - An owned syntax tree built from tree-sitter parses, with predicate search
//! - Byte-range edit sets applied against the untouched original text
//! - Whole-line span helpers for deleting statements without leaving gaps
//! - PHP queries (classes, traits, imports, arrays, routes, migrations)

pub mod edit;
pub mod lines;
pub mod php;
pub mod syntax;

pub use edit::{Edit, EditAction, EditError, EditSet, Span};
pub use syntax::{parse, parse_php, SourceLanguage, SyntaxError, SyntaxNode};
