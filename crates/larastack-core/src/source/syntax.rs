//! Generic syntax tree produced from tree-sitter parses
//!
//! The tree-sitter tree borrows its parser state, so it is converted once into
//! an owned [`SyntaxNode`] tree: a kind tag, the byte span, the field name the
//! node occupies in its parent, and its children. Transforms only query this
//! tree; edits are expressed against the original text.

use crate::source::edit::Span;
use thiserror::Error;
use tree_sitter::{Parser, TreeCursor};

/// Node kind for comments, skipped by [`SyntaxNode::named_children`]
const COMMENT: &str = "comment";

/// Languages the reader can parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    Php,
}

impl SourceLanguage {
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceLanguage::Php => "PHP",
        }
    }

    fn grammar(&self) -> tree_sitter::Language {
        match self {
            SourceLanguage::Php => tree_sitter_php::LANGUAGE_PHP.into(),
        }
    }
}

/// Errors from the structural reader
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("Failed to initialize grammar: {0}")]
    LanguageInit(String),

    #[error("Failed to parse code")]
    ParseFailed,

    /// The source has syntax errors; `line` is 1-based
    #[error("Syntax error at line {line}, column {column}")]
    Invalid { line: usize, column: usize },
}

/// One node of a parsed source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: &'static str,
    named: bool,
    field: Option<&'static str>,
    span: Span,
    children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// False for punctuation and keywords
    pub fn is_named(&self) -> bool {
        self.named
    }

    /// Field name this node occupies in its parent, if any
    pub fn field_name(&self) -> Option<&'static str> {
        self.field
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.span.slice(source)
    }

    /// All children, including anonymous tokens
    pub fn children(&self) -> &[SyntaxNode] {
        &self.children
    }

    /// Named children, excluding comments
    pub fn named_children(&self) -> impl Iterator<Item = &SyntaxNode> + '_ {
        self.children
            .iter()
            .filter(|child| child.named && child.kind != COMMENT)
    }

    /// First child stored under `name`
    pub fn field(&self, name: &str) -> Option<&SyntaxNode> {
        self.children
            .iter()
            .find(|child| child.field == Some(name))
    }

    /// First named child of the given kind
    pub fn child_of_kind(&self, kind: &str) -> Option<&SyntaxNode> {
        self.named_children().find(|child| child.kind == kind)
    }

    /// Whether an anonymous token with this text is a direct child (`=>`, `,` ...)
    pub fn has_token(&self, token: &str) -> bool {
        self.children
            .iter()
            .any(|child| !child.named && child.kind == token)
    }

    /// Depth-first pre-order walk over this node and every descendant
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a SyntaxNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Every node in the subtree, in pre-order, for which `predicate` holds
    pub fn find_all<'a, P>(&'a self, predicate: P) -> Vec<&'a SyntaxNode>
    where
        P: Fn(&SyntaxNode) -> bool,
    {
        let mut matches = Vec::new();
        self.walk(&mut |node| {
            if predicate(node) {
                matches.push(node);
            }
        });
        matches
    }

    /// First node in pre-order for which `predicate` holds
    pub fn find_first<P>(&self, predicate: P) -> Option<&SyntaxNode>
    where
        P: Fn(&SyntaxNode) -> bool + Copy,
    {
        if predicate(self) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_first(predicate))
    }

    /// Every node of the given kind in the subtree
    pub fn find_kind(&self, kind: &str) -> Vec<&SyntaxNode> {
        self.find_all(|node| node.kind == kind)
    }

    fn has_error(&self) -> bool {
        self.kind == "ERROR" || self.children.iter().any(SyntaxNode::has_error)
    }
}

/// Parse `source` into an owned syntax tree. Sources with syntax errors are rejected.
pub fn parse(source: &str, language: SourceLanguage) -> Result<SyntaxNode, SyntaxError> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| SyntaxError::LanguageInit(e.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or(SyntaxError::ParseFailed)?;
    let root = tree.root_node();

    if root.has_error() {
        let mut position = root.start_position();
        let mut cursor = root.walk();
        if let Some(bad) = first_error(&mut cursor) {
            position = bad;
        }
        return Err(SyntaxError::Invalid {
            line: position.row + 1,
            column: position.column + 1,
        });
    }

    let mut cursor = root.walk();
    let node = convert(&mut cursor);
    debug_assert!(!node.has_error());
    Ok(node)
}

/// Parse PHP source
pub fn parse_php(source: &str) -> Result<SyntaxNode, SyntaxError> {
    parse(source, SourceLanguage::Php)
}

fn convert(cursor: &mut TreeCursor<'_>) -> SyntaxNode {
    let node = cursor.node();
    let mut children = Vec::new();

    if cursor.goto_first_child() {
        loop {
            let field = cursor.field_name();
            let mut child = convert(cursor);
            child.field = field;
            children.push(child);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }

    SyntaxNode {
        kind: node.kind(),
        named: node.is_named(),
        field: None,
        span: Span::new(node.start_byte(), node.end_byte()),
        children,
    }
}

fn first_error(cursor: &mut TreeCursor<'_>) -> Option<tree_sitter::Point> {
    let node = cursor.node();
    if node.is_error() || node.is_missing() {
        return Some(node.start_position());
    }
    if !node.has_error() {
        return None;
    }
    if cursor.goto_first_child() {
        loop {
            if let Some(point) = first_error(cursor) {
                cursor.goto_parent();
                return Some(point);
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
    None
}
