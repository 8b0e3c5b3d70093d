//! Byte-range edits applied against an unmodified original buffer
//!
//! Transforms never mutate text in place. They collect [`Edit`]s that refer
//! to spans of the original source and apply them in one pass. Every byte
//! outside an edited span is copied through untouched.

use std::fmt;
use thiserror::Error;

/// Half-open byte range `[start, end)` into a text buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start after end");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Slice `source` by this span
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// What to do with a span
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    Delete,
    Replace(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Span,
    pub action: EditAction,
}

/// Errors raised when an edit set cannot be applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("overlapping edits at {first} and {second}")]
    Overlap { first: Span, second: Span },

    #[error("edit span {span} is outside the {len}-byte buffer")]
    OutOfBounds { span: Span, len: usize },

    #[error("edit span {span} does not fall on a character boundary")]
    NotCharBoundary { span: Span },
}

/// An ordered collection of non-overlapping edits against one buffer
#[derive(Debug, Clone, Default)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delete(&mut self, span: Span) {
        self.edits.push(Edit {
            span,
            action: EditAction::Delete,
        });
    }

    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.edits.push(Edit {
            span,
            action: EditAction::Replace(text.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Produce the edited text. `original` is only read.
    ///
    /// Identical edits recorded more than once (for example two entries
    /// sharing a line that both resolve to the same whole-line deletion)
    /// are applied once. Any other overlap is an error.
    pub fn apply(&self, original: &str) -> Result<String, EditError> {
        let mut edits: Vec<&Edit> = self.edits.iter().collect();
        edits.sort_by_key(|edit| (edit.span.start, edit.span.end));
        edits.dedup();

        for edit in &edits {
            if edit.span.end > original.len() {
                return Err(EditError::OutOfBounds {
                    span: edit.span,
                    len: original.len(),
                });
            }
            if !original.is_char_boundary(edit.span.start)
                || !original.is_char_boundary(edit.span.end)
            {
                return Err(EditError::NotCharBoundary { span: edit.span });
            }
        }

        for pair in edits.windows(2) {
            let (first, second) = (pair[0].span, pair[1].span);
            // Two insertions at the same point are ambiguous too.
            if first.overlaps(&second) || (first == second && first.is_empty()) {
                return Err(EditError::Overlap { first, second });
            }
        }

        let mut output = String::with_capacity(original.len());
        let mut cursor = 0;
        for edit in edits {
            output.push_str(&original[cursor..edit.span.start]);
            if let EditAction::Replace(text) = &edit.action {
                output.push_str(text);
            }
            cursor = edit.span.end;
        }
        output.push_str(&original[cursor..]);

        Ok(output)
    }
}
