//! Line-oriented span helpers

use crate::source::edit::Span;

/// Offset of the first byte of the line containing `offset`
pub fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Offset just past the newline ending the line containing `offset`, or the
/// end of the buffer when that line has no newline
pub fn line_end(source: &str, offset: usize) -> usize {
    source[offset..]
        .find('\n')
        .map_or(source.len(), |i| offset + i + 1)
}

/// Extend `span` to cover every full source line it touches, including the
/// trailing newline. Used to delete a statement without leaving a blank line.
pub fn whole_line_span(source: &str, span: Span) -> Span {
    Span::new(line_start(source, span.start), line_end(source, span.end))
}

/// Whether any newline lies in `[from, to)`
pub fn has_newline(source: &str, from: usize, to: usize) -> bool {
    from < to && source[from..to].contains('\n')
}

/// Leading whitespace of the line containing `offset`
pub fn indentation_at(source: &str, offset: usize) -> &str {
    let start = line_start(source, offset);
    let line = &source[start..line_end(source, offset)];
    let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..indent_len]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "first\n    second line\nthird";

    #[test]
    fn test_line_bounds() {
        assert_eq!(line_start(SRC, 0), 0);
        assert_eq!(line_start(SRC, 10), 6);
        assert_eq!(line_end(SRC, 10), 22);
        assert_eq!(line_end(SRC, 23), SRC.len());
    }

    #[test]
    fn test_whole_line_span_covers_newline() {
        // "second" starts at 10 and ends at 16
        let span = whole_line_span(SRC, Span::new(10, 16));
        assert_eq!(span.slice(SRC), "    second line\n");
    }

    #[test]
    fn test_whole_line_span_at_end_without_newline() {
        let span = whole_line_span(SRC, Span::new(22, 27));
        assert_eq!(span.slice(SRC), "third");
    }

    #[test]
    fn test_whole_line_span_multiline() {
        let span = whole_line_span(SRC, Span::new(2, 12));
        assert_eq!(span.slice(SRC), "first\n    second line\n");
    }

    #[test]
    fn test_indentation_at() {
        assert_eq!(indentation_at(SRC, 14), "    ");
        assert_eq!(indentation_at(SRC, 2), "");
        assert_eq!(indentation_at("\t\tx", 2), "\t\t");
    }

    #[test]
    fn test_has_newline() {
        assert!(has_newline(SRC, 0, 10));
        assert!(!has_newline(SRC, 6, 20));
        assert!(!has_newline(SRC, 5, 5));
    }
}
