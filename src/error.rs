//! The parser's structured error type.

use std::fmt;

/// The four error kinds spec.md §7 defines, with stable semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An input byte is not permitted at the current tokenizer state.
    Parse,
    /// A locally well-formed token sequence violates a structural rule.
    Syntax,
    /// Mixed indent characters, a dedent matching no enclosing level, or
    /// leading indentation on the first non-comment line.
    Indentation,
    /// Allocation failed (buffer growth, string allocation, or expression
    /// node allocation).
    Memory,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Parse => "parse error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Indentation => "indentation error",
            ErrorKind::Memory => "memory error",
        };
        f.write_str(name)
    }
}

/// A structured parse error: its kind, the 1-based source position where
/// the violating byte was read, and an optional byte-offset span into the
/// offending line for diagnostic rendering by the caller. This crate never
/// renders a human-readable message beyond its `Display` impl — producing
/// diagnostics is the caller's job (spec.md §1's logging non-goal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ErrorKind,
    line: usize,
    column: usize,
    message: &'static str,
    span: Option<(usize, usize)>,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, line: usize, column: usize, message: &'static str) -> Self {
        ParseError {
            kind,
            line,
            column,
            message,
            span: None,
        }
    }

    pub(crate) fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some((start, end));
        self
    }

    pub(crate) fn parse(line: usize, column: usize, message: &'static str) -> Self {
        ParseError::new(ErrorKind::Parse, line, column, message)
    }

    pub(crate) fn syntax(line: usize, column: usize, message: &'static str) -> Self {
        ParseError::new(ErrorKind::Syntax, line, column, message)
    }

    pub(crate) fn indentation(line: usize, column: usize, message: &'static str) -> Self {
        ParseError::new(ErrorKind::Indentation, line, column, message)
    }

    pub(crate) fn memory(line: usize, column: usize) -> Self {
        ParseError::new(ErrorKind::Memory, line, column, "allocation failed")
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn span(&self) -> Option<(usize, usize)> {
        self.span
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}: {}",
            self.kind, self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_position_and_message() {
        let err = ParseError::indentation(3, 5, "mixed line indentation");
        assert_eq!(
            err.to_string(),
            "indentation error at line 3, column 5: mixed line indentation"
        );
    }

    #[test]
    fn with_span_is_retained() {
        let err = ParseError::syntax(1, 1, "stray `)`").with_span(4, 5);
        assert_eq!(err.span(), Some((4, 5)));
    }

    #[test]
    fn accessors_round_trip_construction() {
        let err = ParseError::parse(7, 2, "unexpected byte");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.line(), 7);
        assert_eq!(err.column(), 2);
    }
}
