//! Error types for the presto front-end.

use std::fmt;

use thiserror::Error;

/// File name plus 1-based line and column, attached to every error variant.
///
/// `file` is empty for errors raised in top-level (non-included) source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPosition {
    /// Name of the included file, or empty for top-level source.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl fmt::Display for ErrorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "Line {}, column {}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

/// All errors that can be produced by the presto front-end.
///
/// Every variant carries an [`ErrorPosition`] and a human-readable message.
/// Errors are fatal to the current parse; there is no recovery.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PrestoError {
    /// Bad character, malformed numeric literal, unterminated comment or
    /// string.
    #[error("{0}: {1}")]
    Lex(ErrorPosition, String),

    /// Mismatched token, malformed statement, or malformed parameter list.
    #[error("{0}: {1}")]
    Parse(ErrorPosition, String),

    /// Duplicate declaration, unknown identifier in a position that requires
    /// one, wrong storage kind, or nesting of namespaces / inline functions.
    #[error("{0}: {1}")]
    Symbol(ErrorPosition, String),

    /// Wrong argument count for an inline function, API method, or external C
    /// function.
    #[error("{0}: {1}")]
    Arity(ErrorPosition, String),

    /// Include file not found, or included a second time.
    #[error("{0}: {1}")]
    Include(ErrorPosition, String),

    /// `const var` declared outside its allowed scope.
    #[error("{0}: {1}")]
    Const(ErrorPosition, String),
}

impl PrestoError {
    /// Returns the position this error points at.
    pub fn position(&self) -> &ErrorPosition {
        match self {
            PrestoError::Lex(p, _)
            | PrestoError::Parse(p, _)
            | PrestoError::Symbol(p, _)
            | PrestoError::Arity(p, _)
            | PrestoError::Include(p, _)
            | PrestoError::Const(p, _) => p,
        }
    }

    /// Returns the bare message without the position prefix.
    pub fn message(&self) -> &str {
        match self {
            PrestoError::Lex(_, m)
            | PrestoError::Parse(_, m)
            | PrestoError::Symbol(_, m)
            | PrestoError::Arity(_, m)
            | PrestoError::Include(_, m)
            | PrestoError::Const(_, m) => m,
        }
    }
}

/// Convenient `Result` alias for fallible front-end operations.
pub type PrestoResult<T> = Result<T, PrestoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display_top_level() {
        let p = ErrorPosition {
            file: String::new(),
            line: 3,
            column: 7,
        };
        assert_eq!(p.to_string(), "Line 3, column 7");
    }

    #[test]
    fn test_position_display_included_file() {
        let p = ErrorPosition {
            file: "util.js".into(),
            line: 1,
            column: 1,
        };
        assert_eq!(p.to_string(), "util.js:1:1");
    }

    #[test]
    fn test_error_display_carries_message() {
        let e = PrestoError::Symbol(
            ErrorPosition {
                file: String::new(),
                line: 2,
                column: 5,
            },
            "duplicate declaration".into(),
        );
        assert_eq!(e.to_string(), "Line 2, column 5: duplicate declaration");
        assert_eq!(e.message(), "duplicate declaration");
    }
}
