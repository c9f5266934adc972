//! Codec error types

use std::fmt;

/// Failure while decoding JSON text.
///
/// A decode error always replaces the whole result; no partially built value
/// is ever handed back alongside it.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Input was not text at all.
    Type(String),

    /// Malformed JSON at a 1-based line and column.
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// Non-whitespace input after the top-level value.
    TrailingGarbage { line: usize, column: usize },
}

/// Failure while encoding a value.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// An object key that is not a string (the type name is carried).
    InvalidKeyType(&'static str),

    /// NaN or an infinity.
    InvalidNumber(f64),

    /// A table reachable from itself.
    CircularReference,
}

impl DecodeError {
    /// Line and column of the failure, if it has a position.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            DecodeError::Type(_) => None,
            DecodeError::Syntax { line, column, .. }
            | DecodeError::TrailingGarbage { line, column } => Some((*line, *column)),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Type(msg) => write!(f, "Type error: {msg}"),
            DecodeError::Syntax {
                line,
                column,
                message,
            } => write!(f, "Syntax error at line {line}, column {column}: {message}"),
            DecodeError::TrailingGarbage { line, column } => {
                write!(f, "Trailing garbage at line {line}, column {column}")
            }
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::InvalidKeyType(ty) => write!(f, "Invalid key type: {ty}"),
            EncodeError::InvalidNumber(n) => write!(f, "Invalid number: {n}"),
            EncodeError::CircularReference => write!(f, "Circular reference"),
        }
    }
}

impl std::error::Error for DecodeError {}
impl std::error::Error for EncodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = DecodeError::Syntax {
            line: 3,
            column: 7,
            message: "unexpected character 'x'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Syntax error at line 3, column 7: unexpected character 'x'"
        );
        assert_eq!(err.position(), Some((3, 7)));
    }

    #[test]
    fn test_type_error_has_no_position() {
        let err = DecodeError::Type("not text".to_string());
        assert_eq!(err.position(), None);
    }
}
