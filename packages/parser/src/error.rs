use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input at {pos}: expected {expected}")]
    UnexpectedEof { pos: usize, expected: String },

    #[error("Lexer error at {pos}")]
    LexerError { pos: usize },

    #[error("Unknown field '{field}' in message {message} at {pos}")]
    UnknownField {
        pos: usize,
        message: String,
        field: String,
    },

    #[error("Invalid value for field '{field}' at {pos}: {message}")]
    InvalidValue {
        pos: usize,
        field: String,
        message: String,
    },

    #[error("Invalid string literal at {pos}: {message}")]
    InvalidString { pos: usize, message: String },

    #[error("Missing required field '{path}'")]
    MissingRequired { path: String },
}

impl ParseError {
    pub fn unexpected_token(pos: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize, expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            pos,
            expected: expected.into(),
        }
    }

    pub fn lexer_error(pos: usize) -> Self {
        Self::LexerError { pos }
    }

    pub fn unknown_field(pos: usize, message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            pos,
            message: message.into(),
            field: field.into(),
        }
    }

    pub fn invalid_value(pos: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            pos,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_string(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidString {
            pos,
            message: message.into(),
        }
    }

    /// Byte offset into the source, when the error has one
    pub fn pos(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedToken { pos, .. }
            | ParseError::UnexpectedEof { pos, .. }
            | ParseError::LexerError { pos }
            | ParseError::UnknownField { pos, .. }
            | ParseError::InvalidValue { pos, .. }
            | ParseError::InvalidString { pos, .. } => Some(*pos),
            ParseError::MissingRequired { .. } => None,
        }
    }
}

/// Pretty-print an error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &ParseError) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let start = error
        .pos()
        .unwrap_or(source.len().saturating_sub(1))
        .min(source.len());
    let end = (start + 1).min(source.len()).max(start);

    let label_message = match error {
        ParseError::UnexpectedToken { expected, .. } | ParseError::UnexpectedEof { expected, .. } => {
            format!("expected {}", expected)
        }
        ParseError::UnknownField { field, .. } => format!("no field named '{}'", field),
        ParseError::InvalidValue { message, .. } | ParseError::InvalidString { message, .. } => {
            message.clone()
        }
        ParseError::LexerError { .. } => "unrecognized input".to_string(),
        ParseError::MissingRequired { path } => format!("'{}' is required", path),
    };

    let report = Report::build(ReportKind::Error, filename, start)
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, start..end))
                .with_color(Color::Red)
                .with_message(label_message),
        )
        .finish();

    let mut output = Vec::new();
    if report
        .write((filename, Source::from(source)), &mut output)
        .is_err()
    {
        return error.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|_| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_has_no_position() {
        let err = ParseError::MissingRequired {
            path: "texture.path".to_string(),
        };
        assert_eq!(err.pos(), None);
        assert_eq!(err.to_string(), "Missing required field 'texture.path'");
    }

    #[cfg(feature = "pretty-errors")]
    #[test]
    fn test_format_error_mentions_message() {
        let source = "name: 12\n";
        let err = ParseError::invalid_value(6, "name", "expected string");
        let rendered = format_error(source, "test.txt", &err);
        assert!(rendered.contains("expected string"));
    }
}
