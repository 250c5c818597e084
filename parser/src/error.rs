//! Error types for schema parsing.

use thiserror::Error;

/// Errors raised while parsing schema text.
///
/// Syntax errors carry the 1-based source line; semantic errors name the
/// offending block and field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Malformed schema text.
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A field type is neither a built-in scalar nor a declared model or enum.
    #[error(
        "type \"{type_name}\" of field {model}.{field} is neither a built-in scalar nor a declared model or enum"
    )]
    UnknownType {
        model: String,
        field: String,
        type_name: String,
    },

    /// Two top-level blocks of the same namespace share a name.
    #[error("{kind} \"{name}\" is declared more than once")]
    DuplicateBlock { kind: String, name: String },

    /// A field or enum value is declared twice in one block.
    #[error("\"{name}\" is declared more than once in {block}")]
    DuplicateField { block: String, name: String },

    /// Unknown attribute or attribute with malformed arguments.
    #[error("invalid attribute @{attribute} on {target}: {message}")]
    InvalidAttribute {
        target: String,
        attribute: String,
        message: String,
    },

    /// A datasource or generator block lacks a required property.
    #[error("{kind} \"{name}\" is missing required property \"{property}\"")]
    MissingProperty {
        kind: String,
        name: String,
        property: String,
    },

    /// A datasource or generator property has the wrong shape.
    #[error("invalid value for property \"{property}\" in {kind} \"{name}\": {message}")]
    InvalidProperty {
        kind: String,
        name: String,
        property: String,
        message: String,
    },
}

impl ParseError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;
