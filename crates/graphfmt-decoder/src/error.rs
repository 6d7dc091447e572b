//! Document decoding errors

use std::fmt;
use std::io;
use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

/// Element kinds the decoder interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElementKind::Node => "node",
            ElementKind::Edge => "edge",
        })
    }
}

/// A field of a node or edge element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The `id` attribute of a node.
    Id,
    Cost,
    Source,
    Target,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Id => "attribute \"id\"",
            Field::Cost => "<cost>",
            Field::Source => "<source>",
            Field::Target => "<target>",
        })
    }
}

/// Why a document could not be turned into a graph.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("<{element}> is missing required {field}")]
    MissingRequiredField { element: ElementKind, field: Field },

    #[error("<{element}> {field} {value:?} is not a valid integer: {source}")]
    InvalidIntegerField {
        element: ElementKind,
        field: Field,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("<{element}> {field} {value:?} is not a valid number: {source}")]
    InvalidFloatField {
        element: ElementKind,
        field: Field,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("document ended with {depth} unclosed element(s)")]
    TruncatedStream { depth: usize },

    #[error("document has no root element")]
    EmptyDocument,

    #[error("malformed markup at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("failed to read document: {0}")]
    Io(#[from] io::Error),
}

/// Discriminant of [`DecodeError`], comparable across decoding strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    MissingRequiredField,
    InvalidIntegerField,
    InvalidFloatField,
    TruncatedStream,
    EmptyDocument,
    Syntax,
    Io,
}

impl DecodeError {
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            DecodeError::MissingRequiredField { .. } => DecodeErrorKind::MissingRequiredField,
            DecodeError::InvalidIntegerField { .. } => DecodeErrorKind::InvalidIntegerField,
            DecodeError::InvalidFloatField { .. } => DecodeErrorKind::InvalidFloatField,
            DecodeError::TruncatedStream { .. } => DecodeErrorKind::TruncatedStream,
            DecodeError::EmptyDocument => DecodeErrorKind::EmptyDocument,
            DecodeError::Syntax { .. } => DecodeErrorKind::Syntax,
            DecodeError::Io(_) => DecodeErrorKind::Io,
        }
    }

    /// The element and field at fault, for field-level errors.
    pub fn location(&self) -> Option<(ElementKind, Field)> {
        match self {
            DecodeError::MissingRequiredField { element, field }
            | DecodeError::InvalidIntegerField { element, field, .. }
            | DecodeError::InvalidFloatField { element, field, .. } => Some((*element, *field)),
            _ => None,
        }
    }

    pub(crate) fn syntax(position: u64, message: impl Into<String>) -> Self {
        DecodeError::Syntax {
            position,
            message: message.into(),
        }
    }
}
