//! Template compilation errors

use std::num::ParseFloatError;

use thiserror::Error;

/// Why a format string was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("invalid format string: required to be non-empty")]
    EmptyTemplate,

    #[error("invalid format string: missing verb (in \"{fragment}\")")]
    MissingVerb { fragment: String },

    #[error("invalid format string: invalid verb \"{verb}\" (in \"{fragment}\")")]
    InvalidVerb { fragment: String, verb: char },

    #[error("invalid format string: invalid cost ratio (in \"{fragment}\"): {source}")]
    InvalidRatio {
        fragment: String,
        #[source]
        source: ParseFloatError,
    },
}

impl TemplateError {
    /// The part of the format string the error refers to, if any.
    pub fn fragment(&self) -> Option<&str> {
        match self {
            TemplateError::EmptyTemplate => None,
            TemplateError::MissingVerb { fragment }
            | TemplateError::InvalidVerb { fragment, .. }
            | TemplateError::InvalidRatio { fragment, .. } => Some(fragment),
        }
    }

    /// Short human-readable reason.
    pub fn explanation(&self) -> &'static str {
        match self {
            TemplateError::EmptyTemplate => "required to be non-empty",
            TemplateError::MissingVerb { .. } => "missing verb",
            TemplateError::InvalidVerb { .. } => "invalid verb",
            TemplateError::InvalidRatio { .. } => "invalid cost ratio",
        }
    }
}
