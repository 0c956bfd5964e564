use thiserror::Error;

use crate::normalize::Provider;

/// Errors raised while turning a raw webhook payload into a canonical event
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// A required field is missing or has the wrong type.
    #[error("Malformed payload at `{path}`: {message}")]
    MalformedPayload { path: String, message: String },

    /// The provider never emits this kind of event.
    #[error("{provider} does not provide {kind} events")]
    Unsupported { provider: Provider, kind: &'static str },
}

impl NormalizeError {
    /// Dotted path of the offending field, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MalformedPayload { path, .. } => Some(path),
            Self::Unsupported { .. } => None,
        }
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for NormalizeError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        Self::MalformedPayload {
            path,
            message: err.into_inner().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NormalizeError>;
