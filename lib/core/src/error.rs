use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    #[error("Duplicate index: {0}")]
    DuplicateIndex(String),

    #[error("Secret key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid artifact length for index {index}: expected {expected} bytes, got {actual}")]
    InvalidArtifactLength {
        index: String,
        expected: usize,
        actual: usize,
    },

    #[error("No attribute could be encoded")]
    Unencodable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Configuration errors are fatal to the operation that hit them and
    /// must be surfaced, not defaulted.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownIndex(_)
                | Error::DuplicateIndex(_)
                | Error::KeyUnavailable(_)
                | Error::InvalidConfig(_)
                | Error::InvalidArtifactLength { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Per-attribute input problem. Never carries the attribute value.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputError {
    #[error("malformed value, expected {expected}")]
    Malformed { expected: String },

    #[error("attribute supplied more than once")]
    Duplicate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(Error::UnknownIndex("dob".into()).is_configuration());
        assert!(Error::KeyUnavailable("missing".into()).is_configuration());
        assert!(!Error::Unencodable.is_configuration());
        assert!(!Error::Internal("join".into()).is_configuration());
    }

    #[test]
    fn test_input_error_serialization() {
        let err = InputError::Malformed { expected: "date".to_string() };
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"kind":"malformed","expected":"date"}"#);
    }
}
