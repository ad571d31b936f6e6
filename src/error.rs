use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised at the edges of the builder: loading schemas and config, rendering previews.
///
/// Tree edits and compilation never fail; incomplete input compiles to less output instead.
#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Preview output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid schema document: {0}")]
    InvalidSchema(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, BuilderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BuilderError::InvalidSchema("missing mappings".to_string());
        assert_eq!(err.to_string(), "Invalid schema document: missing mappings");
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: BuilderError = parse.unwrap_err().into();
        assert!(matches!(err, BuilderError::Json(_)));
    }
}
