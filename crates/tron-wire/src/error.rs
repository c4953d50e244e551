//! Error types for the wire codec.

use thiserror::Error;

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum WireError {
    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame is not a JSON object with a string `type` field.
    #[error("malformed frame: {0}")]
    Malformed(String),
}

/// Convenience type alias for wire results.
pub type Result<T> = std::result::Result<T, WireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_display() {
        let serde_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err = WireError::Json(serde_err);
        assert!(err.to_string().contains("json error"));
    }

    #[test]
    fn malformed_display() {
        let err = WireError::Malformed("missing type field".into());
        assert_eq!(err.to_string(), "malformed frame: missing type field");
    }
}
