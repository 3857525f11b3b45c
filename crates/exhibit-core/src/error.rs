//! Core error types for the Exhibit engine.

/// A specialized Result type for Exhibit operations.
pub type ExhibitResult<T> = Result<T, ExhibitError>;

/// Top-level error type encompassing all Exhibit subsystems.
#[derive(Debug, thiserror::Error)]
pub enum ExhibitError {
    /// The timeline is missing required structure (e.g. no track list).
    #[error("structural error: {0}")]
    Structural(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl ExhibitError {
    /// Create a structural error.
    pub fn structural(message: impl Into<String>) -> Self {
        ExhibitError::Structural(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_error_display() {
        let err = ExhibitError::structural("timeline has no track list");
        assert_eq!(
            err.to_string(),
            "structural error: timeline has no track list"
        );
    }

    #[test]
    fn test_config_error_from_toml() {
        let parse: Result<toml::Value, toml::de::Error> = toml::from_str("fps = ");
        let err: ExhibitError = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("config error"));
    }
}
