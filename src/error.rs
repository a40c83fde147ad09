//! Domain-specific error types for initiative-forge

use thiserror::Error;

/// Main error type for the initiative pipeline
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Text generation error: {message}")]
    Generation { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Timeout error: {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Not found: {entity} '{id}'")]
    NotFound { entity: String, id: String },

    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    #[error("Transfer error: {message}")]
    Transfer { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ForgeError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ForgeError::InvalidParams {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ForgeError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Input errors are fatal to the current call; everything else is a
    /// collaborator or persistence failure that callers may isolate.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ForgeError::InvalidParams { .. } | ForgeError::Validation { .. }
        )
    }
}

impl From<anyhow::Error> for ForgeError {
    fn from(err: anyhow::Error) -> Self {
        ForgeError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ForgeError {
    fn from(err: serde_json::Error) -> Self {
        ForgeError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<surrealdb::Error> for ForgeError {
    fn from(err: surrealdb::Error) -> Self {
        ForgeError::Database {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ForgeError {
    fn from(err: reqwest::Error) -> Self {
        ForgeError::Generation {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

impl From<toml::de::Error> for ForgeError {
    fn from(err: toml::de::Error) -> Self {
        ForgeError::Config {
            message: err.to_string(),
        }
    }
}

impl From<crate::clients::GeneratorError> for ForgeError {
    fn from(err: crate::clients::GeneratorError) -> Self {
        match err {
            crate::clients::GeneratorError::Timeout { timeout_ms } => ForgeError::Timeout {
                operation: "text generation".to_string(),
                timeout_ms,
            },
            other => ForgeError::Generation {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_flagged() {
        assert!(ForgeError::invalid("gaps array is required").is_input_error());
        assert!(!ForgeError::not_found("assessment", "a-1").is_input_error());
    }

    #[test]
    fn generator_timeout_maps_to_timeout_variant() {
        let err: ForgeError = crate::clients::GeneratorError::Timeout { timeout_ms: 250 }.into();
        assert_eq!(
            err.to_string(),
            "Timeout error: text generation timed out after 250ms"
        );
    }
}
