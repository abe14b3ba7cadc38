//! Error types and handling for the travel adviser backend

use thiserror::Error;

/// Main error type for the travel adviser
#[derive(Error, Debug)]
pub enum TravelAdviserError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Catalog store communication or query errors
    #[error("Store error: {message}")]
    Store { message: String },

    /// Language model communication errors
    #[error("Language model error: {message}")]
    Llm { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl TravelAdviserError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a new language model error
    pub fn llm<S: Into<String>>(message: S) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// True for failures of an external collaborator (store or language model)
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Store { .. } | Self::Llm { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TravelAdviserError::Config { .. } => {
                "Configuration error. Please check your config file and credentials.".to_string()
            }
            TravelAdviserError::Store { .. } => {
                "The travel catalog is currently unavailable. Please try again later.".to_string()
            }
            TravelAdviserError::Llm { .. } => {
                "The language model is currently unavailable. Please try again later.".to_string()
            }
            TravelAdviserError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TravelAdviserError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            TravelAdviserError::General { message } => message.clone(),
        }
    }
}
