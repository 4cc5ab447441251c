//! Error types for the advisor surfaces
//!
//! The extraction engine itself never fails: malformed JSON and shape
//! mismatches degrade to prose or absent slots. These errors cover the
//! outer layers only (configuration, input reading, database context).
//!
//! Errors are classified by recoverability:
//! - Retryable: transient I/O failures
//! - NonRetryable: malformed input or configuration
//! - RequiresUserAction: missing files the user must create or point to

use std::path::PathBuf;
use thiserror::Error;

/// Error types for advisor operations
#[derive(Debug, Error)]
pub enum AdvisorError {
    // Retryable errors
    #[error("IO error: {0}")]
    IoError(String),

    // Non-retryable errors
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to read advisory input: {0}")]
    InputError(String),

    #[error("Invalid database context: {0}")]
    InvalidContext(String),

    // Requires user action
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Could not find home directory")]
    HomeDirNotFound,
}

impl AdvisorError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdvisorError::IoError(_))
    }

    /// Returns true if this error requires user action to resolve
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            AdvisorError::ConfigNotFound(_)
                | AdvisorError::InputNotFound(_)
                | AdvisorError::HomeDirNotFound
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AdvisorError::IoError(_) => "Check file permissions and try again.",
            AdvisorError::ConfigurationError(_) => {
                "Check your configuration in ~/.dbadvisor/config.json"
            }
            AdvisorError::InputError(_) => "Check the advisory input is readable UTF-8 text.",
            AdvisorError::InvalidContext(_) => {
                "Check the context file matches the expected database context format."
            }
            AdvisorError::ConfigNotFound(_) => {
                "Create the config file or omit --config to use defaults."
            }
            AdvisorError::InputNotFound(_) => "Verify the input path, or pipe the text on stdin.",
            AdvisorError::HomeDirNotFound => "Set HOME or pass --config explicitly.",
        }
    }
}

impl From<std::io::Error> for AdvisorError {
    fn from(err: std::io::Error) -> Self {
        AdvisorError::IoError(err.to_string())
    }
}

/// Serializable error representation for the output envelope
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    Retryable,
    NonRetryable,
    RequiresUserAction,
}

impl From<&AdvisorError> for ErrorInfo {
    fn from(err: &AdvisorError) -> Self {
        let error_type = if err.requires_user_action() {
            ErrorType::RequiresUserAction
        } else if err.is_retryable() {
            ErrorType::Retryable
        } else {
            ErrorType::NonRetryable
        };

        ErrorInfo {
            message: err.to_string(),
            error_type,
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
