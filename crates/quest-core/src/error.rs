//! Error types for the quest client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of error codes the backend puts in an error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AuthInvalid,
    UserExists,
    ValidationError,
    NotFound,
    DatabaseError,
    ServerError,
    CustomError,
}

impl ErrorCode {
    /// Fixed user-facing text for the code, shown when the server message is not helpful.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AuthInvalid => "Invalid credentials. Double-check your email and password.",
            Self::UserExists => "Identity already exists in the database.",
            Self::ValidationError => "Input verification failed. See details below.",
            Self::NotFound => "System core: Resource not located.",
            Self::DatabaseError => "Storage failure. Data link interrupted.",
            Self::ServerError => "Neural link error. Server is unresponsive.",
            Self::CustomError => "Request rejected.",
        }
    }
}

/// Wire representation of a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_type: ErrorCode,
    pub message: String,
}

/// Coarse classification used to decide how an error is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, shown next to the offending field.
    Validation,
    /// Missing or rejected credentials, sends the user to an unauthenticated view.
    Authentication,
    /// Network failure or timeout, recoverable by a manual retry.
    Transport,
    /// Anything the server or the client itself failed at; shown as a generic alert.
    Server,
}

/// A shared error type for the whole quest client.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum QuestError {
    /// The remote rejected the command with a typed error body.
    #[error("Remote error ({code:?}): {message}")]
    Remote { code: ErrorCode, message: String },

    /// The request never produced a usable response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not settle within the configured deadline.
    #[error("Operation '{operation}' timed out after {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },

    /// Client-side validation failed before anything was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An attachment could not be turned into bytes.
    #[error("Attachment #{index} could not be read: {message}")]
    Attachment { index: usize, message: String },

    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// No authenticated session is available for a call that needs one.
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuestError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    pub fn remote(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Remote {
            code,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn timeout(operation: impl Into<String>, after_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after_ms,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Remote { code, .. } => *code == ErrorCode::NotFound,
            _ => false,
        }
    }

    /// Returns the wire code when the error came from the remote.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Classifies the error for display purposes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Remote { code, .. } => match code {
                ErrorCode::AuthInvalid => ErrorKind::Authentication,
                ErrorCode::UserExists | ErrorCode::ValidationError | ErrorCode::CustomError => {
                    ErrorKind::Validation
                }
                ErrorCode::NotFound | ErrorCode::DatabaseError | ErrorCode::ServerError => {
                    ErrorKind::Server
                }
            },
            Self::Unauthenticated => ErrorKind::Authentication,
            Self::Transport(_) | Self::Timeout { .. } => ErrorKind::Transport,
            Self::Validation(_) | Self::Attachment { .. } => ErrorKind::Validation,
            Self::NotFound { .. }
            | Self::Config(_)
            | Self::Io { .. }
            | Self::Serialization { .. }
            | Self::Internal(_) => ErrorKind::Server,
        }
    }

    /// Text suitable for an inline banner.
    pub fn display_message(&self) -> String {
        match self {
            Self::Remote { code, message } if message.trim().is_empty() => {
                code.user_message().to_string()
            }
            Self::Remote { message, .. } => message.clone(),
            Self::Transport(_) | Self::Timeout { .. } => {
                "Network timeout. Check your uplink connection.".to_string()
            }
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<ErrorBody> for QuestError {
    fn from(body: ErrorBody) -> Self {
        Self::Remote {
            code: body.error_type,
            message: body.message,
        }
    }
}

impl From<QuestError> for ErrorBody {
    fn from(err: QuestError) -> Self {
        match err {
            QuestError::Remote { code, message } => ErrorBody {
                error_type: code,
                message,
            },
            QuestError::Unauthenticated => ErrorBody {
                error_type: ErrorCode::AuthInvalid,
                message: err.to_string(),
            },
            QuestError::Validation(message) => ErrorBody {
                error_type: ErrorCode::ValidationError,
                message,
            },
            QuestError::NotFound { .. } => ErrorBody {
                error_type: ErrorCode::NotFound,
                message: err.to_string(),
            },
            other => ErrorBody {
                error_type: ErrorCode::ServerError,
                message: other.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for QuestError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for QuestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for QuestError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for QuestError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, QuestError>`.
pub type Result<T> = std::result::Result<T, QuestError>;
