//! Error types and response classification.
//!
//! Controller and validation failures are raised as [`EvacuationError`] and
//! converted exactly once, by [`convert_error`], into the transport-safe
//! [`ErrorMessage`] carried by every evacuation response. The set of
//! [`ErrorType`] values is closed: an unknown wire code decodes as
//! [`ErrorType::UnknownError`].

use crate::models::proto::ErrorMessage;
use crate::models::validation::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure conditions raised while handling an evacuation request.
#[derive(Debug, Clone, Error)]
pub enum EvacuationError {
    /// Request decoded but failed structural validation.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    /// Request body could not be decoded.
    #[error("invalid protobuf message: {message}")]
    InvalidProtobufMessage { message: String },

    /// No actual LRP matched the request.
    #[error("actual lrp not found: {process_guid}/{index}")]
    ActualLrpNotFound { process_guid: String, index: i32 },

    /// The stored record is in a state incompatible with the request.
    #[error("resource conflict: {message}")]
    ResourceConflict { message: String },

    /// An evacuating record for a different instance already exists.
    #[error("actual lrp {process_guid}/{index} cannot be evacuated")]
    CannotBeEvacuated { process_guid: String, index: i32 },

    /// The authoritative store can no longer be trusted.
    #[error("unrecoverable: {message}")]
    Unrecoverable { message: String },

    /// Unclassified controller failure.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl EvacuationError {
    /// Create an ActualLrpNotFound error.
    pub fn not_found(process_guid: impl Into<String>, index: i32) -> Self {
        Self::ActualLrpNotFound {
            process_guid: process_guid.into(),
            index,
        }
    }

    /// Create a ResourceConflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::ResourceConflict {
            message: message.into(),
        }
    }

    /// Create an Unrecoverable error.
    pub fn unrecoverable(message: impl Into<String>) -> Self {
        Self::Unrecoverable {
            message: message.into(),
        }
    }

    /// Create an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            Self::InvalidRequest(_) => ErrorType::InvalidRequest,
            Self::InvalidProtobufMessage { .. } => ErrorType::InvalidProtobufMessage,
            Self::ActualLrpNotFound { .. } => ErrorType::ResourceNotFound,
            Self::ResourceConflict { .. } | Self::CannotBeEvacuated { .. } => {
                ErrorType::ResourceConflict
            }
            Self::Unrecoverable { .. } => ErrorType::Unrecoverable,
            Self::Internal { .. } => ErrorType::UnknownError,
        }
    }

    /// Check if this error is a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ActualLrpNotFound { .. })
    }

    /// Check if this error must terminate the process.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::Unrecoverable { .. })
    }
}

impl From<prost::DecodeError> for EvacuationError {
    fn from(err: prost::DecodeError) -> Self {
        Self::InvalidProtobufMessage {
            message: err.to_string(),
        }
    }
}

/// Result type using EvacuationError.
pub type EvacuationResult<T> = Result<T, EvacuationError>;

// ============================================================================
// Response classification
// ============================================================================

/// Closed error taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    #[default]
    UnknownError = 0,
    InvalidRequest = 1,
    InvalidProtobufMessage = 2,
    ResourceNotFound = 3,
    ResourceConflict = 4,
    Unrecoverable = 5,
}

impl ErrorType {
    /// Every classification, in wire-code order.
    pub const ALL: [ErrorType; 6] = [
        ErrorType::UnknownError,
        ErrorType::InvalidRequest,
        ErrorType::InvalidProtobufMessage,
        ErrorType::ResourceNotFound,
        ErrorType::ResourceConflict,
        ErrorType::Unrecoverable,
    ];

    /// Wire code for this classification.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Decode a wire code. Unknown codes collapse to `UnknownError`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::InvalidRequest,
            2 => Self::InvalidProtobufMessage,
            3 => Self::ResourceNotFound,
            4 => Self::ResourceConflict,
            5 => Self::Unrecoverable,
            _ => Self::UnknownError,
        }
    }

    /// Stable string identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownError => "UnknownError",
            Self::InvalidRequest => "InvalidRequest",
            Self::InvalidProtobufMessage => "InvalidProtobufMessage",
            Self::ResourceNotFound => "ResourceNotFound",
            Self::ResourceConflict => "ResourceConflict",
            Self::Unrecoverable => "Unrecoverable",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert an internal failure into the response error shape.
pub fn convert_error(err: &EvacuationError) -> ErrorMessage {
    ErrorMessage::new(err.error_type(), err.to_string())
}
