//! Error types for the Bouncer core library
//!
//! Every failure a bounce call can produce is a variant of [`Error`]. Each
//! variant maps onto a [`StatusCode`] so that whatever hosts the calls (an
//! RPC listener, the CLI, the golden runner) can translate it without
//! inspecting messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for Bouncer operations
#[derive(Error, Debug)]
pub enum Error {
    /// The type tag of an Any box names no registered schema
    #[error("Unsupported type for Any: {type_url}")]
    UnsupportedAnyType { type_url: String },

    /// The payload of an Any box could not be decoded as its tagged type
    #[error("Failed to decode Any payload as {type_url}: {source}")]
    AnyDecode {
        type_url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A transformed value could not be re-encoded into an Any box
    #[error("Failed to encode Any payload as {type_url}: {source}")]
    AnyEncode {
        type_url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Malformed field mask path
    #[error("Invalid field mask path '{path}': {message}")]
    InvalidFieldMask { path: String, message: String },

    /// Request body or argument rejected
    #[error("Invalid argument: {field} - {message}")]
    InvalidArgument { field: String, message: String },

    /// Arithmetic left the representable range (timestamps)
    #[error("Out of range: {message}")]
    OutOfRange { message: String },

    /// Required call data is missing
    #[error("Data loss: {message}")]
    DataLoss { message: String },

    /// No call is registered under this name
    #[error("Unknown method: {method}")]
    UnknownMethod { method: String },

    /// JSON encoding of a response failed
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Status classes a hosting boundary reports for a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// The request was malformed
    InvalidArgument,
    /// A value left its representable range
    OutOfRange,
    /// Data the call depends on is unavailable
    DataLoss,
    /// The call does not exist
    Unimplemented,
    /// Anything the caller could not have prevented
    Internal,
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid field mask error
    pub fn invalid_field_mask(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFieldMask {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Status class of this error
    pub fn code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument { .. } | Self::InvalidFieldMask { .. } => {
                StatusCode::InvalidArgument
            }
            Self::OutOfRange { .. } => StatusCode::OutOfRange,
            Self::DataLoss { .. } => StatusCode::DataLoss,
            Self::UnknownMethod { .. } => StatusCode::Unimplemented,
            Self::UnsupportedAnyType { .. }
            | Self::AnyDecode { .. }
            | Self::AnyEncode { .. }
            | Self::Json { .. } => StatusCode::Internal,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            StatusCode::OutOfRange => write!(f, "OUT_OF_RANGE"),
            StatusCode::DataLoss => write!(f, "DATA_LOSS"),
            StatusCode::Unimplemented => write!(f, "UNIMPLEMENTED"),
            StatusCode::Internal => write!(f, "INTERNAL"),
        }
    }
}
