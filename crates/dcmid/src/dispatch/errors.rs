//! Dispatch failures and their completion codes.

use std::io;

use dcmi_handler::{CompletionCode, DcmiError};
use thiserror::Error;

/// Anything that stops a request from producing a successful reply.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The line is not a DCMI request.
    #[error("not a DCMI request: {message}")]
    Malformed {
        /// Decoder diagnostic.
        message: String,
        /// JSON error, when decoding got that far.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The line grew past the size limit before a newline arrived.
    #[error("request of at least {size} bytes exceeds the {max_size} byte limit")]
    RequestTooLarge {
        /// Bytes received so far.
        size: usize,
        /// Permitted line length.
        max_size: usize,
    },

    /// The connection failed or timed out.
    #[error("connection failed: {0}")]
    Io(#[from] io::Error),

    /// The reply could not be encoded.
    #[error("cannot encode reply: {0}")]
    SerializeResponse(#[from] serde_json::Error),

    /// The handler rejected or failed the command.
    #[error(transparent)]
    Command(#[from] DcmiError),
}

impl DispatchError {
    /// Completion code sent back to the client.
    pub fn completion_code(&self) -> CompletionCode {
        match self {
            Self::Malformed { .. } => CompletionCode::InvalidFieldRequest,
            Self::RequestTooLarge { .. } => CompletionCode::ReqDataLenInvalid,
            Self::Io(_) | Self::SerializeResponse(_) => CompletionCode::Unspecified,
            Self::Command(error) => error.completion_code(),
        }
    }

    /// Wraps a decoding failure.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Malformed request with a fixed explanation.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Line-length violation.
    pub fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }
}
