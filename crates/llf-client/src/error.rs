//! # Design
//!
//! - One error type for every client operation, with constant messages.
//! - Carry operation context (URL, path, status) as fields instead of
//!   interpolating it into the message.
//! - Preserve source errors so callers can walk the chain.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by [`crate::RemoteServiceClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote service answered with a non-success status.
    #[error("remote service returned an error status")]
    Remote {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// HTTP status code returned by the server.
        status: u16,
        /// Raw response body, decoded lossily.
        body: String,
    },
    /// The local file to upload does not exist or is not a regular file.
    #[error("local file not found")]
    LocalFileNotFound {
        /// Path that was checked.
        path: PathBuf,
    },
    /// A command submission response lacked the `X-Process-ID` header.
    #[error("server did not return a process id")]
    MissingCorrelationId {
        /// Operation identifier.
        operation: &'static str,
    },
    /// A background submission response lacked the `X-PID` header.
    #[error("server did not return a pid")]
    MissingPid {
        /// Process id the server did return.
        process_id: String,
    },
    /// A response body could not be decoded as JSON.
    #[error("failed to decode response body")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// The HTTP transport failed (connect, send, or body read).
    #[error("http transport failed")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// Command submission did not receive response headers in time.
    #[error("command submission timed out")]
    SubmitTimeout {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Bound that elapsed.
        timeout: Duration,
    },
    /// Local IO failed while writing output or reading an upload source.
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved, when there is one.
        path: Option<PathBuf>,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The configured base URL could not be parsed.
    #[error("invalid base url")]
    InvalidBaseUrl {
        /// Offending value.
        value: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
    /// The base URL cannot carry path segments (for example `mailto:`).
    #[error("base url cannot be extended with a path")]
    InvalidPath {
        /// Offending base URL.
        value: String,
    },
}

impl ClientError {
    pub(crate) fn transport(
        operation: &'static str,
        url: impl Into<String>,
        source: reqwest::Error,
    ) -> Self {
        Self::Transport {
            operation,
            url: url.into(),
            source,
        }
    }

    pub(crate) const fn decode(operation: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { operation, source }
    }

    pub(crate) fn io(operation: &'static str, path: Option<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path,
            source,
        }
    }

    /// Whether the failure happened in the transport layer (connection,
    /// timeout, or an interrupted body).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::SubmitTimeout { .. })
    }

    /// HTTP status of a [`ClientError::Remote`] failure.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}
