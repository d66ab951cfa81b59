//! Error types for the Ledger Stacks signer library.
//!
//! This module provides a single error type [`enum@Error`] that covers every
//! failure mode of path encoding and of the chunked signing exchange.
//!
//! # Error Categories
//!
//! - **Path errors**: raised synchronously by the path encoder, always before
//!   any byte is sent to the device
//! - **Transport errors**: I/O failures and status words outside the accepted
//!   set for a command
//! - **Protocol errors**: truncated responses and out-of-order chunk calls
//!
//! # Example
//!
//! ```
//! use ledger_stacks_signer_core::Error;
//!
//! let err = Error::InvalidComponent { token: "abc".to_string() };
//! assert_eq!(err.to_string(), "invalid path: \"abc\" is not a number");
//! ```

use core::result::Result as CoreResult;
use hex::FromHexError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// The main error type for the Ledger Stacks signer library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Derivation Path Errors
    // =========================================================================
    /// The path input is not text.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The path has the wrong root marker or the wrong number of components.
    #[error("malformed path: {0} (e.g \"m/44'/5757'/5'/0/3\")")]
    MalformedPath(String),

    /// A path component is not a decimal number.
    #[error("invalid path: {token:?} is not a number")]
    InvalidComponent {
        /// The offending component, hardened marker stripped.
        token: String,
    },

    /// A path component is bigger than or equal to `0x80000000`.
    #[error("incorrect child value {token:?} (bigger or equal to 0x80000000)")]
    ComponentOutOfRange {
        /// The offending component, hardened marker stripped.
        token: String,
    },

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The transport failed to deliver a command or a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The device was disconnected unexpectedly.
    #[error("device disconnected")]
    DeviceDisconnected,

    /// The device answered with a status word the command does not accept.
    #[error("unexpected status word {status:#06x}: {message}")]
    UnexpectedStatusWord {
        /// The raw status word.
        status: u16,
        /// Human-readable status text, with any device diagnostic appended.
        message: String,
    },

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// The response is shorter than the layout requires.
    #[error("truncated response: got {len} bytes, need at least {expected}")]
    TruncatedResponse {
        /// Number of bytes received.
        len: usize,
        /// Minimum number of bytes required.
        expected: usize,
    },

    /// A chunk payload does not fit in a short APDU. Raised before any I/O.
    #[error("payload too large: {len} bytes (max {max})")]
    PayloadTooLarge {
        /// Payload length.
        len: usize,
        /// Largest payload a short APDU carries.
        max: usize,
    },

    /// The chunk position is outside `1..=count`.
    #[error("invalid chunk {index} of {count}")]
    InvalidChunk {
        /// The 1-based chunk index.
        index: usize,
        /// The total number of chunks.
        count: usize,
    },

    /// A chunk was sent out of sequence.
    #[error("chunk out of order: expected chunk {expected}, got chunk {got}")]
    ChunkOutOfOrder {
        /// The index the session was waiting for.
        expected: usize,
        /// The index the caller sent.
        got: usize,
    },

    /// The chunk count changed in the middle of a sequence.
    #[error("chunk count changed mid-sequence: expected {expected}, got {got}")]
    ChunkCountMismatch {
        /// The count announced by the first chunk.
        expected: usize,
        /// The count the caller sent.
        got: usize,
    },

    /// The signature returned by the device is malformed.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    // =========================================================================
    // Configuration & Serialization Errors
    // =========================================================================
    /// The signer configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to parse hex data.
    #[error("hex decoding failed: {0}")]
    HexDecodeFailed(String),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl Error {
    /// Returns the device status word carried by this error, if any.
    ///
    /// Only [`Error::UnexpectedStatusWord`] originates from the device; every
    /// other variant is raised on the host.
    #[must_use]
    pub const fn status_word(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatusWord { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Checks if the error was raised while encoding the derivation path.
    #[must_use]
    pub const fn is_path_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::MalformedPath(_)
                | Self::InvalidComponent { .. }
                | Self::ComponentOutOfRange { .. }
        )
    }
}

impl From<FromHexError> for Error {
    fn from(err: FromHexError) -> Self {
        Error::HexDecodeFailed(err.to_string())
    }
}

impl From<SerdeJsonError> for Error {
    fn from(err: SerdeJsonError) -> Self {
        Error::JsonError(err.to_string())
    }
}

/// A specialized [`Result`] type for Ledger Stacks signer operations.
pub type Result<T> = CoreResult<T, Error>;
