//! Chunked signing session.
//!
//! The Stacks app accumulates the signing payload across several APDUs and
//! only signs after the `Last` chunk. [`SigningSession`] owns the transport
//! for the whole exchange and tracks where the device is in the sequence:
//!
//! ```text
//!          Init            Add*            Last
//! Idle ----------> Accumulating ----> Accumulating ----> Done
//!   ^                   |                                 |
//!   +--- error/reset ---+            chunk 1 ------------+
//! ```
//!
//! Chunks sent out of sequence are rejected before anything reaches the
//! device. A transport error puts the session back to `Idle`; the caller must
//! resend the whole sequence from chunk 1.
//!
//! # Example
//!
//! ```ignore
//! use ledger_stacks_signer_core::ledger::SigningSession;
//!
//! let mut session = SigningSession::new(transport);
//! let response = session.sign("m/44'/5757'/0'/0/0", &tx_bytes).await?;
//! ```

use std::fmt;

use tracing::{debug, trace, warn};

use crate::config::SignerConfig;
use crate::error::{Error, Result};
use crate::path::serialize_path;

use super::Transport;
use super::apdu::Apdu;
use super::chunk::{ChunkDescriptor, prepare_chunks};
use super::response::{SignResponse, parse_sign_response};
use super::status::StatusWord;

/// Stacks app instruction codes.
mod ins {
    /// `SIGN_SECP256K1` instruction.
    pub(super) const SIGN_SECP256K1: u8 = 0x02;
}

/// P2 for signing commands.
const P2_DEFAULT: u8 = 0x00;

/// Statuses a signing APDU may answer with. `DataIsInvalid` and
/// `BadKeyHandle` are reported in the [`SignResponse`] with their diagnostic.
const SIGN_ACCEPTED: [StatusWord; 3] = [
    StatusWord::NoErrors,
    StatusWord::DataIsInvalid,
    StatusWord::BadKeyHandle,
];

/// Where the device is in a signing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No sequence in progress.
    Idle,

    /// The device is accumulating payload.
    Accumulating {
        /// The next chunk index the session will accept.
        next_chunk: usize,

        /// The chunk count announced by the first chunk.
        chunk_count: usize,
    },

    /// The last sequence finished, signed or rejected.
    Done,
}

/// A signing session with the Stacks app.
pub struct SigningSession {
    /// The underlying transport.
    transport: Box<dyn Transport>,

    /// Protocol parameters.
    config: SignerConfig,

    /// Position in the current signing sequence.
    state: SessionState,
}

impl fmt::Debug for SigningSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSession")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SigningSession {
    /// Creates a session with the default configuration.
    #[must_use]
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            config: SignerConfig::default(),
            state: SessionState::Idle,
        }
    }

    /// Creates a session with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is invalid.
    pub fn with_config(transport: Box<dyn Transport>, config: SignerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            config,
            state: SessionState::Idle,
        })
    }

    /// Returns the session configuration.
    #[must_use]
    pub const fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Returns the current sequence state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Abandons any sequence in progress.
    ///
    /// Call this after cancelling a [`send_chunk`](Self::send_chunk) future,
    /// for example when a caller-imposed deadline expires.
    pub fn reset(&mut self) {
        if self.state != SessionState::Idle {
            debug!(state = ?self.state, "resetting signing session");
        }
        self.state = SessionState::Idle;
    }

    /// Checks if the session is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Sends one chunk of a signing payload.
    ///
    /// # Arguments
    ///
    /// * `chunk_index` - 1-based position of this chunk
    /// * `chunk_count` - total number of chunks in the sequence
    /// * `payload` - the chunk bytes (at most 255)
    ///
    /// # Returns
    ///
    /// The parsed [`SignResponse`]. Intermediate chunks return a status only;
    /// the last chunk returns the signature on success. A device rejection
    /// (`DataIsInvalid`, `BadKeyHandle`) is a response, not an error, and ends
    /// the sequence.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidChunk`] unless `1 <= chunk_index <= chunk_count`
    /// - [`Error::ChunkOutOfOrder`] or [`Error::ChunkCountMismatch`] if the
    ///   chunk does not continue the current sequence
    /// - [`Error::PayloadTooLarge`] if `payload` exceeds 255 bytes
    /// - [`Error::DeviceDisconnected`] if the transport is gone
    /// - [`Error::UnexpectedStatusWord`] if the device answered with a status
    ///   outside `NoErrors`, `DataIsInvalid` and `BadKeyHandle`
    /// - any other transport or parsing error
    pub async fn send_chunk(
        &mut self,
        chunk_index: usize,
        chunk_count: usize,
        payload: &[u8],
    ) -> Result<SignResponse> {
        let chunk = ChunkDescriptor::new(chunk_index, chunk_count)?;
        self.admit(chunk).inspect_err(|err| {
            warn!(state = ?self.state, %err, "rejecting out-of-order chunk");
        })?;

        if !self.transport.is_connected() {
            self.state = SessionState::Idle;
            return Err(Error::DeviceDisconnected);
        }

        let payload_type = chunk.payload_type();
        let apdu = Apdu::new(
            self.config.cla,
            ins::SIGN_SECP256K1,
            payload_type.p1(),
            P2_DEFAULT,
            payload.to_vec(),
        )?;

        debug!(
            chunk_index,
            chunk_count,
            ?payload_type,
            len = payload.len(),
            "sending sign chunk"
        );
        trace!(apdu = %hex::encode(apdu.to_bytes()), "sign APDU");

        let result = self
            .transport
            .send(&apdu, &SIGN_ACCEPTED)
            .await
            .and_then(|raw| {
                trace!(
                    data = %hex::encode(raw.data()),
                    status = raw.status_word(),
                    "sign response"
                );
                parse_sign_response(&raw)
            });

        match result {
            Ok(response) => {
                self.state = if !response.is_success() || chunk.is_last() {
                    SessionState::Done
                } else {
                    SessionState::Accumulating {
                        next_chunk: chunk_index + 1,
                        chunk_count,
                    }
                };
                if !response.is_success() {
                    warn!(
                        return_code = response.return_code(),
                        message = response.error_message(),
                        "device rejected signing payload"
                    );
                }
                Ok(response)
            }
            Err(err) => {
                self.state = SessionState::Idle;
                warn!(chunk_index, chunk_count, %err, "sign chunk failed");
                Err(err)
            }
        }
    }

    /// Signs `message` with the key at `path`.
    ///
    /// The path is encoded first; an invalid path fails before any byte is
    /// sent. The encoded path is chunk 1 and the message follows in chunks of
    /// [`SignerConfig::chunk_size`] bytes. Sending stops at the first response
    /// that is not `NoErrors`, and that response is returned.
    ///
    /// Any unfinished sequence is abandoned first.
    ///
    /// # Errors
    ///
    /// Returns path encoding errors, and any error of
    /// [`send_chunk`](Self::send_chunk).
    pub async fn sign(&mut self, path: &str, message: &[u8]) -> Result<SignResponse> {
        let path_bytes = serialize_path(path)?;
        let chunks = prepare_chunks(&path_bytes, message, self.config.chunk_size)?;
        let chunk_count = chunks.len();

        self.reset();
        debug!(path, chunk_count, message_len = message.len(), "signing payload");

        let Some((first, rest)) = chunks.split_first() else {
            return Err(Error::InvalidChunk {
                index: 1,
                count: 0,
            });
        };

        let mut response = self.send_chunk(1, chunk_count, first).await?;
        for (offset, chunk) in rest.iter().enumerate() {
            if !response.is_success() {
                break;
            }
            response = self.send_chunk(offset + 2, chunk_count, chunk).await?;
        }

        Ok(response)
    }

    /// Checks that `chunk` continues the current sequence.
    fn admit(&self, chunk: ChunkDescriptor) -> Result<()> {
        match self.state {
            SessionState::Idle | SessionState::Done => {
                if chunk.is_first() {
                    Ok(())
                } else {
                    Err(Error::ChunkOutOfOrder {
                        expected: 1,
                        got: chunk.index(),
                    })
                }
            }
            SessionState::Accumulating {
                next_chunk,
                chunk_count,
            } => {
                if chunk.count() != chunk_count {
                    Err(Error::ChunkCountMismatch {
                        expected: chunk_count,
                        got: chunk.count(),
                    })
                } else if chunk.index() != next_chunk {
                    Err(Error::ChunkOutOfOrder {
                        expected: next_chunk,
                        got: chunk.index(),
                    })
                } else {
                    Ok(())
                }
            }
        }
    }
}
