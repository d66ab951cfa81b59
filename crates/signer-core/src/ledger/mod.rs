//! Ledger Stacks app communication module.
//!
//! This module drives the signing exchange with the Stacks app over APDUs:
//!
//! - [`apdu`]: APDU command/response types and encoding
//! - [`status`]: device status words and their descriptions
//! - [`chunk`]: payload types and chunk splitting
//! - [`response`]: signing response parsing
//! - [`session`]: the chunked signing state machine
//!
//! # Transport Abstraction
//!
//! The [`Transport`] trait abstracts over the physical link (USB HID, BLE,
//! speculos emulator, ...). This crate ships no transport; implement the trait
//! for whatever link the application uses.
//!
//! # Example
//!
//! ```ignore
//! use ledger_stacks_signer_core::ledger::{SigningSession, Transport};
//!
//! let transport: Box<dyn Transport> = /* ... */;
//! let mut session = SigningSession::new(transport);
//!
//! let response = session.sign("m/44'/5757'/0'/0/0", &tx_bytes).await?;
//! if let Some(signature) = response.signature() {
//!     println!("signature: {signature}");
//! }
//! ```

pub mod apdu;
pub mod chunk;
pub mod response;
pub mod session;
pub mod status;

pub use apdu::{Apdu, ApduResponse};
pub use chunk::{ChunkDescriptor, DEFAULT_CHUNK_SIZE, PayloadType, prepare_chunks};
pub use response::{SignResponse, parse_sign_response};
pub use session::{SessionState, SigningSession};
pub use status::{StatusWord, status_to_string};

use async_trait::async_trait;

use crate::error::Result;

/// A transport layer for communicating with a Ledger device.
///
/// Implementations own framing, discovery and connection lifecycle. A
/// transport must not be shared by two sessions: the device keeps signing
/// state between chunks.
#[async_trait]
pub trait Transport: Send {
    /// Sends an APDU command and receives the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) or
    /// [`Error::DeviceDisconnected`](crate::Error::DeviceDisconnected) if
    /// communication fails, and
    /// [`Error::TruncatedResponse`](crate::Error::TruncatedResponse) if the
    /// device answered with fewer than two bytes.
    async fn transmit(&mut self, apdu: &Apdu) -> Result<ApduResponse>;

    /// Checks if the transport is still connected.
    fn is_connected(&self) -> bool;

    /// Sends an APDU and checks the status word against `accepted`.
    ///
    /// # Errors
    ///
    /// Returns any [`transmit`](Self::transmit) error, or
    /// [`Error::UnexpectedStatusWord`](crate::Error::UnexpectedStatusWord) if
    /// the device answered with a status outside `accepted`.
    async fn send(&mut self, apdu: &Apdu, accepted: &[StatusWord]) -> Result<ApduResponse> {
        let response = self.transmit(apdu).await?;
        response.check_accepted(accepted)?;
        Ok(response)
    }
}
