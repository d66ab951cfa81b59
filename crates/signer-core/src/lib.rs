//! Ledger Stacks Signer Core Library
//!
//! This crate provides the host side of the signing exchange with the Stacks
//! app on Ledger hardware wallets.
//!
//! # Overview
//!
//! Signing a Stacks transaction on the device takes two steps:
//!
//! 1. Encode the key's derivation path (`m/44'/5757'/...`) into the 20-byte
//!    layout the app expects.
//! 2. Stream the path and the message to the device in chunks tagged
//!    `Init`/`Add`/`Last`, then read the signature from the final response.
//!
//! This library provides:
//!
//! - **Derivation Paths**: parsing, validation and wire encoding
//! - **Chunked Signing**: an explicit state machine over the APDU exchange
//! - **Response Parsing**: status words, device diagnostics and signatures
//! - **Transport Abstraction**: an async trait for any physical link
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │   Derivation Path   │   Signature   │   Signer Config       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Ledger Layer                             │
//! │  ┌─────────┐  ┌─────────┐  ┌──────────┐  ┌───────────────┐  │
//! │  │  APDU   │  │  Chunk  │  │ Signing  │  │   Transport   │  │
//! │  │ Encode  │  │ Framing │  │ Session  │  │  Abstraction  │  │
//! │  └─────────┘  └─────────┘  └──────────┘  └───────────────┘  │
//! ├─────────────────────────────────────────────────────────────┤
//! │            Transport Layer (HID / BLE / emulator)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## Encoding a Derivation Path
//!
//! ```rust
//! use ledger_stacks_signer_core::path::{HARDENED, serialize_path};
//!
//! let buf = serialize_path("m/44'/5757'/5'/0/3").unwrap();
//! assert_eq!(buf.len(), 20);
//! assert_eq!(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]), 44 | HARDENED);
//! ```
//!
//! ## Framing Chunks
//!
//! ```rust
//! use ledger_stacks_signer_core::ledger::{ChunkDescriptor, PayloadType};
//!
//! let first = ChunkDescriptor::new(1, 3).unwrap();
//! assert_eq!(first.payload_type(), PayloadType::Init);
//! ```
//!
//! ## Signing
//!
//! ```ignore
//! use ledger_stacks_signer_core::ledger::{SigningSession, Transport};
//!
//! let transport: Box<dyn Transport> = create_transport()?;
//! let mut session = SigningSession::new(transport);
//!
//! let response = session.sign("m/44'/5757'/0'/0/0", &tx_bytes).await?;
//! match response.signature() {
//!     Some(signature) => println!("signed: {signature}"),
//!     None => eprintln!("device refused: {}", response.error_message()),
//! }
//! ```
//!
//! # Logging
//!
//! The signing session emits [`tracing`] events: `debug` per chunk, `trace`
//! with raw APDU bytes, `warn` on rejections. Install a subscriber in the
//! application to see them.
//!
//! # Feature Flags
//!
//! This crate currently has no optional features.

// Modules
pub mod config;
pub mod error;
pub mod ledger;
pub mod path;
pub mod signature;

// Re-exports for convenience
pub use config::SignerConfig;
pub use error::{Error, Result};
pub use ledger::{SignResponse, SigningSession, Transport};
pub use path::{ChildNumber, DerivationPath, serialize_path};
pub use signature::Signature;

// Dev-dependencies used only by integration tests and examples
#[cfg(test)]
use proptest as _;
#[cfg(test)]
use tracing_subscriber as _;
