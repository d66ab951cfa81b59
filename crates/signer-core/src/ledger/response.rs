//! Parsing of signing responses.
//!
//! A signing APDU is answered with `[body][SW1 SW2]`. The body is empty for
//! intermediate chunks, an ASCII diagnostic for [`StatusWord::DataIsInvalid`]
//! and [`StatusWord::BadKeyHandle`], and the signature after a successful
//! final chunk:
//!
//! ```text
//! | compact r||s||v (65B) | DER (variable) | SW1 | SW2 |
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::signature::Signature;

use super::apdu::{ApduResponse, ascii_lossy};
use super::status::{StatusWord, status_to_string};

/// The outcome of one signing exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    /// The raw device status word.
    return_code: u16,

    /// Human-readable status, with the device diagnostic appended when present.
    error_message: String,

    /// The signature, present only when the device returned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<Signature>,
}

impl SignResponse {
    /// Returns the raw status word.
    #[must_use]
    pub const fn return_code(&self) -> u16 {
        self.return_code
    }

    /// Returns the human-readable status message.
    #[must_use]
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Returns the signature, if the device produced one.
    #[must_use]
    pub const fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Consumes the response and returns the signature.
    #[must_use]
    pub fn into_signature(self) -> Option<Signature> {
        self.signature
    }

    /// Returns the 65-byte compact signature, if present.
    #[must_use]
    pub fn signature_compact(&self) -> Option<&[u8; 65]> {
        self.signature.as_ref().map(Signature::compact)
    }

    /// Returns the DER signature, if present.
    #[must_use]
    pub fn signature_der(&self) -> Option<&[u8]> {
        self.signature.as_ref().map(Signature::der)
    }

    /// Checks if the device reported success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.return_code == StatusWord::NoErrors.code()
    }
}

/// Interprets a signing response.
///
/// # Errors
///
/// Returns [`Error::TruncatedResponse`](crate::Error::TruncatedResponse) if a
/// successful response carries a body too short to hold a compact signature.
///
/// # Example
///
/// ```
/// use ledger_stacks_signer_core::ledger::{ApduResponse, parse_sign_response};
///
/// let raw = [vec![0u8; 65], vec![0x30; 20], vec![0x90, 0x00]].concat();
/// let response = parse_sign_response(&ApduResponse::from_bytes(raw).unwrap()).unwrap();
///
/// assert_eq!(response.return_code(), 0x9000);
/// assert_eq!(response.signature_der().map(<[u8]>::len), Some(20));
/// ```
pub fn parse_sign_response(response: &ApduResponse) -> Result<SignResponse> {
    let return_code = response.status_word();
    let body = response.data();
    let mut error_message = status_to_string(return_code);

    let carries_diagnostic = response
        .status()
        .is_some_and(StatusWord::carries_diagnostic);

    if carries_diagnostic {
        error_message = format!("{error_message} : {}", ascii_lossy(body));
    }

    let signature = if body.is_empty() || carries_diagnostic {
        None
    } else {
        Some(Signature::from_response_body(body)?)
    };

    Ok(SignResponse {
        return_code,
        error_message,
        signature,
    })
}
