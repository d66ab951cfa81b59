//! APDU (Application Protocol Data Unit) command and response types.
//!
//! # APDU Command Structure
//!
//! ```text
//! | CLA | INS | P1 | P2 | Lc | Data |
//! |-----|-----|----|----|----|------|
//! | 1B  | 1B  | 1B | 1B | 1B | Var  |
//! ```
//!
//! - **CLA**: Class byte (`0x09` for the Stacks app)
//! - **INS**: Instruction byte
//! - **P1, P2**: Parameter bytes (P1 carries the payload type when signing)
//! - **Lc**: Length of command data
//! - **Data**: Command data, at most 255 bytes
//!
//! # APDU Response Structure
//!
//! ```text
//! | Data | SW1 | SW2 |
//! |------|-----|-----|
//! | Var  | 1B  | 1B  |
//! ```
//!
//! The status word `SW1 SW2` is big-endian.
//!
//! # Example
//!
//! ```
//! use ledger_stacks_signer_core::ledger::{Apdu, ApduResponse};
//!
//! let apdu = Apdu::new(0x09, 0x02, 0x00, 0x00, vec![0x2C, 0x00, 0x00, 0x80]).unwrap();
//! assert_eq!(apdu.to_bytes(), vec![0x09, 0x02, 0x00, 0x00, 0x04, 0x2C, 0x00, 0x00, 0x80]);
//!
//! let response = ApduResponse::from_bytes(vec![0x01, 0x90, 0x00]).unwrap();
//! assert!(response.is_success());
//! ```

use crate::error::{Error, Result};

use super::status::{StatusWord, status_to_string};

/// An APDU command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apdu {
    /// Class byte.
    cla: u8,

    /// Instruction byte.
    ins: u8,

    /// Parameter 1.
    p1: u8,

    /// Parameter 2.
    p2: u8,

    /// Command data.
    data: Vec<u8>,
}

impl Apdu {
    /// Maximum short APDU data length.
    pub const MAX_DATA: usize = 255;

    /// Creates a new APDU command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if `data` does not fit in a short
    /// APDU.
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Result<Self> {
        if data.len() > Self::MAX_DATA {
            return Err(Error::PayloadTooLarge {
                len: data.len(),
                max: Self::MAX_DATA,
            });
        }
        Ok(Self {
            cla,
            ins,
            p1,
            p2,
            data,
        })
    }

    /// Returns the class byte.
    #[must_use]
    pub const fn cla(&self) -> u8 {
        self.cla
    }

    /// Returns the instruction byte.
    #[must_use]
    pub const fn ins(&self) -> u8 {
        self.ins
    }

    /// Returns parameter 1.
    #[must_use]
    pub const fn p1(&self) -> u8 {
        self.p1
    }

    /// Returns parameter 2.
    #[must_use]
    pub const fn p2(&self) -> u8 {
        self.p2
    }

    /// Returns the command data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Serializes the APDU to bytes.
    ///
    /// The Lc byte is always present, zero for an empty body, as the Ledger
    /// transports expect.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(5 + self.data.len());

        bytes.push(self.cla);
        bytes.push(self.ins);
        bytes.push(self.p1);
        bytes.push(self.p2);
        // Length is bounded by MAX_DATA in the constructor.
        bytes.push(u8::try_from(self.data.len()).unwrap_or(u8::MAX));
        bytes.extend_from_slice(&self.data);

        bytes
    }
}

/// An APDU response from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    /// Response data.
    data: Vec<u8>,

    /// Status word 1.
    sw1: u8,

    /// Status word 2.
    sw2: u8,
}

impl ApduResponse {
    /// Length of the trailing status word.
    pub const STATUS_LEN: usize = 2;

    /// Splits raw response bytes into data and status word.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncatedResponse`] if fewer than two bytes were
    /// received.
    ///
    /// # Example
    ///
    /// ```
    /// use ledger_stacks_signer_core::ledger::ApduResponse;
    ///
    /// let response = ApduResponse::from_bytes(vec![0x01, 0x02, 0x6A, 0x80]).unwrap();
    /// assert_eq!(response.data(), &[0x01, 0x02]);
    /// assert_eq!(response.status_word(), 0x6A80);
    ///
    /// assert!(ApduResponse::from_bytes(vec![0x90]).is_err());
    /// ```
    pub fn from_bytes(mut bytes: Vec<u8>) -> Result<Self> {
        let Some(&[sw1, sw2]) = bytes.last_chunk::<2>() else {
            return Err(Error::TruncatedResponse {
                len: bytes.len(),
                expected: Self::STATUS_LEN,
            });
        };
        bytes.truncate(bytes.len() - Self::STATUS_LEN);

        Ok(Self {
            data: bytes,
            sw1,
            sw2,
        })
    }

    /// Builds a response from a body and a status word.
    #[must_use]
    pub fn new(data: Vec<u8>, status: u16) -> Self {
        let [sw1, sw2] = status.to_be_bytes();
        Self { data, sw1, sw2 }
    }

    /// Returns the response data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the response and returns the data.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns status word 1.
    #[must_use]
    pub const fn sw1(&self) -> u8 {
        self.sw1
    }

    /// Returns status word 2.
    #[must_use]
    pub const fn sw2(&self) -> u8 {
        self.sw2
    }

    /// Returns the full status word as a [`u16`].
    #[must_use]
    pub const fn status_word(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }

    /// Returns the status as a known [`StatusWord`], if it is one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusWord> {
        StatusWord::from_code(self.status_word())
    }

    /// Checks if the response indicates success (`SW = 0x9000`).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_word() == StatusWord::NoErrors.code()
    }

    /// Returns the total length of the raw response, status word included.
    #[must_use]
    pub fn raw_len(&self) -> usize {
        self.data.len() + Self::STATUS_LEN
    }

    /// Checks the status word against the set the command accepts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedStatusWord`] if the status is not listed.
    pub fn check_accepted(&self, accepted: &[StatusWord]) -> Result<()> {
        if accepted.iter().any(|s| s.code() == self.status_word()) {
            Ok(())
        } else {
            Err(self.to_error())
        }
    }

    /// Converts the status word to a descriptive error.
    #[must_use]
    pub fn to_error(&self) -> Error {
        let status = self.status_word();
        let mut message = status_to_string(status);
        if !self.data.is_empty() {
            message = format!("{message} : {}", ascii_lossy(&self.data));
        }
        Error::UnexpectedStatusWord { status, message }
    }
}

/// Decodes bytes as 7-bit ASCII, masking the high bit like the device does.
pub(crate) fn ascii_lossy(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b & 0x7F)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apdu_new() {
        let apdu = Apdu::new(0x09, 0x02, 0x01, 0x00, vec![0xA0, 0x00]).unwrap();

        assert_eq!(apdu.cla(), 0x09);
        assert_eq!(apdu.ins(), 0x02);
        assert_eq!(apdu.p1(), 0x01);
        assert_eq!(apdu.p2(), 0x00);
        assert_eq!(apdu.data(), &[0xA0, 0x00]);
    }

    #[test]
    fn apdu_too_long() {
        let result = Apdu::new(0x09, 0x02, 0x00, 0x00, vec![0; 256]);
        assert!(matches!(
            result,
            Err(Error::PayloadTooLarge { len: 256, max: 255 })
        ));
    }

    #[test]
    fn apdu_to_bytes_empty_body() {
        let apdu = Apdu::new(0x09, 0x00, 0x00, 0x00, vec![]).unwrap();
        assert_eq!(apdu.to_bytes(), vec![0x09, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn apdu_to_bytes_full_body() {
        let apdu = Apdu::new(0x09, 0x02, 0x02, 0x00, vec![0x11; 255]).unwrap();
        let bytes = apdu.to_bytes();

        assert_eq!(bytes.len(), 5 + 255);
        assert_eq!(bytes[4], 0xFF);
    }

    #[test]
    fn response_status_only() {
        let response = ApduResponse::from_bytes(vec![0x90, 0x00]).unwrap();

        assert!(response.data().is_empty());
        assert_eq!(response.status_word(), 0x9000);
        assert_eq!(response.status(), Some(StatusWord::NoErrors));
        assert!(response.is_success());
        assert_eq!(response.raw_len(), 2);
    }

    #[test]
    fn response_truncated() {
        assert!(matches!(
            ApduResponse::from_bytes(vec![]),
            Err(Error::TruncatedResponse {
                len: 0,
                expected: 2
            })
        ));
        assert!(matches!(
            ApduResponse::from_bytes(vec![0x90]),
            Err(Error::TruncatedResponse { len: 1, .. })
        ));
    }

    #[test]
    fn response_new_matches_from_bytes() {
        let built = ApduResponse::new(vec![0xAB], 0x6986);
        let parsed = ApduResponse::from_bytes(vec![0xAB, 0x69, 0x86]).unwrap();
        assert_eq!(built, parsed);
        assert_eq!(built.sw1(), 0x69);
        assert_eq!(built.sw2(), 0x86);
    }

    #[test]
    fn check_accepted_passes_listed() {
        let response = ApduResponse::new(vec![], 0x6A80);
        let accepted = [StatusWord::NoErrors, StatusWord::BadKeyHandle];
        assert!(response.check_accepted(&accepted).is_ok());
    }

    #[test]
    fn check_accepted_rejects_unlisted() {
        let response = ApduResponse::new(vec![], 0x6986);
        let err = response
            .check_accepted(&[StatusWord::NoErrors])
            .unwrap_err();

        match err {
            Error::UnexpectedStatusWord { status, message } => {
                assert_eq!(status, 0x6986);
                assert_eq!(message, "Transaction rejected");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn to_error_appends_diagnostic() {
        let response = ApduResponse::new(b"oops".to_vec(), 0x6F00);
        let err = response.to_error();
        assert_eq!(
            err.to_string(),
            "unexpected status word 0x6f00: Unknown error : oops"
        );
    }

    #[test]
    fn into_data() {
        let response = ApduResponse::from_bytes(vec![0x01, 0x02, 0x90, 0x00]).unwrap();
        assert_eq!(response.into_data(), vec![0x01, 0x02]);
    }

    #[test]
    fn ascii_masks_high_bit() {
        assert_eq!(ascii_lossy(&[b'o', b'k' | 0x80]), "ok");
    }
}
