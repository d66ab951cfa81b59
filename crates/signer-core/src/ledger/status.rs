//! Status words reported by the Stacks app.
//!
//! Every response ends with a two-byte status word. Besides the ISO 7816-4
//! codes, the table includes the U2F transport codes used by browser
//! transports.
//!
//! | Status   | Meaning                      |
//! |----------|------------------------------|
//! | `0x9000` | No errors                    |
//! | `0x6984` | Data is invalid              |
//! | `0x6986` | Transaction rejected         |
//! | `0x6A80` | Bad key handle               |
//! | `0x6E00` | App does not seem to be open |
//!
//! # Example
//!
//! ```
//! use ledger_stacks_signer_core::ledger::{StatusWord, status_to_string};
//!
//! assert_eq!(StatusWord::NoErrors.code(), 0x9000);
//! assert_eq!(status_to_string(0x6A80), "Bad key handle");
//! assert_eq!(status_to_string(0x1234), "Unknown Status Code: 4660");
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

/// A known device status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum StatusWord {
    /// U2F: unknown error.
    U2fUnknown = 0x0001,
    /// U2F: bad request.
    U2fBadRequest = 0x0002,
    /// U2F: configuration unsupported.
    U2fConfigurationUnsupported = 0x0003,
    /// U2F: device ineligible.
    U2fDeviceIneligible = 0x0004,
    /// U2F: timeout.
    U2fTimeout = 0x0005,
    /// Transport timeout.
    Timeout = 0x000E,
    /// Success.
    NoErrors = 0x9000,
    /// The device is busy.
    DeviceIsBusy = 0x9001,
    /// Key derivation failed on the device.
    ErrorDerivingKeys = 0x6802,
    /// Generic execution error.
    ExecutionError = 0x6400,
    /// Wrong command length.
    WrongLength = 0x6700,
    /// Empty buffer.
    EmptyBuffer = 0x6982,
    /// Output buffer too small.
    OutputBufferTooSmall = 0x6983,
    /// The payload was rejected by the parser; the body carries a diagnostic.
    DataIsInvalid = 0x6984,
    /// Conditions of use not satisfied.
    ConditionsNotSatisfied = 0x6985,
    /// The user rejected the transaction.
    TransactionRejected = 0x6986,
    /// The key could not be used; the body carries a diagnostic.
    BadKeyHandle = 0x6A80,
    /// Invalid P1/P2 parameters.
    InvalidP1P2 = 0x6B00,
    /// Instruction not supported.
    InstructionNotSupported = 0x6D00,
    /// The Stacks app is not open.
    AppDoesNotSeemToBeOpen = 0x6E00,
    /// Unknown device error.
    UnknownError = 0x6F00,
    /// Signature verification failed on the device.
    SignVerifyError = 0x6F01,
}

impl StatusWord {
    /// Returns the raw status word.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Returns the human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::U2fUnknown => "U2F: Unknown",
            Self::U2fBadRequest => "U2F: Bad request",
            Self::U2fConfigurationUnsupported => "U2F: Configuration unsupported",
            Self::U2fDeviceIneligible => "U2F: Device Ineligible",
            Self::U2fTimeout => "U2F: Timeout",
            Self::Timeout => "Timeout",
            Self::NoErrors => "No errors",
            Self::DeviceIsBusy => "Device is busy",
            Self::ErrorDerivingKeys => "Error deriving keys",
            Self::ExecutionError => "Execution Error",
            Self::WrongLength => "Wrong Length",
            Self::EmptyBuffer => "Empty Buffer",
            Self::OutputBufferTooSmall => "Output buffer too small",
            Self::DataIsInvalid => "Data is invalid",
            Self::ConditionsNotSatisfied => "Conditions not satisfied",
            Self::TransactionRejected => "Transaction rejected",
            Self::BadKeyHandle => "Bad key handle",
            Self::InvalidP1P2 => "Invalid P1/P2",
            Self::InstructionNotSupported => "Instruction not supported",
            Self::AppDoesNotSeemToBeOpen => "App does not seem to be open",
            Self::UnknownError => "Unknown error",
            Self::SignVerifyError => "Sign/verify error",
        }
    }

    /// Looks up a status word by its raw code.
    ///
    /// # Example
    ///
    /// ```
    /// use ledger_stacks_signer_core::ledger::StatusWord;
    ///
    /// assert_eq!(StatusWord::from_code(0x6984), Some(StatusWord::DataIsInvalid));
    /// assert_eq!(StatusWord::from_code(0xBEEF), None);
    /// ```
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0x0001 => Self::U2fUnknown,
            0x0002 => Self::U2fBadRequest,
            0x0003 => Self::U2fConfigurationUnsupported,
            0x0004 => Self::U2fDeviceIneligible,
            0x0005 => Self::U2fTimeout,
            0x000E => Self::Timeout,
            0x9000 => Self::NoErrors,
            0x9001 => Self::DeviceIsBusy,
            0x6802 => Self::ErrorDerivingKeys,
            0x6400 => Self::ExecutionError,
            0x6700 => Self::WrongLength,
            0x6982 => Self::EmptyBuffer,
            0x6983 => Self::OutputBufferTooSmall,
            0x6984 => Self::DataIsInvalid,
            0x6985 => Self::ConditionsNotSatisfied,
            0x6986 => Self::TransactionRejected,
            0x6A80 => Self::BadKeyHandle,
            0x6B00 => Self::InvalidP1P2,
            0x6D00 => Self::InstructionNotSupported,
            0x6E00 => Self::AppDoesNotSeemToBeOpen,
            0x6F00 => Self::UnknownError,
            0x6F01 => Self::SignVerifyError,
            _ => return None,
        })
    }

    /// Checks if the device appends an ASCII diagnostic to the response body
    /// for this status.
    #[must_use]
    pub const fn carries_diagnostic(self) -> bool {
        matches!(self, Self::DataIsInvalid | Self::BadKeyHandle)
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl TryFrom<u16> for StatusWord {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or(value)
    }
}

/// Maps any raw status word to a human-readable string.
///
/// Unknown codes render as `Unknown Status Code: <decimal>`.
#[must_use]
pub fn status_to_string(code: u16) -> String {
    StatusWord::from_code(code).map_or_else(
        || format!("Unknown Status Code: {code}"),
        |status| status.description().to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip_for_all_known() {
        for code in [
            0x0001, 0x0002, 0x0003, 0x0004, 0x0005, 0x000E, 0x9000, 0x9001, 0x6802, 0x6400,
            0x6700, 0x6982, 0x6983, 0x6984, 0x6985, 0x6986, 0x6A80, 0x6B00, 0x6D00, 0x6E00,
            0x6F00, 0x6F01,
        ] {
            let status = StatusWord::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn known_descriptions() {
        assert_eq!(status_to_string(0x9000), "No errors");
        assert_eq!(status_to_string(0x6984), "Data is invalid");
        assert_eq!(status_to_string(0x6E00), "App does not seem to be open");
    }

    #[test]
    fn unknown_code_is_total() {
        assert_eq!(status_to_string(0x1234), "Unknown Status Code: 4660");
        assert_eq!(status_to_string(0xFFFF), "Unknown Status Code: 65535");
    }

    #[test]
    fn diagnostic_statuses() {
        assert!(StatusWord::DataIsInvalid.carries_diagnostic());
        assert!(StatusWord::BadKeyHandle.carries_diagnostic());
        assert!(!StatusWord::NoErrors.carries_diagnostic());
        assert!(!StatusWord::TransactionRejected.carries_diagnostic());
    }

    #[test]
    fn try_from_code() {
        assert_eq!(StatusWord::try_from(0x6A80), Ok(StatusWord::BadKeyHandle));
        assert_eq!(StatusWord::try_from(0x0BAD), Err(0x0BAD));
    }

    #[test]
    fn display() {
        assert_eq!(
            format!("{}", StatusWord::TransactionRejected),
            "Transaction rejected"
        );
    }
}
