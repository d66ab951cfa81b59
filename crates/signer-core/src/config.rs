//! Signer configuration.
//!
//! The defaults match the Stacks app; override them only when talking to a
//! fork of the app that uses a different class byte or a smaller APDU buffer.
//!
//! # Example
//!
//! ```
//! use ledger_stacks_signer_core::config::SignerConfig;
//!
//! let config = SignerConfig::from_json(r#"{ "chunkSize": 200 }"#).unwrap();
//! assert_eq!(config.cla, 0x09);
//! assert_eq!(config.chunk_size, 200);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ledger::{Apdu, DEFAULT_CHUNK_SIZE};

/// APDU class byte of the Stacks app.
pub const DEFAULT_CLA: u8 = 0x09;

/// Configuration for a [`SigningSession`](crate::ledger::SigningSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SignerConfig {
    /// APDU class byte.
    pub cla: u8,

    /// Maximum number of message bytes per chunk.
    pub chunk_size: usize,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            cla: DEFAULT_CLA,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl SignerConfig {
    /// Parses and validates a JSON configuration. Missing fields take their
    /// default values.
    ///
    /// # Errors
    ///
    /// - [`Error::JsonError`] if the JSON is malformed or has unknown fields
    /// - [`Error::InvalidConfig`] if a value is out of range
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every chunk fits in a short APDU.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `chunk_size` is not in `1..=255`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > Apdu::MAX_DATA {
            return Err(Error::InvalidConfig(format!(
                "chunk size must be in 1..={}, got {}",
                Apdu::MAX_DATA,
                self.chunk_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SignerConfig::default();
        assert_eq!(config.cla, 0x09);
        assert_eq!(config.chunk_size, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(SignerConfig::from_json("{}").unwrap(), SignerConfig::default());
    }

    #[test]
    fn oversized_chunk_rejected() {
        let err = SignerConfig::from_json(r#"{ "chunkSize": 256 }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn zero_chunk_rejected() {
        let config = SignerConfig {
            chunk_size: 0,
            ..SignerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_field_rejected() {
        let err = SignerConfig::from_json(r#"{ "timeout": 5 }"#).unwrap_err();
        assert!(matches!(err, Error::JsonError(_)));
    }
}
