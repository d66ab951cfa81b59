//! secp256k1 signatures returned by the Stacks app.
//!
//! After the last chunk of a signing sequence the device returns the same
//! signature in two encodings, back to back:
//!
//! ```text
//! | r (32B) | s (32B) | v (1B) | DER (variable) |
//! |------------- compact -------|                |
//! ```
//!
//! - `r`, `s`: the ECDSA scalars, big-endian
//! - `v`: the recovery parameter
//! - `DER`: `30 len 02 r_len r 02 s_len s`
//!
//! # Example
//!
//! ```
//! use ledger_stacks_signer_core::Signature;
//!
//! let sig = Signature::new([1u8; 65], vec![0x30, 0x00]);
//! assert_eq!(sig.r(), &[1u8; 32]);
//! assert_eq!(sig.v(), 1);
//! ```

use core::fmt;

use k256::ecdsa::Signature as K256Signature;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Length of the compact `r || s || v` encoding.
pub const COMPACT_LEN: usize = 65;

/// A signature as returned by the device: compact form plus DER form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// The compact `r || s || v` encoding (65 bytes).
    #[serde(with = "hex_bytes")]
    compact: [u8; COMPACT_LEN],

    /// The DER encoding of `(r, s)`.
    #[serde(with = "hex_vec")]
    der: Vec<u8>,
}

/// Serde helper for hex encoding/decoding the fixed compact array.
mod hex_bytes {
    use hex::{decode, encode};
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::COMPACT_LEN;

    pub(super) fn serialize<S>(bytes: &[u8; COMPACT_LEN], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", encode(bytes)))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<[u8; COMPACT_LEN], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = decode(s).map_err(de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| de::Error::custom("expected 65 bytes"))
    }
}

/// Serde helper for hex encoding/decoding variable-length bytes.
mod hex_vec {
    use hex::{decode, encode};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub(super) fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", encode(bytes)))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        decode(s).map_err(de::Error::custom)
    }
}

impl Signature {
    /// Creates a signature from its two encodings.
    #[must_use]
    pub const fn new(compact: [u8; COMPACT_LEN], der: Vec<u8>) -> Self {
        Self { compact, der }
    }

    /// Splits a device response body into compact and DER signatures.
    ///
    /// # Arguments
    ///
    /// * `body` - The response body, status word already removed
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncatedResponse`] if the body is shorter than the
    /// compact encoding.
    ///
    /// # Example
    ///
    /// ```
    /// use ledger_stacks_signer_core::Signature;
    ///
    /// let body = [[7u8; 65].as_slice(), &[0x30, 0x06]].concat();
    /// let sig = Signature::from_response_body(&body).unwrap();
    /// assert_eq!(sig.der(), &[0x30, 0x06]);
    /// ```
    pub fn from_response_body(body: &[u8]) -> Result<Self> {
        let Some((compact, der)) = body.split_first_chunk::<COMPACT_LEN>() else {
            return Err(Error::TruncatedResponse {
                len: body.len(),
                expected: COMPACT_LEN,
            });
        };
        Ok(Self::new(*compact, der.to_vec()))
    }

    /// Returns the compact `r || s || v` encoding.
    #[must_use]
    pub const fn compact(&self) -> &[u8; COMPACT_LEN] {
        &self.compact
    }

    /// Returns the DER encoding.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Returns the R component of the compact signature.
    #[must_use]
    pub fn r(&self) -> &[u8; 32] {
        self.compact
            .first_chunk::<32>()
            .unwrap_or_else(|| unreachable!("compact signature is 65 bytes"))
    }

    /// Returns the S component of the compact signature.
    #[must_use]
    pub fn s(&self) -> &[u8; 32] {
        self.compact[32..]
            .first_chunk::<32>()
            .unwrap_or_else(|| unreachable!("compact signature is 65 bytes"))
    }

    /// Returns the recovery parameter (v).
    #[must_use]
    pub const fn v(&self) -> u8 {
        self.compact[COMPACT_LEN - 1]
    }

    /// Parses the DER encoding into a secp256k1 ECDSA signature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignature`] if the DER encoding is malformed.
    pub fn to_ecdsa(&self) -> Result<K256Signature> {
        K256Signature::from_der(&self.der).map_err(|e| Error::InvalidSignature(e.to_string()))
    }

    /// Checks that the DER and compact encodings carry the same `(r, s)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignature`] if the DER encoding is malformed or
    /// disagrees with the compact encoding.
    pub fn verify_consistency(&self) -> Result<()> {
        let parsed = self.to_ecdsa()?;
        if parsed.to_bytes().as_slice() == &self.compact[..64] {
            Ok(())
        } else {
            Err(Error::InvalidSignature(
                "DER signature does not match compact signature".to_string(),
            ))
        }
    }

    /// Encodes the compact signature as a hex string with `0x` prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.compact))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// DER for r = 1, s = 2.
    const SMALL_DER: [u8; 8] = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02];

    fn compact_for_small_der(v: u8) -> [u8; 65] {
        let mut compact = [0u8; 65];
        compact[31] = 1;
        compact[63] = 2;
        compact[64] = v;
        compact
    }

    #[test]
    fn components() {
        let mut compact = [0u8; 65];
        compact[..32].copy_from_slice(&[1u8; 32]);
        compact[32..64].copy_from_slice(&[2u8; 32]);
        compact[64] = 1;

        let sig = Signature::new(compact, vec![]);

        assert_eq!(sig.r(), &[1u8; 32]);
        assert_eq!(sig.s(), &[2u8; 32]);
        assert_eq!(sig.v(), 1);
    }

    #[test]
    fn from_response_body_splits() {
        let body = [[9u8; 65].as_slice(), &[0xAA; 20]].concat();
        let sig = Signature::from_response_body(&body).unwrap();

        assert_eq!(sig.compact(), &[9u8; 65]);
        assert_eq!(sig.der().len(), 20);
    }

    #[test]
    fn from_response_body_without_der() {
        let sig = Signature::from_response_body(&[3u8; 65]).unwrap();
        assert!(sig.der().is_empty());
    }

    #[test]
    fn from_response_body_truncated() {
        let result = Signature::from_response_body(&[0u8; 64]);
        assert!(matches!(
            result,
            Err(Error::TruncatedResponse {
                len: 64,
                expected: 65
            })
        ));
    }

    #[test]
    fn consistent_der_and_compact() {
        let sig = Signature::new(compact_for_small_der(0), SMALL_DER.to_vec());
        assert!(sig.verify_consistency().is_ok());
    }

    #[test]
    fn inconsistent_der_and_compact() {
        let mut compact = compact_for_small_der(0);
        compact[63] = 3;
        let sig = Signature::new(compact, SMALL_DER.to_vec());
        assert!(matches!(
            sig.verify_consistency(),
            Err(Error::InvalidSignature(_))
        ));
    }

    #[test]
    fn malformed_der() {
        let sig = Signature::new([0u8; 65], vec![0x31, 0x00]);
        assert!(matches!(sig.to_ecdsa(), Err(Error::InvalidSignature(_))));
    }

    #[test]
    fn serde_uses_hex() {
        let sig = Signature::new(compact_for_small_der(1), SMALL_DER.to_vec());
        let json = serde_json::to_value(&sig).unwrap();

        assert_eq!(json["der"], "0x3006020101020102");
        let back: Signature = serde_json::from_value(json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn display_is_compact_hex() {
        let sig = Signature::new([0u8; 65], vec![]);
        let display = format!("{sig}");
        assert!(display.starts_with("0x"));
        assert_eq!(display.len(), 132);
    }
}
