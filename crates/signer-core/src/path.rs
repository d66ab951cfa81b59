//! Hierarchical derivation paths and their device wire encoding.
//!
//! The Stacks app expects the signing key's derivation path as the first chunk
//! of every signing sequence, encoded as five little-endian `u32` values:
//!
//! ```text
//! | purpose | coin    | account | change  | index   |
//! |---------|---------|---------|---------|---------|
//! | 4B (LE) | 4B (LE) | 4B (LE) | 4B (LE) | 4B (LE) |
//! ```
//!
//! Hardened components carry bit 31 (`0x80000000`). In text form they are
//! marked with a trailing `'`.
//!
//! # Example
//!
//! ```
//! use ledger_stacks_signer_core::path::serialize_path;
//!
//! let buf = serialize_path("m/44'/5757'/5'/0/3").unwrap();
//! assert_eq!(&buf[0..4], &[0x2C, 0x00, 0x00, 0x80]);
//! assert_eq!(&buf[16..20], &[0x03, 0x00, 0x00, 0x00]);
//! ```

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The hardened derivation flag (bit 31).
pub const HARDENED: u32 = 0x8000_0000;

/// Number of components in a device derivation path.
pub const PATH_COMPONENTS: usize = 5;

/// Length of an encoded derivation path in bytes.
pub const ENCODED_PATH_LEN: usize = 4 * PATH_COMPONENTS;

/// The root marker every textual path starts with.
const ROOT: &str = "m";

/// A single derivation path component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawChildNumber")]
pub struct ChildNumber {
    /// The child index, always below [`HARDENED`].
    index: u32,

    /// Whether the component is hardened.
    hardened: bool,
}

/// Unchecked serde form of [`ChildNumber`].
#[derive(Deserialize)]
struct RawChildNumber {
    index: u32,
    hardened: bool,
}

impl TryFrom<RawChildNumber> for ChildNumber {
    type Error = Error;

    fn try_from(raw: RawChildNumber) -> Result<Self> {
        Self::new(raw.index, raw.hardened)
    }
}

impl ChildNumber {
    /// Creates a non-hardened component.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ComponentOutOfRange`] if `index` has bit 31 set.
    pub fn normal(index: u32) -> Result<Self> {
        Self::new(index, false)
    }

    /// Creates a hardened component.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ComponentOutOfRange`] if `index` has bit 31 set.
    pub fn hardened(index: u32) -> Result<Self> {
        Self::new(index, true)
    }

    fn new(index: u32, hardened: bool) -> Result<Self> {
        if index >= HARDENED {
            return Err(Error::ComponentOutOfRange {
                token: index.to_string(),
            });
        }
        Ok(Self { index, hardened })
    }

    /// Returns the child index without the hardened flag.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Checks if the component is hardened.
    #[must_use]
    pub const fn is_hardened(self) -> bool {
        self.hardened
    }

    /// Returns the wire value, with bit 31 set for hardened components.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }

    /// Splits a wire value into index and hardened flag.
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        Self {
            index: value & !HARDENED,
            hardened: value & HARDENED != 0,
        }
    }

    /// Parses one textual component such as `44'` or `0`.
    fn parse(token: &str) -> Result<Self> {
        let (digits, hardened) = match token.strip_suffix('\'') {
            Some(stripped) => (stripped, true),
            None => (token, false),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidComponent {
                token: digits.to_string(),
            });
        }

        // All digits, so the only possible parse failure is overflow.
        let out_of_range = || Error::ComponentOutOfRange {
            token: digits.to_string(),
        };
        let value: u64 = digits.parse().map_err(|_| out_of_range())?;
        let index = u32::try_from(value)
            .ok()
            .filter(|v| *v < HARDENED)
            .ok_or_else(out_of_range)?;

        Ok(Self { index, hardened })
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// A five-component derivation path such as `m/44'/5757'/0'/0/0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivationPath {
    components: [ChildNumber; PATH_COMPONENTS],
}

impl DerivationPath {
    /// Creates a path from its components.
    #[must_use]
    pub const fn new(components: [ChildNumber; PATH_COMPONENTS]) -> Self {
        Self { components }
    }

    /// Parses a textual path.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedPath`] if the path does not start with `m` or does
    ///   not have exactly five components
    /// - [`Error::InvalidComponent`] if a component is not a decimal number
    /// - [`Error::ComponentOutOfRange`] if a component is `>= 0x80000000`
    ///
    /// # Example
    ///
    /// ```
    /// use ledger_stacks_signer_core::path::DerivationPath;
    ///
    /// let path = DerivationPath::parse("m/44'/5757'/0'/0/7").unwrap();
    /// assert_eq!(path.components()[4].index(), 7);
    /// assert!(!path.components()[4].is_hardened());
    /// ```
    pub fn parse(path: &str) -> Result<Self> {
        if !path.starts_with(ROOT) {
            return Err(Error::MalformedPath(format!(
                "path should start with \"{ROOT}\""
            )));
        }

        let tokens: Vec<&str> = path.split('/').collect();
        if tokens.len() != PATH_COMPONENTS + 1 {
            return Err(Error::MalformedPath(format!(
                "expected {PATH_COMPONENTS} components, got {}",
                tokens.len() - 1
            )));
        }
        if tokens[0] != ROOT {
            return Err(Error::MalformedPath(format!(
                "invalid root {:?}",
                tokens[0]
            )));
        }

        let mut components = [ChildNumber::from_u32(0); PATH_COMPONENTS];
        for (slot, token) in components.iter_mut().zip(&tokens[1..]) {
            *slot = ChildNumber::parse(token)?;
        }

        Ok(Self { components })
    }

    /// Returns the path components, root excluded.
    #[must_use]
    pub const fn components(&self) -> &[ChildNumber; PATH_COMPONENTS] {
        &self.components
    }

    /// Encodes the path into the 20-byte device layout.
    #[must_use]
    pub fn encode(&self) -> [u8; ENCODED_PATH_LEN] {
        let mut buf = [0u8; ENCODED_PATH_LEN];
        for (chunk, child) in buf.chunks_exact_mut(4).zip(&self.components) {
            chunk.copy_from_slice(&child.to_u32().to_le_bytes());
        }
        buf
    }

    /// Decodes a path from the 20-byte device layout.
    ///
    /// # Example
    ///
    /// ```
    /// use ledger_stacks_signer_core::path::DerivationPath;
    ///
    /// let path = DerivationPath::parse("m/44'/5757'/5'/0/3").unwrap();
    /// assert_eq!(DerivationPath::from_encoded(&path.encode()), path);
    /// ```
    #[must_use]
    pub fn from_encoded(buf: &[u8; ENCODED_PATH_LEN]) -> Self {
        let mut components = [ChildNumber::from_u32(0); PATH_COMPONENTS];
        for (slot, chunk) in components.iter_mut().zip(buf.chunks_exact(4)) {
            let mut word = [0u8; 4];
            word.copy_from_slice(chunk);
            *slot = ChildNumber::from_u32(u32::from_le_bytes(word));
        }
        Self { components }
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&[u8]> for DerivationPath {
    type Error = Error;

    /// Parses a path from raw bytes, which must be UTF-8 text.
    fn try_from(bytes: &[u8]) -> Result<Self> {
        let text = core::str::from_utf8(bytes).map_err(|e| {
            Error::InvalidInput(format!(
                "path should be a string (e.g \"m/44'/5757'/5'/0/3\"): {e}"
            ))
        })?;
        Self::parse(text)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ROOT)?;
        for child in &self.components {
            write!(f, "/{child}")?;
        }
        Ok(())
    }
}

/// Parses a textual path and encodes it into the 20-byte device layout.
///
/// # Errors
///
/// See [`DerivationPath::parse`].
pub fn serialize_path(path: &str) -> Result<[u8; ENCODED_PATH_LEN]> {
    DerivationPath::parse(path).map(|p| p.encode())
}
