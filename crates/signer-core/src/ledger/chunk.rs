//! Chunk framing for multi-part signing payloads.
//!
//! A signing payload is sent as a sequence of APDUs. The first chunk always
//! carries the encoded derivation path; the message follows in chunks of at
//! most [`DEFAULT_CHUNK_SIZE`] bytes. Each APDU's P1 tells the device where the
//! chunk sits in the sequence:
//!
//! | Position      | [`PayloadType`] | P1     |
//! |---------------|-----------------|--------|
//! | first         | `Init`          | `0x00` |
//! | middle        | `Add`           | `0x01` |
//! | last (or only)| `Last`          | `0x02` |

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default maximum number of bytes per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 250;

/// Position marker carried in P1 of each signing APDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PayloadType {
    /// First chunk: the device resets and starts accumulating.
    Init = 0x00,

    /// Middle chunk: appended to the accumulated payload.
    Add = 0x01,

    /// Final chunk: the device parses and signs the accumulated payload.
    Last = 0x02,
}

impl PayloadType {
    /// Derives the payload type for a chunk position.
    ///
    /// `Last` takes precedence over `Init`: a payload sent as a single chunk
    /// (`index == count == 1`) is tagged `Last`, which is the framing the
    /// device expects.
    ///
    /// # Example
    ///
    /// ```
    /// use ledger_stacks_signer_core::ledger::{ChunkDescriptor, PayloadType};
    ///
    /// let only = ChunkDescriptor::new(1, 1).unwrap();
    /// assert_eq!(PayloadType::for_chunk(only), PayloadType::Last);
    /// ```
    #[must_use]
    pub const fn for_chunk(chunk: ChunkDescriptor) -> Self {
        if chunk.index == chunk.count {
            Self::Last
        } else if chunk.index == 1 {
            Self::Init
        } else {
            Self::Add
        }
    }

    /// Returns the P1 byte.
    #[must_use]
    pub const fn p1(self) -> u8 {
        self as u8
    }
}

/// A validated 1-based chunk position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawChunkDescriptor")]
pub struct ChunkDescriptor {
    index: usize,
    count: usize,
}

/// Unchecked serde form of [`ChunkDescriptor`].
#[derive(Deserialize)]
struct RawChunkDescriptor {
    index: usize,
    count: usize,
}

impl TryFrom<RawChunkDescriptor> for ChunkDescriptor {
    type Error = Error;

    fn try_from(raw: RawChunkDescriptor) -> Result<Self> {
        Self::new(raw.index, raw.count)
    }
}

impl ChunkDescriptor {
    /// Creates a chunk position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChunk`] unless `1 <= index <= count`.
    pub const fn new(index: usize, count: usize) -> Result<Self> {
        if index == 0 || index > count {
            return Err(Error::InvalidChunk { index, count });
        }
        Ok(Self { index, count })
    }

    /// Returns the 1-based index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// Returns the total number of chunks.
    #[must_use]
    pub const fn count(self) -> usize {
        self.count
    }

    /// Checks if this is the first chunk.
    #[must_use]
    pub const fn is_first(self) -> bool {
        self.index == 1
    }

    /// Checks if this is the final chunk.
    #[must_use]
    pub const fn is_last(self) -> bool {
        self.index == self.count
    }

    /// Returns the payload type for this position.
    #[must_use]
    pub const fn payload_type(self) -> PayloadType {
        PayloadType::for_chunk(self)
    }
}

/// Splits a signing payload into device chunks.
///
/// The first chunk is `path`; `message` follows in pieces of at most
/// `chunk_size` bytes. An empty message yields the path chunk alone.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `chunk_size` is zero.
///
/// # Example
///
/// ```
/// use ledger_stacks_signer_core::ledger::prepare_chunks;
///
/// let chunks = prepare_chunks(&[0u8; 20], &[1u8; 600], 250).unwrap();
/// let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
/// assert_eq!(sizes, vec![20, 250, 250, 100]);
/// ```
pub fn prepare_chunks(path: &[u8], message: &[u8], chunk_size: usize) -> Result<Vec<Vec<u8>>> {
    if chunk_size == 0 {
        return Err(Error::InvalidConfig("chunk size must be non-zero".to_string()));
    }

    let mut chunks = Vec::with_capacity(1 + message.len().div_ceil(chunk_size));
    chunks.push(path.to_vec());
    chunks.extend(message.chunks(chunk_size).map(<[u8]>::to_vec));
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(index: usize, count: usize) -> PayloadType {
        ChunkDescriptor::new(index, count).unwrap().payload_type()
    }

    #[test]
    fn three_chunk_framing() {
        assert_eq!(kind(1, 3), PayloadType::Init);
        assert_eq!(kind(2, 3), PayloadType::Add);
        assert_eq!(kind(3, 3), PayloadType::Last);
    }

    #[test]
    fn single_chunk_is_last() {
        assert_eq!(kind(1, 1), PayloadType::Last);
    }

    #[test]
    fn two_chunk_framing() {
        assert_eq!(kind(1, 2), PayloadType::Init);
        assert_eq!(kind(2, 2), PayloadType::Last);
    }

    #[test]
    fn p1_values() {
        assert_eq!(PayloadType::Init.p1(), 0x00);
        assert_eq!(PayloadType::Add.p1(), 0x01);
        assert_eq!(PayloadType::Last.p1(), 0x02);
    }

    #[test]
    fn descriptor_rejects_zero_index() {
        assert!(matches!(
            ChunkDescriptor::new(0, 3),
            Err(Error::InvalidChunk { index: 0, count: 3 })
        ));
    }

    #[test]
    fn descriptor_rejects_index_past_count() {
        assert!(matches!(
            ChunkDescriptor::new(4, 3),
            Err(Error::InvalidChunk { index: 4, count: 3 })
        ));
        assert!(ChunkDescriptor::new(1, 0).is_err());
    }

    #[test]
    fn descriptor_positions() {
        let chunk = ChunkDescriptor::new(2, 3).unwrap();
        assert!(!chunk.is_first());
        assert!(!chunk.is_last());
        assert_eq!(chunk.index(), 2);
        assert_eq!(chunk.count(), 3);
    }

    #[test]
    fn prepare_empty_message() {
        let chunks = prepare_chunks(&[7u8; 20], &[], 250).unwrap();
        assert_eq!(chunks, vec![vec![7u8; 20]]);
    }

    #[test]
    fn prepare_exact_multiple() {
        let chunks = prepare_chunks(&[0u8; 20], &[1u8; 500], 250).unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks[1..].iter().all(|c| c.len() == 250));
    }

    #[test]
    fn prepare_preserves_order() {
        let message: Vec<u8> = (0..=9).collect();
        let chunks = prepare_chunks(&[0xAA], &message, 4).unwrap();
        assert_eq!(
            chunks,
            vec![vec![0xAA], vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]
        );
    }

    #[test]
    fn deserialize_validates_position() {
        let chunk: ChunkDescriptor = serde_json::from_str(r#"{"index":2,"count":3}"#).unwrap();
        assert_eq!(chunk.payload_type(), PayloadType::Add);

        for json in [
            r#"{"index":0,"count":0}"#,
            r#"{"index":0,"count":3}"#,
            r#"{"index":4,"count":3}"#,
        ] {
            let err = serde_json::from_str::<ChunkDescriptor>(json).unwrap_err();
            assert!(err.to_string().contains("invalid chunk"), "{json}: {err}");
        }
    }

    #[test]
    fn prepare_rejects_zero_chunk_size() {
        assert!(matches!(
            prepare_chunks(&[], &[1], 0),
            Err(Error::InvalidConfig(_))
        ));
    }
}
