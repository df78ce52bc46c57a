//! Bounds-checked 64-bit word reads over raw frame bytes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Size of one data word in bytes.
pub const WORD_SIZE: usize = 8;

/// Byte order of the words in an inbound frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Little-endian words (the readout's native order).
    #[default]
    Little,
    /// Big-endian words.
    Big,
}

impl ByteOrder {
    /// Decodes one word.
    #[inline]
    #[must_use]
    pub fn read_u64(self, bytes: [u8; WORD_SIZE]) -> u64 {
        match self {
            ByteOrder::Little => u64::from_le_bytes(bytes),
            ByteOrder::Big => u64::from_be_bytes(bytes),
        }
    }

    /// Encodes one word.
    #[inline]
    #[must_use]
    pub fn write_u64(self, value: u64) -> [u8; WORD_SIZE] {
        match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        }
    }
}

/// Sequential word reader over a byte slice.
#[derive(Debug, Clone)]
pub struct WordCursor<'a> {
    data: &'a [u8],
    offset: usize,
    order: ByteOrder,
}

impl<'a> WordCursor<'a> {
    /// Creates a cursor at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            offset: 0,
            order,
        }
    }

    /// Current byte offset.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of whole words left.
    #[must_use]
    pub fn remaining_words(&self) -> usize {
        (self.data.len() - self.offset) / WORD_SIZE
    }

    /// Reads the next word.
    ///
    /// # Errors
    /// Returns [`Error::UnexpectedEnd`] if fewer than 8 bytes remain.
    pub fn read_u64(&mut self) -> Result<u64> {
        let end = self.offset + WORD_SIZE;
        let Some(chunk) = self.data.get(self.offset..end) else {
            return Err(Error::UnexpectedEnd {
                offset: self.offset,
                len: self.data.len(),
            });
        };
        let mut bytes = [0u8; WORD_SIZE];
        bytes.copy_from_slice(chunk);
        self.offset = end;
        Ok(self.order.read_u64(bytes))
    }

    /// Skips `count` words.
    ///
    /// # Errors
    /// Returns [`Error::UnexpectedEnd`] if fewer than `count` words remain.
    pub fn skip_words(&mut self, count: usize) -> Result<()> {
        if count > self.remaining_words() {
            return Err(Error::UnexpectedEnd {
                offset: self.offset + count * WORD_SIZE,
                len: self.data.len(),
            });
        }
        self.offset += count * WORD_SIZE;
        Ok(())
    }

    /// Appends the next `count` words to `out`.
    ///
    /// Nothing is appended if fewer than `count` words remain.
    ///
    /// # Errors
    /// Returns [`Error::UnexpectedEnd`] if fewer than `count` words remain.
    pub fn read_into(&mut self, count: usize, out: &mut Vec<u64>) -> Result<()> {
        let end = self.offset + count * WORD_SIZE;
        let Some(bytes) = self.data.get(self.offset..end) else {
            return Err(Error::UnexpectedEnd {
                offset: end,
                len: self.data.len(),
            });
        };
        out.extend(bytes.chunks_exact(WORD_SIZE).map(|chunk| {
            let mut word = [0u8; WORD_SIZE];
            word.copy_from_slice(chunk);
            self.order.read_u64(word)
        }));
        self.offset = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_little_and_big_endian() {
        let bytes = [1u8, 0, 0, 0, 0, 0, 0, 0x80];

        let mut le = WordCursor::new(&bytes, ByteOrder::Little);
        assert_eq!(le.read_u64().unwrap(), 0x8000_0000_0000_0001);

        let mut be = WordCursor::new(&bytes, ByteOrder::Big);
        assert_eq!(be.read_u64().unwrap(), 0x0100_0000_0000_0080);
    }

    #[test]
    fn test_read_past_end() {
        let bytes = [0u8; 12];
        let mut cursor = WordCursor::new(&bytes, ByteOrder::Little);
        assert_eq!(cursor.remaining_words(), 1);
        assert!(cursor.read_u64().is_ok());
        assert!(matches!(
            cursor.read_u64(),
            Err(Error::UnexpectedEnd { offset: 8, len: 12 })
        ));
        assert_eq!(cursor.offset(), 8);
    }

    #[test]
    fn test_read_into_and_skip() {
        let mut bytes = Vec::new();
        for word in [10u64, 20, 30, 40] {
            bytes.extend_from_slice(&ByteOrder::Big.write_u64(word));
        }

        let mut cursor = WordCursor::new(&bytes, ByteOrder::Big);
        cursor.skip_words(1).unwrap();
        let mut out = Vec::new();
        cursor.read_into(2, &mut out).unwrap();
        assert_eq!(out, vec![20, 30]);
        assert!(cursor.read_into(2, &mut out).is_err());
        assert_eq!(out.len(), 2);
        assert!(cursor.skip_words(2).is_err());
    }
}
