//! Inbound frame layout.
//!
//! A frame is a header followed by `num_primary_packets` fixed-size
//! primary packets:
//!
//! ```text
//! 0..8    frame number
//! 8       idle flag (non-zero = idle)
//! 16..    one validity byte per primary packet (0 = dropped),
//!         padded to an 8-byte boundary
//! ```

use crate::cursor::{ByteOrder, WordCursor, WORD_SIZE};
use crate::packet::PacketHeader;
use crate::{DetectorConfig, Result};

/// Byte offset of the frame number.
pub const FRAME_NUMBER_OFFSET: usize = 0;
/// Byte offset of the idle flag.
pub const IDLE_FLAG_OFFSET: usize = 8;
/// Byte offset of the packet validity bytes.
pub const PACKET_STATE_OFFSET: usize = 16;

/// Read-only view over one inbound frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    data: &'a [u8],
    config: &'a DetectorConfig,
}

impl<'a> FrameView<'a> {
    /// Validates `data` against the configured geometry.
    ///
    /// Idle frames only need a complete header; standard frames must hold
    /// every primary packet.
    ///
    /// # Errors
    /// Returns an invalid-frame error if `data` is too short.
    pub fn parse(data: &'a [u8], config: &'a DetectorConfig) -> Result<Self> {
        let header_size = config.frame_header_size();
        if data.len() < header_size {
            return Err(latrd_core::Error::InvalidFrame {
                expected: header_size,
                actual: data.len(),
            }
            .into());
        }

        let view = Self { data, config };
        if !view.is_idle() && data.len() < config.frame_size() {
            return Err(latrd_core::Error::InvalidFrame {
                expected: config.frame_size(),
                actual: data.len(),
            }
            .into());
        }
        Ok(view)
    }

    /// Frame number written by the readout.
    #[must_use]
    pub fn frame_number(&self) -> u64 {
        let mut bytes = [0u8; WORD_SIZE];
        bytes.copy_from_slice(&self.data[FRAME_NUMBER_OFFSET..FRAME_NUMBER_OFFSET + WORD_SIZE]);
        self.config.byte_order.read_u64(bytes)
    }

    /// Returns true for an idle (end of acquisition) frame.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.data[IDLE_FLAG_OFFSET] != 0
    }

    /// Number of primary packet slots.
    #[must_use]
    pub fn packet_slots(&self) -> usize {
        self.config.num_primary_packets
    }

    /// Returns true if the slot at `index` holds a valid packet.
    #[must_use]
    pub fn packet_valid(&self, index: usize) -> bool {
        index < self.config.num_primary_packets
            && self.data[PACKET_STATE_OFFSET + index] != 0
    }

    /// Number of valid packet slots.
    #[must_use]
    pub fn valid_packet_count(&self) -> usize {
        (0..self.packet_slots())
            .filter(|&index| self.packet_valid(index))
            .count()
    }

    /// Packet at `index`, or `None` if the slot is dropped or out of range.
    #[must_use]
    pub fn packet(&self, index: usize) -> Option<PacketView<'a>> {
        if self.is_idle() || !self.packet_valid(index) {
            return None;
        }
        let size = self.config.primary_packet_size;
        let start = self.config.frame_header_size() + index * size;
        Some(PacketView {
            data: &self.data[start..start + size],
            order: self.config.byte_order,
            header_words: self.config.packet_header_words,
        })
    }
}

/// Read-only view over one primary packet.
#[derive(Debug, Clone, Copy)]
pub struct PacketView<'a> {
    data: &'a [u8],
    order: ByteOrder,
    header_words: usize,
}

impl PacketView<'_> {
    /// Decodes header words 1 and 2.
    ///
    /// # Errors
    /// Returns an error if the packet is shorter than three words.
    pub fn header(&self) -> Result<PacketHeader> {
        let mut cursor = WordCursor::new(self.data, self.order);
        cursor.skip_words(1)?;
        let word1 = cursor.read_u64()?;
        let word2 = cursor.read_u64()?;
        Ok(PacketHeader::decode(word1, word2))
    }

    /// Number of payload words the packet can hold.
    #[must_use]
    pub fn payload_capacity(&self) -> usize {
        (self.data.len() / WORD_SIZE).saturating_sub(self.header_words)
    }

    /// Appends the first `count` payload words to `out`.
    ///
    /// # Errors
    /// Returns an error if `count` exceeds the payload capacity.
    pub fn read_payload(&self, count: usize, out: &mut Vec<u64>) -> Result<()> {
        let mut cursor = WordCursor::new(self.data, self.order);
        cursor.skip_words(self.header_words)?;
        cursor.read_into(count, out)
    }
}

/// Encoder for synthetic inbound frames.
///
/// Used to replay simulated acquisitions and in tests.
#[derive(Debug, Clone)]
pub struct FrameBuilder<'c> {
    config: &'c DetectorConfig,
    frame_number: u64,
    idle: bool,
    packets: Vec<Option<(PacketHeader, Vec<u64>)>>,
}

impl<'c> FrameBuilder<'c> {
    /// Starts a standard frame with every packet slot dropped.
    #[must_use]
    pub fn new(config: &'c DetectorConfig) -> Self {
        Self {
            config,
            frame_number: 0,
            idle: false,
            packets: vec![None; config.num_primary_packets],
        }
    }

    /// Starts an idle frame.
    #[must_use]
    pub fn idle(config: &'c DetectorConfig) -> Self {
        Self {
            idle: true,
            ..Self::new(config)
        }
    }

    /// Sets the frame number.
    #[must_use]
    pub fn frame_number(mut self, frame_number: u64) -> Self {
        self.frame_number = frame_number;
        self
    }

    /// Fills slot `index` with a valid packet.
    ///
    /// The header's word count is derived from `payload`. Out of range
    /// slots are reported by [`FrameBuilder::build`].
    #[must_use]
    pub fn packet(mut self, index: usize, header: PacketHeader, payload: &[u64]) -> Self {
        if index >= self.packets.len() {
            self.packets.resize(index + 1, None);
        }
        self.packets[index] = Some((header, payload.to_vec()));
        self
    }

    /// Serialises the frame.
    ///
    /// # Errors
    /// Returns a configuration error if a slot index or payload does not fit
    /// the configured geometry.
    pub fn build(&self) -> Result<Vec<u8>> {
        let config = self.config;
        let order = config.byte_order;
        if self.packets.len() > config.num_primary_packets {
            return Err(latrd_core::Error::ConfigError(format!(
                "packet slot {} beyond {} primary packets",
                self.packets.len() - 1,
                config.num_primary_packets
            ))
            .into());
        }

        let mut frame = vec![0u8; config.frame_size()];
        frame[FRAME_NUMBER_OFFSET..FRAME_NUMBER_OFFSET + WORD_SIZE]
            .copy_from_slice(&order.write_u64(self.frame_number));
        if self.idle {
            frame[IDLE_FLAG_OFFSET] = 1;
            return Ok(frame);
        }

        let capacity = config.payload_words();
        for (index, packet) in self.packets.iter().enumerate() {
            let Some((header, payload)) = packet else {
                continue;
            };
            if payload.len() > capacity {
                return Err(latrd_core::Error::ConfigError(format!(
                    "packet {index} payload of {} words exceeds capacity {capacity}",
                    payload.len()
                ))
                .into());
            }
            let word_count = payload.len() + config.packet_header_words - 1;
            let header = PacketHeader {
                word_count: u16::try_from(word_count).map_err(|_| {
                    latrd_core::Error::ConfigError(format!(
                        "packet {index} word count {word_count} exceeds 16 bits"
                    ))
                })?,
                ..*header
            };

            frame[PACKET_STATE_OFFSET + index] = 1;
            let start = config.frame_header_size() + index * config.primary_packet_size;
            let (word1, word2) = header.encode();
            let words = [word1, word2];
            let header_start = start + WORD_SIZE;
            for (offset, word) in words.iter().enumerate() {
                let at = header_start + offset * WORD_SIZE;
                frame[at..at + WORD_SIZE].copy_from_slice(&order.write_u64(*word));
            }
            let payload_start = start + config.packet_header_words * WORD_SIZE;
            for (offset, word) in payload.iter().enumerate() {
                let at = payload_start + offset * WORD_SIZE;
                frame[at..at + WORD_SIZE].copy_from_slice(&order.write_u64(*word));
            }
        }
        Ok(frame)
    }
}
