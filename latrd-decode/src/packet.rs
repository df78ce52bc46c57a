//! Primary packet header decoding.
//!
//! Word 0 of each primary packet belongs to the transport. Words 1 and 2
//! carry the packet header:
//!
//! ```text
//! word 1: packet number (32..64) | - | word count (0..16)
//! word 2: - | time slice buffer (32..40) | time slice wrap (0..32)
//! ```
//!
//! The word count includes header words 1 and 2, so the payload holds
//! `word_count - (header_words - 1)` data words.

/// Fields decoded from the two packet header words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketHeader {
    /// Words in the packet, counted from header word 1.
    pub word_count: u16,
    /// Packet sequence number.
    pub packet_number: u32,
    /// Time-slice wrap generation ("wrap modulo").
    pub time_slice_wrap: u32,
    /// Time-slice buffer index within the wrap.
    pub time_slice_buffer: u32,
}

impl PacketHeader {
    const WORD_COUNT_MASK: u64 = 0xFFFF;
    const PACKET_NUMBER_SHIFT: u32 = 32;
    const WRAP_MASK: u64 = 0xFFFF_FFFF;
    const BUFFER_SHIFT: u32 = 32;
    const BUFFER_MASK: u64 = 0xFF;

    /// Largest time-slice buffer index the header can carry.
    pub const MAX_TIME_SLICE_BUFFERS: usize = 256;

    /// Decodes the two header words.
    #[must_use]
    pub fn decode(word1: u64, word2: u64) -> Self {
        Self {
            word_count: (word1 & Self::WORD_COUNT_MASK) as u16,
            packet_number: (word1 >> Self::PACKET_NUMBER_SHIFT) as u32,
            time_slice_wrap: (word2 & Self::WRAP_MASK) as u32,
            time_slice_buffer: ((word2 >> Self::BUFFER_SHIFT) & Self::BUFFER_MASK) as u32,
        }
    }

    /// Encodes the header back into its two words.
    #[must_use]
    pub fn encode(&self) -> (u64, u64) {
        let word1 = (u64::from(self.packet_number) << Self::PACKET_NUMBER_SHIFT)
            | u64::from(self.word_count);
        let word2 = ((u64::from(self.time_slice_buffer) & Self::BUFFER_MASK)
            << Self::BUFFER_SHIFT)
            | u64::from(self.time_slice_wrap);
        (word1, word2)
    }

    /// Time-slice id combining wrap and buffer.
    #[must_use]
    pub fn time_slice_id(&self) -> u64 {
        (u64::from(self.time_slice_wrap) << 8) | u64::from(self.time_slice_buffer)
    }

    /// Number of payload words to decode, given the packet's header size in words.
    #[must_use]
    pub fn words_to_process(&self, header_words: usize) -> usize {
        usize::from(self.word_count).saturating_sub(header_words.saturating_sub(1))
    }
}
