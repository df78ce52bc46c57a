//! Unit of decode work: one primary packet.

use latrd_core::EventBatch;
use latrd_decode::PacketHeader;

/// One primary packet's worth of work, plus the decoder's output.
///
/// Jobs are recycled through the [`JobPool`](crate::JobPool), so the word
/// and result buffers keep their allocations between packets.
#[derive(Debug, Clone, Default)]
pub struct Job {
    /// Packet slot within the source frame.
    pub slot: usize,
    /// Packet sequence number.
    pub packet_number: u32,
    /// Time-slice id (`wrap << 8 | buffer`).
    pub time_slice: u64,
    /// Wrap generation the packet belongs to.
    pub time_slice_wrap: u32,
    /// Buffer index within the wrap generation.
    pub time_slice_buffer: u32,
    /// Raw payload words to decode.
    pub words: Vec<u64>,
    /// Decoded events.
    pub events: EventBatch,
    /// Control words other than extended timestamps.
    pub control_words: Vec<u64>,
    /// Event count at the point each control word was seen.
    pub control_indices: Vec<u32>,
    /// Events dropped because their fine timestamp matched neither coarse value.
    pub timestamp_mismatches: u32,
    /// True if the first payload word was not an extended timestamp.
    pub malformed_start: bool,
}

impl Job {
    /// Creates an empty job sized for `payload_words` words.
    #[must_use]
    pub fn with_capacity(payload_words: usize) -> Self {
        Self {
            words: Vec::with_capacity(payload_words),
            events: EventBatch::with_capacity(payload_words),
            ..Self::default()
        }
    }

    /// Copies the packet identity from `header`.
    pub fn assign(&mut self, slot: usize, header: &PacketHeader) {
        self.slot = slot;
        self.packet_number = header.packet_number;
        self.time_slice = header.time_slice_id();
        self.time_slice_wrap = header.time_slice_wrap;
        self.time_slice_buffer = header.time_slice_buffer;
    }

    /// Clears decode results, leaving the input words in place.
    pub fn clear_results(&mut self) {
        self.events.clear();
        self.control_words.clear();
        self.control_indices.clear();
        self.timestamp_mismatches = 0;
        self.malformed_start = false;
    }

    /// Clears everything ahead of reuse.
    pub fn reset(&mut self) {
        self.clear_results();
        self.words.clear();
        self.slot = 0;
        self.packet_number = 0;
        self.time_slice = 0;
        self.time_slice_wrap = 0;
        self.time_slice_buffer = 0;
    }

    /// Number of payload words to decode.
    #[must_use]
    pub fn words_to_process(&self) -> usize {
        self.words.len()
    }

    /// Number of decoded events.
    #[must_use]
    pub fn valid_results(&self) -> usize {
        self.events.len()
    }

    /// Number of recorded control words.
    #[must_use]
    pub fn valid_control_words(&self) -> usize {
        self.control_words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_and_reset() {
        let header = PacketHeader {
            word_count: 4,
            packet_number: 11,
            time_slice_wrap: 3,
            time_slice_buffer: 2,
        };
        let mut job = Job::with_capacity(8);
        job.assign(5, &header);
        job.words.extend_from_slice(&[1, 2, 3]);
        job.events.push(100, 1, 2);
        job.timestamp_mismatches = 4;

        assert_eq!(job.slot, 5);
        assert_eq!(job.time_slice, (3 << 8) | 2);
        assert_eq!(job.words_to_process(), 3);
        assert_eq!(job.valid_results(), 1);

        job.reset();
        assert_eq!(job.words_to_process(), 0);
        assert_eq!(job.valid_results(), 0);
        assert_eq!(job.timestamp_mismatches, 0);
        assert_eq!(job.time_slice, 0);
        assert!(job.words.capacity() >= 8);
    }
}
