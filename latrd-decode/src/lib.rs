//! latrd-decode: LATRD data word decoder and frame layout.
//!
//! This crate provides the bit-exact decoding used by the reconstruction
//! pipeline.
//!
//! # Key Components
//!
//! - [`DataWord`] - Payload word classification and bit field accessors
//! - [`CoarseTimestamps`] - Coarse/fine timestamp disambiguation
//! - [`PacketHeader`] - Primary packet header fields
//! - [`FrameView`] / [`FrameBuilder`] - Inbound frame parsing and encoding
//! - [`DetectorConfig`] - Frame geometry and pipeline sizing

mod error;
pub mod cursor;
pub mod frame;
mod packet;
pub mod timing;
mod word;

pub use cursor::{ByteOrder, WordCursor};
pub use error::{Error, Result};
pub use frame::{FrameBuilder, FrameView, PacketView};
pub use packet::PacketHeader;
pub use timing::{full_timestamp, match_code, CoarseTimestamps};
pub use word::{ControlType, DataWord, WordClass, WordKind};

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Detector frame geometry and pipeline sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Primary packet slots per inbound frame.
    pub num_primary_packets: usize,
    /// Size of one primary packet in bytes.
    pub primary_packet_size: usize,
    /// Words at the start of each packet before the payload.
    pub packet_header_words: usize,
    /// Time-slice buffers per wrap generation.
    pub number_of_time_slice_buffers: usize,
    /// Events per output frame.
    pub output_frame_capacity: usize,
    /// Decode worker threads.
    pub processing_threads: usize,
    /// Byte order of inbound words.
    pub byte_order: ByteOrder,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            num_primary_packets: 16,
            primary_packet_size: 8000,
            packet_header_words: 3,
            number_of_time_slice_buffers: 4,
            output_frame_capacity: 524_288,
            processing_threads: 8,
            byte_order: ByteOrder::Little,
        }
    }
}

// Intermediate structs for the JSON schema
#[derive(Deserialize)]
struct JsonConfig {
    detector: JsonDetector,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonDetector {
    frame: JsonFrame,
    timeslice: JsonTimeSlice,
    processing: JsonProcessing,
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonFrame {
    num_primary_packets: usize,
    primary_packet_size: usize,
    packet_header_words: usize,
    byte_order: ByteOrder,
}

impl Default for JsonFrame {
    fn default() -> Self {
        let defaults = DetectorConfig::default();
        Self {
            num_primary_packets: defaults.num_primary_packets,
            primary_packet_size: defaults.primary_packet_size,
            packet_header_words: defaults.packet_header_words,
            byte_order: defaults.byte_order,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonTimeSlice {
    buffers: usize,
}

impl Default for JsonTimeSlice {
    fn default() -> Self {
        Self {
            buffers: DetectorConfig::default().number_of_time_slice_buffers,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonProcessing {
    threads: usize,
    output_frame_capacity: usize,
}

impl Default for JsonProcessing {
    fn default() -> Self {
        let defaults = DetectorConfig::default();
        Self {
            threads: defaults.processing_threads,
            output_frame_capacity: defaults.output_frame_capacity,
        }
    }
}

impl DetectorConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let json_config: JsonConfig = serde_json::from_reader(reader)?;
        Self::from_json_config(json_config)
    }

    /// Load configuration from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed or fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let json_config: JsonConfig = serde_json::from_str(json)?;
        Self::from_json_config(json_config)
    }

    fn from_json_config(config: JsonConfig) -> Result<Self> {
        let detector = config.detector;
        let config = Self {
            num_primary_packets: detector.frame.num_primary_packets,
            primary_packet_size: detector.frame.primary_packet_size,
            packet_header_words: detector.frame.packet_header_words,
            number_of_time_slice_buffers: detector.timeslice.buffers,
            output_frame_capacity: detector.processing.output_frame_capacity,
            processing_threads: detector.processing.threads,
            byte_order: detector.frame.byte_order,
        };

        config.validate()?;
        Ok(config)
    }

    /// Sets the number of primary packet slots.
    #[must_use]
    pub fn with_num_primary_packets(mut self, packets: usize) -> Self {
        self.num_primary_packets = packets;
        self
    }

    /// Sets the primary packet size in bytes.
    #[must_use]
    pub fn with_primary_packet_size(mut self, bytes: usize) -> Self {
        self.primary_packet_size = bytes;
        self
    }

    /// Sets the number of time-slice buffers per wrap.
    #[must_use]
    pub fn with_time_slice_buffers(mut self, buffers: usize) -> Self {
        self.number_of_time_slice_buffers = buffers;
        self
    }

    /// Sets the output frame capacity in events.
    #[must_use]
    pub fn with_output_frame_capacity(mut self, events: usize) -> Self {
        self.output_frame_capacity = events;
        self
    }

    /// Sets the number of decode threads.
    #[must_use]
    pub fn with_processing_threads(mut self, threads: usize) -> Self {
        self.processing_threads = threads;
        self
    }

    /// Sets the inbound byte order.
    #[must_use]
    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Check the geometry and sizing are usable.
    ///
    /// Called when loading from JSON. For programmatically created configs
    /// the coordinator calls this before spawning workers.
    ///
    /// # Errors
    /// Returns a configuration error describing the first invalid field.
    pub fn validate(&self) -> latrd_core::Result<()> {
        let fail = |msg: String| Err(latrd_core::Error::ConfigError(msg));

        if self.num_primary_packets == 0 {
            return fail("num_primary_packets must be greater than 0".into());
        }
        if self.packet_header_words < 3 {
            return fail(format!(
                "packet_header_words must be at least 3, got {}",
                self.packet_header_words
            ));
        }
        if !self.primary_packet_size.is_multiple_of(cursor::WORD_SIZE) {
            return fail(format!(
                "primary_packet_size {} is not a multiple of 8",
                self.primary_packet_size
            ));
        }
        if self.primary_packet_size <= self.packet_header_words * cursor::WORD_SIZE {
            return fail(format!(
                "primary_packet_size {} leaves no room for payload after {} header words",
                self.primary_packet_size, self.packet_header_words
            ));
        }
        if self.number_of_time_slice_buffers == 0
            || self.number_of_time_slice_buffers > PacketHeader::MAX_TIME_SLICE_BUFFERS
        {
            return fail(format!(
                "number_of_time_slice_buffers must be in 1..={}, got {}",
                PacketHeader::MAX_TIME_SLICE_BUFFERS,
                self.number_of_time_slice_buffers
            ));
        }
        if self.output_frame_capacity == 0 {
            return fail("output_frame_capacity must be greater than 0".into());
        }
        if self.processing_threads == 0 {
            return fail("processing_threads must be greater than 0".into());
        }
        Ok(())
    }

    /// Words in one primary packet.
    #[must_use]
    pub fn words_per_packet(&self) -> usize {
        self.primary_packet_size / cursor::WORD_SIZE
    }

    /// Payload words one primary packet can hold.
    #[must_use]
    pub fn payload_words(&self) -> usize {
        self.words_per_packet().saturating_sub(self.packet_header_words)
    }

    /// Size of the inbound frame header in bytes.
    #[must_use]
    pub fn frame_header_size(&self) -> usize {
        frame::PACKET_STATE_OFFSET + self.num_primary_packets.next_multiple_of(cursor::WORD_SIZE)
    }

    /// Size of a complete standard frame in bytes.
    #[must_use]
    pub fn frame_size(&self) -> usize {
        self.frame_header_size() + self.num_primary_packets * self.primary_packet_size
    }
}
