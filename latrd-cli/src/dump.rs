//! Raw frame dumps: inbound frames stored back to back at the configured
//! frame size.

use crate::{CliError, Result};
use latrd_decode::timing::{COARSE_TIMESTAMP_ROLLOVER, TIMESTAMP_HIGH_MASK};
use latrd_decode::frame::IDLE_FLAG_OFFSET;
use latrd_decode::{DataWord, DetectorConfig, FrameBuilder, PacketHeader};
use memmap2::Mmap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A memory-mapped frame dump.
pub struct FrameDump {
    mmap: Mmap,
    frame_size: usize,
}

impl FrameDump {
    /// Maps `path` and checks it holds whole frames.
    pub fn open<P: AsRef<Path>>(path: P, config: &DetectorConfig) -> Result<Self> {
        let file = File::open(path)?;
        let size = usize::try_from(file.metadata()?.len()).unwrap_or(usize::MAX);
        let frame_size = config.frame_size();
        if size == 0 || !size.is_multiple_of(frame_size) {
            return Err(CliError::TruncatedDump { size, frame_size });
        }

        // SAFETY: the mapping is read-only and the dump is not modified while mapped.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap, frame_size })
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.mmap.len()
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn frame_count(&self) -> usize {
        self.mmap.len() / self.frame_size
    }

    /// Iterates over the raw frames in file order.
    pub fn frames(&self) -> std::slice::ChunksExact<'_, u8> {
        self.mmap.chunks_exact(self.frame_size)
    }

    /// Returns true if the last frame carries the idle flag.
    pub fn ends_idle(&self) -> bool {
        self.frames()
            .next_back()
            .and_then(|frame| frame.get(IDLE_FLAG_OFFSET))
            .is_some_and(|&flag| flag != 0)
    }
}

/// Shape of a simulated acquisition.
#[derive(Debug, Clone, Copy)]
pub struct Simulation {
    /// Standard frames before the closing idle frame.
    pub frames: usize,
    /// Events in every packet.
    pub events_per_packet: usize,
    /// Trailing packet slots marked dropped in every frame.
    pub dropped_slots: usize,
}

// Match code 0, so each frame's events fall in one period.
const SIMULATION_COARSE_BASE: u64 = 0x0000_0001_0000_0000;

impl Simulation {
    /// Writes the acquisition to `writer` and returns the number of events written.
    ///
    /// Frame `f` carries time slice `f`: every packet in it belongs to wrap
    /// `f / buffers` and buffer `f % buffers`, and starts with a coarse
    /// timestamp one match-code period after the previous frame's.
    pub fn write<W: Write>(&self, config: &DetectorConfig, writer: &mut W) -> Result<u64> {
        let max_events = config.payload_words() - 1;
        if self.events_per_packet > max_events {
            return Err(latrd_core::Error::ConfigError(format!(
                "{} events per packet exceeds packet capacity {max_events}",
                self.events_per_packet
            ))
            .into());
        }
        let packets = config.num_primary_packets.saturating_sub(self.dropped_slots);
        let buffers = config.number_of_time_slice_buffers;
        let mut events = 0u64;

        for index in 0..self.frames {
            let coarse = SIMULATION_COARSE_BASE + index as u64 * COARSE_TIMESTAMP_ROLLOVER;
            let mut builder = FrameBuilder::new(config).frame_number(index as u64);
            for slot in 0..packets {
                let header = PacketHeader {
                    packet_number: u32::try_from(index * config.num_primary_packets + slot)
                        .unwrap_or(u32::MAX),
                    time_slice_wrap: u32::try_from(index / buffers).unwrap_or(u32::MAX),
                    time_slice_buffer: (index % buffers) as u32,
                    ..PacketHeader::default()
                };
                let payload = self.packet_payload(coarse, slot);
                builder = builder.packet(slot, header, &payload);
                events += self.events_per_packet as u64;
            }
            writer.write_all(&builder.build()?)?;
        }

        writer.write_all(&FrameBuilder::idle(config).frame_number(self.frames as u64).build()?)?;
        writer.flush()?;
        Ok(events)
    }

    fn packet_payload(&self, coarse: u64, slot: usize) -> Vec<u64> {
        let mut words = Vec::with_capacity(self.events_per_packet + 1);
        words.push(DataWord::extended_timestamp(coarse).raw());
        for k in 0..self.events_per_packet {
            // Offsets stay inside one period so every event matches `coarse`.
            let offset =
                ((slot * self.events_per_packet + k) * 8) as u64 % COARSE_TIMESTAMP_ROLLOVER;
            let fine = (coarse & !TIMESTAMP_HIGH_MASK) + offset;
            let id = (slot * 1000 + k) as u32;
            words.push(DataWord::event(id, fine, (k % 0x3FFF) as u16).raw());
        }
        words
    }
}
