//! Counters tallied by the coordinator.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::job::Job;

/// Snapshot of what the coordinator has seen since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProcessStatistics {
    /// Frames passed to `process_frame`, idle frames included.
    pub frames_processed: u64,
    /// Idle (end of acquisition) frames.
    pub idle_frames: u64,
    /// Jobs handed to the worker pool.
    pub packets_submitted: u64,
    /// Packet slots marked invalid in a frame header.
    pub dropped_packets: u64,
    /// Jobs discarded for being more than one wrap generation behind.
    pub stale_packets: u64,
    /// Jobs discarded for an unreadable header or out of range buffer index.
    pub invalid_packets: u64,
    /// Events decoded by the workers.
    pub events_decoded: u64,
    /// Non timestamp control words recorded.
    pub control_words: u64,
    /// Events dropped on timestamp mismatch.
    pub timestamp_mismatches: u64,
    /// Jobs whose first word was not an extended timestamp.
    pub malformed_jobs: u64,
    /// Output frames returned to the caller.
    pub output_frames: u64,
    /// Jobs allocated by the pool, i.e. its high-water mark.
    pub pool_allocated: u64,
}

impl ProcessStatistics {
    pub(crate) fn record_job(&mut self, job: &Job) {
        self.events_decoded += job.valid_results() as u64;
        self.control_words += job.valid_control_words() as u64;
        self.timestamp_mismatches += u64::from(job.timestamp_mismatches);
        self.malformed_jobs += u64::from(job.malformed_start);
    }
}
