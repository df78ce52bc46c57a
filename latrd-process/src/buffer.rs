//! Fixed-capacity channel accumulators.
//!
//! Each output channel collects values until an output frame is full, then
//! emits it with the next frame number owned by this process. With `N`
//! processes, rank `r` numbers its frames `r, r + N, r + 2N, ...`.

use latrd_core::{Channel, ChannelData, OutputFrame};
use std::mem;

/// Element type a [`ChannelBuffer`] can hold.
pub trait ChannelElement: Copy + Send + 'static {
    /// Wraps a column of values as frame payload.
    fn into_channel_data(values: Vec<Self>) -> ChannelData;
}

impl ChannelElement for u64 {
    fn into_channel_data(values: Vec<Self>) -> ChannelData {
        ChannelData::U64(values)
    }
}

impl ChannelElement for u32 {
    fn into_channel_data(values: Vec<Self>) -> ChannelData {
        ChannelData::U32(values)
    }
}

/// Accumulates one channel's values into fixed-capacity output frames.
#[derive(Debug)]
pub struct ChannelBuffer<T: ChannelElement> {
    channel: Channel,
    capacity: usize,
    values: Vec<T>,
    frame_number: u64,
    processes: u64,
    rank: u64,
}

impl<T: ChannelElement> ChannelBuffer<T> {
    /// Creates a buffer emitting frames of `capacity` values.
    ///
    /// Starts as the only process (rank 0 of 1).
    #[must_use]
    pub fn new(channel: Channel, capacity: usize) -> Self {
        Self {
            channel,
            capacity: capacity.max(1),
            values: Vec::with_capacity(capacity),
            frame_number: 0,
            processes: 1,
            rank: 0,
        }
    }

    /// Sets the process count and rank, restarting numbering at `rank`.
    ///
    /// Callers validate `rank < processes`.
    pub fn configure_process(&mut self, processes: u64, rank: u64) {
        self.processes = processes;
        self.rank = rank;
        self.frame_number = rank;
    }

    /// Appends `values`, returning every output frame that filled up.
    pub fn append(&mut self, mut values: &[T]) -> Vec<OutputFrame> {
        let mut frames = Vec::new();
        while !values.is_empty() {
            let take = (self.capacity - self.values.len()).min(values.len());
            let (head, tail) = values.split_at(take);
            self.values.extend_from_slice(head);
            values = tail;
            if self.values.len() == self.capacity {
                frames.push(self.emit());
            }
        }
        frames
    }

    /// Emits the partially filled frame, if any values are pending.
    pub fn retrieve_current_frame(&mut self) -> Option<OutputFrame> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.emit())
        }
    }

    /// Restarts frame numbering at this process's rank.
    pub fn reset_frame_number(&mut self) {
        self.frame_number = self.rank;
    }

    /// Frame number the next emitted frame will carry.
    #[must_use]
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Values pending in the current frame.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no values are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values per output frame.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn emit(&mut self) -> OutputFrame {
        let values = mem::replace(&mut self.values, Vec::with_capacity(self.capacity));
        let frame = OutputFrame::new(self.channel, self.frame_number, T::into_channel_data(values));
        self.frame_number += self.processes;
        frame
    }
}
