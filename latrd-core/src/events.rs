//! Structure of Arrays (`SoA`) storage for decoded events.
//!
//! A decoded packet produces three parallel columns (full timestamp,
//! position id and energy) that map one-to-one onto the three output
//! channels, so events are stored column-wise rather than as structs.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A batch of decoded events stored in `SoA` format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventBatch {
    /// Reconstructed full timestamps.
    pub timestamps: Vec<u64>,
    /// Position ids.
    pub ids: Vec<u32>,
    /// Energies.
    pub energies: Vec<u32>,
}

impl EventBatch {
    /// Creates a new empty batch with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
            energies: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of events in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Clears all columns, keeping their allocations.
    pub fn clear(&mut self) {
        self.timestamps.clear();
        self.ids.clear();
        self.energies.clear();
    }

    /// Pushes a single event into the batch.
    #[inline]
    pub fn push(&mut self, timestamp: u64, id: u32, energy: u32) {
        self.timestamps.push(timestamp);
        self.ids.push(id);
        self.energies.push(energy);
    }
}
