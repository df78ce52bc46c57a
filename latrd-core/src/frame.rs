//! Output channels and the frames they emit.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the three output data streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Channel {
    /// Reconstructed full timestamps (`event_time_offset`).
    EventTimeOffset,
    /// Position ids (`event_id`).
    EventId,
    /// Energies (`event_energy`).
    EventEnergy,
}

impl Channel {
    /// All channels, in the order their frames are emitted.
    pub const ALL: [Channel; 3] = [
        Channel::EventTimeOffset,
        Channel::EventId,
        Channel::EventEnergy,
    ];

    /// Dataset name attached to every frame of this channel.
    #[must_use]
    pub fn dataset_name(self) -> &'static str {
        match self {
            Channel::EventTimeOffset => "event_time_offset",
            Channel::EventId => "event_id",
            Channel::EventEnergy => "event_energy",
        }
    }

    /// Element type carried by this channel.
    #[must_use]
    pub fn data_type(self) -> DataType {
        match self {
            Channel::EventTimeOffset => DataType::Uint64,
            Channel::EventId | Channel::EventEnergy => DataType::Uint32,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dataset_name())
    }
}

/// Logical element type tag of an output frame.
///
/// The discriminants are the type codes understood by the downstream writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum DataType {
    /// Unsigned 32-bit elements.
    Uint32 = 2,
    /// Unsigned 64-bit elements.
    Uint64 = 3,
}

impl DataType {
    /// Raw type code.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Flat payload of an output frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChannelData {
    /// 32-bit values (ids, energies).
    U32(Vec<u32>),
    /// 64-bit values (timestamps).
    U64(Vec<u64>),
}

impl ChannelData {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ChannelData::U32(values) => values.len(),
            ChannelData::U64(values) => values.len(),
        }
    }

    /// Returns true if the payload holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type tag of the payload.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            ChannelData::U32(_) => DataType::Uint32,
            ChannelData::U64(_) => DataType::Uint64,
        }
    }

    /// Returns the 64-bit values, if this is a 64-bit payload.
    #[must_use]
    pub fn as_u64(&self) -> Option<&[u64]> {
        match self {
            ChannelData::U64(values) => Some(values),
            ChannelData::U32(_) => None,
        }
    }

    /// Returns the 32-bit values, if this is a 32-bit payload.
    #[must_use]
    pub fn as_u32(&self) -> Option<&[u32]> {
        match self {
            ChannelData::U32(values) => Some(values),
            ChannelData::U64(_) => None,
        }
    }
}

/// A completed output frame for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutputFrame {
    /// Channel (dataset) this frame belongs to.
    pub channel: Channel,
    /// Frame sequence number within the channel.
    pub frame_number: u64,
    /// Flat array of values.
    pub data: ChannelData,
    /// Per-element dimensions; empty means one scalar per element.
    pub dimensions: Vec<usize>,
}

impl OutputFrame {
    /// Creates a frame of scalar elements.
    #[must_use]
    pub fn new(channel: Channel, frame_number: u64, data: ChannelData) -> Self {
        Self {
            channel,
            frame_number,
            data,
            dimensions: Vec::new(),
        }
    }

    /// Dataset name of the frame's channel.
    #[must_use]
    pub fn dataset_name(&self) -> &'static str {
        self.channel.dataset_name()
    }

    /// Element type tag.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    /// Number of elements in the frame.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the frame carries no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
