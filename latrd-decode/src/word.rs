//! LATRD data word types and bit field extraction.
//!
//! Every payload word is 64 bits. Bit 63 separates control words from
//! event words:
//!
//! ```text
//! control: 1 | type (bits 58..63) | payload
//! event:   0 | position (39..63)  | - | fine ts (14..38) | energy (0..14)
//! ```

use crate::{Error, Result};

/// Set on every control word.
pub const CONTROL_WORD_FLAG: u64 = 0x8000_0000_0000_0000;
/// Shift of the 6-bit control type field.
pub const CONTROL_TYPE_SHIFT: u32 = 58;
/// Mask of the control type field after shifting.
pub const CONTROL_TYPE_MASK: u64 = 0x3F;
/// Coarse timestamp carried by an extended timestamp control word.
pub const COARSE_TIMESTAMP_MASK: u64 = 0x000F_FFFF_FFFF_FFF8;
/// Energy field of an event word.
pub const ENERGY_MASK: u64 = 0x3FFF;
/// Shift of the fine timestamp field.
pub const FINE_TIMESTAMP_SHIFT: u32 = 14;
/// Mask of the fine timestamp after shifting.
pub const FINE_TIMESTAMP_MASK: u64 = 0x00FF_FFFF;
/// Shift of the position id field.
pub const POSITION_SHIFT: u32 = 39;
/// Mask of the position id after shifting.
pub const POSITION_MASK: u64 = 0x00FF_FFFF;

/// The two word classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    /// Control word (bit 63 set).
    Control,
    /// Event word.
    Event,
}

impl std::fmt::Display for WordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WordKind::Control => f.write_str("control"),
            WordKind::Event => f.write_str("event"),
        }
    }
}

/// Control word types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    /// Extended (coarse) timestamp broadcast (type 0x20).
    ExtendedTimestamp,
    /// Any other control type, kept verbatim.
    Other(u8),
}

impl ControlType {
    /// Raw type value of the extended timestamp word.
    pub const EXTENDED_TIMESTAMP: u8 = 0x20;

    /// Creates a control type from the raw 6-bit field.
    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            Self::EXTENDED_TIMESTAMP => ControlType::ExtendedTimestamp,
            other => ControlType::Other(other),
        }
    }

    /// Raw 6-bit field value.
    #[must_use]
    pub fn raw(self) -> u8 {
        match self {
            ControlType::ExtendedTimestamp => Self::EXTENDED_TIMESTAMP,
            ControlType::Other(raw) => raw,
        }
    }
}

/// A classified payload word, as dispatched by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordClass {
    /// Extended timestamp broadcast with its coarse value.
    ExtendedTimestamp {
        /// Coarse timestamp.
        coarse: u64,
    },
    /// Any other control word.
    Control(u64),
    /// Event word with its raw fields.
    Event {
        /// Truncated fine timestamp.
        fine: u64,
        /// Position id.
        id: u32,
        /// Energy.
        energy: u16,
    },
}

/// A raw 64-bit LATRD payload word.
///
/// Zero-cost wrapper over `u64` with bit field accessors. The event
/// accessors fail on control words and [`DataWord::coarse_timestamp`] fails
/// on event words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct DataWord(u64);

impl DataWord {
    /// Wraps a raw word.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw word value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Builds an extended timestamp control word.
    ///
    /// Bits of `coarse` outside [`COARSE_TIMESTAMP_MASK`] are discarded.
    #[must_use]
    pub fn extended_timestamp(coarse: u64) -> Self {
        Self::control(ControlType::ExtendedTimestamp, coarse & COARSE_TIMESTAMP_MASK)
    }

    /// Builds a control word of the given type.
    ///
    /// `payload` is masked to the bits below the control type field.
    #[must_use]
    pub fn control(control_type: ControlType, payload: u64) -> Self {
        let payload_mask = (1u64 << CONTROL_TYPE_SHIFT) - 1;
        let raw = CONTROL_WORD_FLAG
            | ((u64::from(control_type.raw()) & CONTROL_TYPE_MASK) << CONTROL_TYPE_SHIFT)
            | (payload & payload_mask);
        Self(raw)
    }

    /// Builds an event word; each field is masked to its width.
    #[must_use]
    pub fn event(position: u32, fine: u64, energy: u16) -> Self {
        let raw = ((u64::from(position) & POSITION_MASK) << POSITION_SHIFT)
            | ((fine & FINE_TIMESTAMP_MASK) << FINE_TIMESTAMP_SHIFT)
            | (u64::from(energy) & ENERGY_MASK);
        Self(raw)
    }

    /// Returns true if this is a control word.
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        self.0 & CONTROL_WORD_FLAG != 0
    }

    /// Returns true if this is an event word.
    #[inline]
    #[must_use]
    pub const fn is_event(self) -> bool {
        !self.is_control()
    }

    /// Word class.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> WordKind {
        if self.is_control() {
            WordKind::Control
        } else {
            WordKind::Event
        }
    }

    /// Control type, or `None` for event words.
    #[inline]
    #[must_use]
    pub fn control_type(self) -> Option<ControlType> {
        if !self.is_control() {
            return None;
        }
        let raw = (self.0 >> CONTROL_TYPE_SHIFT) & CONTROL_TYPE_MASK;
        Some(ControlType::from_raw(raw as u8))
    }

    /// Returns true for an extended timestamp control word.
    #[inline]
    #[must_use]
    pub fn is_extended_timestamp(self) -> bool {
        self.control_type() == Some(ControlType::ExtendedTimestamp)
    }

    /// Coarse timestamp of a control word.
    ///
    /// # Errors
    /// Returns [`Error::WordType`] for event words.
    pub fn coarse_timestamp(self) -> Result<u64> {
        self.require(WordKind::Control)?;
        Ok(self.0 & COARSE_TIMESTAMP_MASK)
    }

    /// Fine timestamp of an event word.
    ///
    /// # Errors
    /// Returns [`Error::WordType`] for control words.
    pub fn fine_timestamp(self) -> Result<u64> {
        self.require(WordKind::Event)?;
        Ok((self.0 >> FINE_TIMESTAMP_SHIFT) & FINE_TIMESTAMP_MASK)
    }

    /// Energy of an event word.
    ///
    /// # Errors
    /// Returns [`Error::WordType`] for control words.
    pub fn energy(self) -> Result<u16> {
        self.require(WordKind::Event)?;
        Ok((self.0 & ENERGY_MASK) as u16)
    }

    /// Position id of an event word.
    ///
    /// # Errors
    /// Returns [`Error::WordType`] for control words.
    pub fn position_id(self) -> Result<u32> {
        self.require(WordKind::Event)?;
        Ok(((self.0 >> POSITION_SHIFT) & POSITION_MASK) as u32)
    }

    /// Classifies the word and extracts the fields the decoder needs.
    #[must_use]
    pub fn classify(self) -> WordClass {
        match self.control_type() {
            Some(ControlType::ExtendedTimestamp) => WordClass::ExtendedTimestamp {
                coarse: self.0 & COARSE_TIMESTAMP_MASK,
            },
            Some(ControlType::Other(_)) => WordClass::Control(self.0),
            None => WordClass::Event {
                fine: (self.0 >> FINE_TIMESTAMP_SHIFT) & FINE_TIMESTAMP_MASK,
                id: ((self.0 >> POSITION_SHIFT) & POSITION_MASK) as u32,
                energy: (self.0 & ENERGY_MASK) as u16,
            },
        }
    }

    fn require(self, expected: WordKind) -> Result<()> {
        if self.kind() == expected {
            Ok(())
        } else {
            Err(Error::WordType {
                expected,
                word: self.0,
            })
        }
    }
}

impl From<u64> for DataWord {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
