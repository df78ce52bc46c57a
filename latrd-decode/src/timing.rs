//! Full timestamp reconstruction.
//!
//! Event words carry a 24-bit fine timestamp truncated from the detector's
//! coarse counter, which is broadcast in full by extended timestamp control
//! words. Bits 21..23 of both values form a 2-bit match code. A fine
//! timestamp belongs either to the most recent coarse broadcast period or to
//! the one before it; the match code decides which, and the full timestamp
//! is the coarse value with its low 24 bits cleared plus the fine value.

use crate::{Error, Result};

/// Shift of the 2-bit match code.
pub const MATCH_CODE_SHIFT: u32 = 21;
/// Mask of the match code after shifting.
pub const MATCH_CODE_MASK: u64 = 0x3;
/// Coarse bits kept when combining with a fine timestamp: everything above
/// the 24 bits a fine timestamp carries.
pub const TIMESTAMP_HIGH_MASK: u64 = 0x000F_FFFF_FF00_0000;
/// One match-code period, used to synthesise a missing previous coarse value.
pub const COARSE_TIMESTAMP_ROLLOVER: u64 = 0x0020_0000;

/// Extracts the 2-bit match code from a coarse or fine timestamp.
#[inline]
#[must_use]
pub fn match_code(timestamp: u64) -> u8 {
    ((timestamp >> MATCH_CODE_SHIFT) & MATCH_CODE_MASK) as u8
}

/// Reconstructs a full timestamp from a fine value and the two latest coarse values.
///
/// The fine value is resolved against `current` if its match code equals the
/// current code or the one after it, otherwise against `previous` under the
/// same rule. The code comparison does not wrap: a current code of 3 only
/// accepts fine code 3.
///
/// # Errors
/// Returns [`Error::TimestampMismatch`] if neither coarse value matches.
#[inline]
pub fn full_timestamp(fine: u64, previous: u64, current: u64) -> Result<u64> {
    let mf = match_code(fine);
    let mc = match_code(current);
    let mp = match_code(previous);

    if mf == mc || mf == mc + 1 {
        Ok((current & TIMESTAMP_HIGH_MASK) + fine)
    } else if mf == mp || mf == mp + 1 {
        Ok((previous & TIMESTAMP_HIGH_MASK) + fine)
    } else {
        Err(Error::TimestampMismatch {
            fine,
            current,
            previous,
        })
    }
}

/// The pair of coarse timestamps a decoder tracks while walking a packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoarseTimestamps {
    previous: u64,
    current: u64,
}

impl CoarseTimestamps {
    /// Starts with no coarse broadcast seen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new coarse broadcast.
    ///
    /// When no earlier broadcast exists the previous value is synthesised
    /// one rollover period back, so events late from the prior period can
    /// still be matched.
    pub fn observe(&mut self, coarse: u64) {
        self.previous = self.current;
        self.current = coarse;
        if self.previous == 0 {
            self.previous = self.current.saturating_sub(COARSE_TIMESTAMP_ROLLOVER);
        }
    }

    /// Most recent coarse value.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Coarse value before the most recent one.
    #[must_use]
    pub fn previous(&self) -> u64 {
        self.previous
    }

    /// Resolves a fine timestamp against the tracked coarse values.
    ///
    /// # Errors
    /// Returns [`Error::TimestampMismatch`] if neither coarse value matches.
    #[inline]
    pub fn resolve(&self, fine: u64) -> Result<u64> {
        full_timestamp(fine, self.previous, self.current)
    }
}
