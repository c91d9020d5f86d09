//! Rate adaptation between the source recording and the destination block cadence.
//!
//! The reader does not interpolate: a block of `N` destination frames is filled with
//! `N * source_rate / destination_rate` consecutive source samples. This module only
//! decides how that ratio is turned into an integer sample count per pull.

use crate::config::RateAdaptation;

#[derive(Debug, Clone)]
pub struct RateAdapter {
    mode: RateAdaptation,
    /// source / destination
    ratio: f64,
    /// Fractional source samples owed to the next pull (accumulating mode only)
    carry: f64,
}

impl RateAdapter {
    pub fn new(mode: RateAdaptation, source_rate: f64, destination_rate: f64) -> Self {
        let ratio = if source_rate > 0.0 && destination_rate > 0.0 {
            source_rate / destination_rate
        } else {
            0.0
        };

        Self {
            mode,
            ratio,
            carry: 0.0,
        }
    }

    /// Source samples needed to fill a block of `block_size` destination frames.
    pub fn samples_for_block(&mut self, block_size: usize) -> usize {
        let exact = block_size as f64 * self.ratio;

        match self.mode {
            RateAdaptation::Truncate => exact.floor() as usize,
            RateAdaptation::Accumulate => {
                let total = exact + self.carry;
                let whole = total.floor();
                self.carry = total - whole;
                whole as usize
            }
        }
    }

    /// Upper bound of [`samples_for_block`](Self::samples_for_block) for `block_size`, in
    /// either mode.
    pub fn max_samples_for_block(&self, block_size: usize) -> usize {
        (block_size as f64 * self.ratio).ceil() as usize + 1
    }

    /// Source samples per destination frame
    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}
