//! Playback cursor and loop bounds.
//!
//! This module provides:
//! - [`PlaybackCursor`]: current position and `[start, stop)` loop window of the active recording
//! - [`ReadSpan`]: how the next read has to be split at the loop boundary
//! - [`samples_to_milliseconds`] / [`milliseconds_to_samples`]: conversions used by the
//!   start/stop time parameters

/// Outcome of asking the cursor how much can be read before the loop boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSpan {
    /// The whole request fits before `stop_sample`
    Contiguous(usize),
    /// Only this many samples fit (possibly zero); the cursor must wrap to `start_sample`
    /// after reading them
    Wrap(usize),
}

/// Position and loop bounds of the active recording.
///
/// Invariant: `0 <= start_sample <= stop_sample <= total_samples` and
/// `start_sample <= current_sample <= stop_sample`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackCursor {
    current_sample: i64,
    start_sample: i64,
    stop_sample: i64,
    total_samples: i64,
}

impl PlaybackCursor {
    /// Cursor at sample 0 looping over the full recording.
    pub fn new(total_samples: i64) -> Self {
        let total_samples = total_samples.max(0);
        Self {
            current_sample: 0,
            start_sample: 0,
            stop_sample: total_samples,
            total_samples,
        }
    }

    pub fn current_sample(&self) -> i64 {
        self.current_sample
    }

    pub fn start_sample(&self) -> i64 {
        self.start_sample
    }

    pub fn stop_sample(&self) -> i64 {
        self.stop_sample
    }

    pub fn total_samples(&self) -> i64 {
        self.total_samples
    }

    /// Length of the loop window in samples
    pub fn loop_length(&self) -> i64 {
        self.stop_sample - self.start_sample
    }

    /// Moves the loop start, clamped to `[0, stop_sample]`, and rewinds to it.
    pub fn set_start_sample(&mut self, sample: i64) {
        self.start_sample = sample.clamp(0, self.stop_sample);
        self.rewind();
    }

    /// Moves the loop stop, clamped to `[start_sample, total_samples]`, and rewinds to the
    /// loop start.
    pub fn set_stop_sample(&mut self, sample: i64) {
        self.stop_sample = sample.clamp(self.start_sample, self.total_samples);
        self.rewind();
    }

    pub fn rewind(&mut self) {
        self.current_sample = self.start_sample;
    }

    /// Splits a request for `wanted` samples at the loop boundary.
    ///
    /// A request ending exactly on `stop_sample` is contiguous; the wrap happens on the
    /// following request with a zero-length read.
    pub fn span_for(&self, wanted: usize) -> ReadSpan {
        let wanted_i64 = wanted as i64;
        if self.current_sample + wanted_i64 > self.stop_sample {
            ReadSpan::Wrap((self.stop_sample - self.current_sample).max(0) as usize)
        } else {
            ReadSpan::Contiguous(wanted)
        }
    }

    /// Advances after a contiguous read. Never moves past `stop_sample`.
    pub fn advance(&mut self, samples: usize) {
        self.current_sample = (self.current_sample + samples as i64).min(self.stop_sample);
    }

    /// Jumps back to the loop start after reaching the boundary.
    pub fn wrap(&mut self) {
        self.rewind();
    }
}

/// `round(1000 * samples / sample_rate)`, saturating at `u32::MAX`. A non-positive rate
/// yields 0.
pub fn samples_to_milliseconds(samples: i64, sample_rate: f64) -> u32 {
    if sample_rate <= 0.0 {
        return 0;
    }
    let ms = (1000.0 * samples as f64 / sample_rate).round();
    ms.clamp(0.0, u32::MAX as f64) as u32
}

/// `floor(sample_rate * ms / 1000)`. A non-positive rate yields 0.
pub fn milliseconds_to_samples(ms: u32, sample_rate: f64) -> i64 {
    if sample_rate <= 0.0 {
        return 0;
    }
    (sample_rate * ms as f64 / 1000.0).floor() as i64
}
