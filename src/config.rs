//! Configuration for the file reader

use crate::error::{FileReaderError, Result};

/// Nominal rate of the downstream pipeline's callback cadence.
pub const DESTINATION_RATE: f64 = 44100.0;

/// How the number of source samples per pull is derived from the block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateAdaptation {
    /// `floor(block_size * source_rate / destination_rate)` on every pull.
    /// The fractional part is lost, so the effective rate drifts low over long runs.
    Truncate,
    /// Same ratio, but the fractional remainder is carried into the next pull.
    #[default]
    Accumulate,
}

/// Configuration descriptor for a [`FileReader`](crate::FileReader)
#[derive(Debug, Clone)]
pub struct FileReaderDesc {
    /// Nominal destination rate in frames per second
    pub destination_rate: f64,
    /// Block size the host is expected to pull with
    pub block_size: usize,
    /// Largest block size a single pull may request. Read-ahead buffers are sized for it.
    pub max_block_size: usize,
    /// Fallback rate reported when no recording is active
    pub global_sample_rate: f64,
    /// Output count reported to the host when no recording is active
    pub placeholder_channel_count: usize,
    /// Calibration reported for channels when no recording is active
    pub placeholder_bit_volts: f32,
    pub rate_adaptation: RateAdaptation,
    /// Capacity of the downstream event queue. Events beyond it are dropped.
    pub event_queue_capacity: usize,
    /// Capacity of the queued parameter command channel
    pub command_queue_capacity: usize,
}

impl Default for FileReaderDesc {
    fn default() -> Self {
        Self {
            destination_rate: DESTINATION_RATE,
            block_size: 1024,
            max_block_size: 8192,
            global_sample_rate: 44100.0,
            placeholder_channel_count: 16,
            placeholder_bit_volts: 0.05,
            rate_adaptation: RateAdaptation::default(),
            event_queue_capacity: 1024,
            command_queue_capacity: 64,
        }
    }
}

impl FileReaderDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destination_rate(mut self, rate: f64) -> Self {
        self.destination_rate = rate;
        self
    }

    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self.max_block_size = self.max_block_size.max(size);
        self
    }

    pub fn max_block_size(mut self, size: usize) -> Self {
        self.max_block_size = size;
        self
    }

    pub fn global_sample_rate(mut self, rate: f64) -> Self {
        self.global_sample_rate = rate;
        self
    }

    pub fn rate_adaptation(mut self, mode: RateAdaptation) -> Self {
        self.rate_adaptation = mode;
        self
    }

    pub fn event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity;
        self
    }

    pub fn command_queue_capacity(mut self, capacity: usize) -> Self {
        self.command_queue_capacity = capacity;
        self
    }

    /// Checks the descriptor for values the pull loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.destination_rate.is_finite() && self.destination_rate > 0.0) {
            return Err(FileReaderError::Configuration(format!(
                "Destination rate must be positive, got {}",
                self.destination_rate
            )));
        }

        if !(self.global_sample_rate.is_finite() && self.global_sample_rate > 0.0) {
            return Err(FileReaderError::Configuration(format!(
                "Global sample rate must be positive, got {}",
                self.global_sample_rate
            )));
        }

        if self.block_size == 0 {
            return Err(FileReaderError::Configuration(
                "Block size must be greater than 0".to_string(),
            ));
        }

        if self.max_block_size < self.block_size {
            return Err(FileReaderError::Configuration(format!(
                "Max block size {} is smaller than block size {}",
                self.max_block_size, self.block_size
            )));
        }

        if self.event_queue_capacity == 0 || self.command_queue_capacity == 0 {
            return Err(FileReaderError::Configuration(
                "Queue capacities must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
