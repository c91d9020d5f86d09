//! In-memory backend used by the unit tests.

use crate::error::{FileReaderError, Result};
use crate::source::{ChannelInfo, FileSource, FileSourceInfo};
use std::path::Path;

#[derive(Debug, Clone)]
pub(crate) struct MemoryRecording {
    pub channels: usize,
    pub sample_rate: f64,
    /// Interleaved frames
    pub samples: Vec<i16>,
    pub bit_volts: f32,
}

impl MemoryRecording {
    /// Frame `n` of channel `c` holds `(n % 10000) + 10000 * c`, so the frame index can be read
    /// back from channel 0 of the output.
    pub fn ramp(channels: usize, frames: usize, sample_rate: f64) -> Self {
        let samples = (0..frames)
            .flat_map(|n| (0..channels).map(move |c| ((n % 10_000) + 10_000 * c) as i16))
            .collect();
        Self {
            channels,
            sample_rate,
            samples,
            bit_volts: 1.0,
        }
    }

    fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MemorySource {
    records: Vec<MemoryRecording>,
    active: usize,
    position: usize,
    fail_open: bool,
    file_name: String,
}

impl MemorySource {
    pub fn new(records: Vec<MemoryRecording>) -> Self {
        Self {
            records,
            active: 0,
            position: 0,
            fail_open: false,
            file_name: String::new(),
        }
    }

    pub fn ramp(channels: usize, frames: usize, sample_rate: f64) -> Self {
        Self::new(vec![MemoryRecording::ramp(channels, frames, sample_rate)])
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(Vec::new())
        }
    }

    /// Registry entry cloning `self` for every instantiation.
    pub fn into_info(self, extensions: &str) -> FileSourceInfo {
        FileSourceInfo::new("Memory", extensions, move || {
            Box::new(self.clone()) as Box<dyn FileSource>
        })
    }

    fn current(&self) -> Option<&MemoryRecording> {
        self.records.get(self.active)
    }
}

impl FileSource for MemorySource {
    fn open_file(&mut self, path: &Path) -> Result<()> {
        if self.fail_open {
            return Err(FileReaderError::Decode(format!(
                "cannot open {}",
                path.display()
            )));
        }
        self.file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(())
    }

    fn num_records(&self) -> usize {
        self.records.len()
    }

    fn set_active_record(&mut self, index: usize) {
        if index < self.records.len() {
            self.active = index;
            self.position = 0;
        }
    }

    fn active_record(&self) -> usize {
        self.active
    }

    fn active_num_channels(&self) -> usize {
        self.current().map_or(0, |r| r.channels)
    }

    fn active_num_samples(&self) -> i64 {
        self.current().map_or(0, |r| r.frames() as i64)
    }

    fn active_sample_rate(&self) -> f64 {
        self.current().map_or(0.0, |r| r.sample_rate)
    }

    fn channel_info(&self, channel: usize) -> ChannelInfo {
        let bit_volts = self.current().map_or(1.0, |r| r.bit_volts);
        ChannelInfo::new(format!("R{}CH{}", self.active, channel), bit_volts)
    }

    fn seek_to(&mut self, sample: i64) {
        let frames = self.current().map_or(0, |r| r.frames());
        self.position = sample.clamp(0, frames as i64) as usize;
    }

    fn read_data(&mut self, dest: &mut [i16], num_samples: usize) {
        let Some(record) = self.records.get(self.active) else {
            return;
        };
        let channels = record.channels;
        let available = record.frames().saturating_sub(self.position).min(num_samples);
        let start = self.position * channels;
        let len = available * channels;
        dest[..len].copy_from_slice(&record.samples[start..start + len]);
        dest[len..num_samples * channels].fill(0);
        self.position += available;
    }

    fn file_name(&self) -> String {
        self.file_name.clone()
    }

    fn channel_scale(&self, _channel: usize) -> f32 {
        self.current().map_or(1.0, |r| r.bit_volts)
    }
}
