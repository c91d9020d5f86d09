use crate::playback::samples_to_milliseconds;
use crate::source::{ChannelInfo, FileSource};

/// Snapshot of the active recording, copied from the backend on every selection.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingDescriptor {
    pub index: usize,
    pub channel_count: usize,
    pub total_samples: i64,
    pub sample_rate: f64,
    pub channels: Vec<ChannelInfo>,
}

impl RecordingDescriptor {
    /// Reads the backend's active record. The channel list is built from scratch.
    pub(crate) fn from_source(source: &dyn FileSource) -> Self {
        let channel_count = source.active_num_channels();
        let channels = (0..channel_count)
            .map(|channel| source.channel_info(channel))
            .collect();

        Self {
            index: source.active_record(),
            channel_count,
            total_samples: source.active_num_samples().max(0),
            sample_rate: source.active_sample_rate(),
            channels,
        }
    }

    /// Length of the recording in milliseconds
    pub fn duration_ms(&self) -> u32 {
        samples_to_milliseconds(self.total_samples, self.sample_rate)
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.total_samples as f64 / self.sample_rate
        } else {
            0.0
        }
    }
}

/// Entry of [`FileReader::recordings`](crate::FileReader::recordings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSummary {
    pub index: usize,
    pub name: String,
}
