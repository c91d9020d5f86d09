//! File source backends and the extension registry that selects between them.
//!
//! A [`FileSource`] decodes one on-disk format into raw interleaved `i16` frames and knows
//! how to turn those raw frames into calibrated `f32` samples for one channel. The reader
//! never touches a format directly: it resolves a backend through the
//! [`ExtensionRegistry`] and talks to it exclusively through this trait.

mod registry;
mod symphonia_source;

pub(crate) use registry::path_extension;
pub use registry::{ExtensionRegistry, FileSourceCreator, FileSourceInfo};
pub use symphonia_source::SymphoniaFileSource;

use crate::error::Result;
use std::path::Path;

/// Name and calibration of a single recorded channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub name: String,
    /// Scale applied to a raw sample to obtain the channel's physical value
    pub bit_volts: f32,
}

impl ChannelInfo {
    pub fn new(name: impl Into<String>, bit_volts: f32) -> Self {
        Self {
            name: name.into(),
            bit_volts,
        }
    }
}

/// Trait implemented by every file format backend.
///
/// Raw data is exchanged as **interleaved** `i16` frames: frame `n` of channel `c` lives at
/// `n * channels + c`. A backend owns its own read position; [`read_data`](Self::read_data)
/// advances it and [`seek_to`](Self::seek_to) moves it.
///
/// Bounds policy for [`set_active_record`](Self::set_active_record) and reads past the end of
/// a recording belongs to the backend. The reader does not validate indices before
/// forwarding them.
///
/// # Example
///
/// ```ignore
/// use filereader::source::{ChannelInfo, FileSource};
///
/// struct MyFormat { /* ... */ }
///
/// impl FileSource for MyFormat {
///     fn open_file(&mut self, path: &Path) -> Result<()> { todo!() }
///     // ...
/// }
/// ```
pub trait FileSource: Send {
    /// Opens `path`. On error the backend must not be used further.
    fn open_file(&mut self, path: &Path) -> Result<()>;

    fn num_records(&self) -> usize;

    fn set_active_record(&mut self, index: usize);

    /// Index of the record reads come from
    fn active_record(&self) -> usize;

    fn active_num_channels(&self) -> usize;

    fn active_num_samples(&self) -> i64;

    fn active_sample_rate(&self) -> f64;

    fn channel_info(&self, channel: usize) -> ChannelInfo;

    fn seek_to(&mut self, sample: i64);

    /// Reads `num_samples` frames from the current position into `dest`, which holds at least
    /// `num_samples * active_num_channels()` values.
    fn read_data(&mut self, dest: &mut [i16], num_samples: usize);

    /// Converts `num_samples` frames of `channel` from the interleaved raw buffer `src` into
    /// `dest`.
    fn process_channel_data(&self, src: &[i16], dest: &mut [f32], channel: usize, num_samples: usize) {
        deinterleave_scaled(
            src,
            dest,
            channel,
            self.active_num_channels(),
            num_samples,
            self.channel_scale(channel),
        );
    }

    fn file_name(&self) -> String;

    /// Calibration of `channel`. Backends that cache channel info should override this, it is
    /// called once per channel on every pull.
    fn channel_scale(&self, channel: usize) -> f32 {
        self.channel_info(channel).bit_volts
    }

    fn record_name(&self, index: usize) -> String {
        format!("Recording {}", index)
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Copies one channel out of an interleaved raw buffer, applying `scale`.
///
/// Frames missing from `src` or beyond `dest` are skipped, never read out of bounds.
pub fn deinterleave_scaled(
    src: &[i16],
    dest: &mut [f32],
    channel: usize,
    channels: usize,
    num_samples: usize,
    scale: f32,
) {
    if channels == 0 || channel >= channels {
        return;
    }

    for (out, frame) in dest
        .iter_mut()
        .take(num_samples)
        .zip(src.chunks_exact(channels))
    {
        *out = frame[channel] as f32 * scale;
    }
}
