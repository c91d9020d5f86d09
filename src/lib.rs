//! # filereader
//!
//! Streams a recording stored in a file as fixed-size, timestamped sample blocks for a
//! block-based processing pipeline.
//!
//! A [`FileReader`] picks a decoding backend by file extension, lets the caller choose one of
//! the file's recordings and then, on every [`pull`](FileReader::pull), converts the next run
//! of raw samples into calibrated `f32` channels. Playback loops between adjustable start and
//! stop bounds forever, and a marker event is published roughly once per second of source
//! time.
//!
//! ## Quick Start
//!
//! ```no_run
//! use filereader::*;
//!
//! let mut reader = FileReader::new(FileReaderDesc::default())?;
//! let recording = reader.set_file("session.wav")?;
//! println!("{} channels at {} Hz", recording.channel_count, recording.sample_rate);
//!
//! // Loop over the first five seconds
//! reader.set_parameter(Parameter::StopTime(5000));
//!
//! let mut block = reader.allocate_output();
//! loop {
//!     let info = reader.pull(&mut block, 1024);
//!     for event in reader.poll_events() {
//!         if let FileReaderEvent::Marker(marker) = event {
//!             println!("marker at {} + {}", marker.timestamp, marker.sample_offset);
//!         }
//!     }
//!     # if info.frames == 0 { break; }
//! }
//! # Ok::<(), FileReaderError>(())
//! ```
//!
//! ## Backends
//!
//! Formats are provided by [`source::FileSource`] implementations registered in an
//! [`source::ExtensionRegistry`]. The default registry decodes WAV, FLAC and Ogg Vorbis through
//! symphonia.

pub mod buffer;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod playback;
pub mod rate;
pub mod reader;
pub mod recording;
pub mod source;

#[cfg(test)]
mod test_support;

pub use buffer::ChannelBuffer;
pub use config::{DESTINATION_RATE, FileReaderDesc, RateAdaptation};
pub use control::{ControlHandle, Parameter};
pub use error::{FileReaderError, Result};
pub use events::{FileReaderEvent, MarkerChannel, MarkerEvent};
pub use playback::{PlaybackCursor, milliseconds_to_samples, samples_to_milliseconds};
pub use reader::{BlockInfo, FileReader};
pub use recording::{RecordingDescriptor, RecordingSummary};
pub use source::{ChannelInfo, ExtensionRegistry, FileSource, FileSourceInfo};
