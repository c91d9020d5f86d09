//! The file reader: activation, recording selection and the block pull loop.

use crate::buffer::ChannelBuffer;
use crate::config::FileReaderDesc;
use crate::control::{ControlHandle, Parameter};
use crate::error::{FileReaderError, Result};
use crate::events::{
    EventPublisher, FileReaderEvent, MarkerChannel, MarkerEmitter, MarkerEvent, TickCounter,
};
use crate::playback::{
    PlaybackCursor, ReadSpan, milliseconds_to_samples, samples_to_milliseconds,
};
use crate::rate::RateAdapter;
use crate::recording::{RecordingDescriptor, RecordingSummary};
use crate::source::{ChannelInfo, ExtensionRegistry, FileSource, path_extension};
use crossbeam_channel::{Receiver, Sender};
use std::path::Path;

/// Result of one [`FileReader::pull`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Running timestamp after this block, in source samples
    pub timestamp: i64,
    /// Frames written to each destination channel
    pub frames: usize,
}

/// Streams one recording of a file as fixed-size blocks, looping between the start and
/// stop bounds forever.
///
/// The reader owns at most one backend. A new file replaces it only once the file has been
/// opened and checked, so a failed [`set_file`](Self::set_file) never disturbs the recording
/// that is currently playing.
pub struct FileReader {
    desc: FileReaderDesc,
    registry: ExtensionRegistry,
    input: Option<Box<dyn FileSource>>,
    recording: Option<RecordingDescriptor>,
    cursor: PlaybackCursor,
    rate: RateAdapter,
    /// Interleaved raw frames of the current pull
    read_buffer: Vec<i16>,
    read_ahead_frames: usize,
    timestamp: i64,
    ticks: TickCounter,
    markers: MarkerEmitter,
    loop_count: u64,
    /// Set once a pull had to be clamped to the available capacity
    clamp_warned: bool,
    events: EventPublisher,
    command_sender: Sender<Parameter>,
    command_receiver: Receiver<Parameter>,
}

impl FileReader {
    /// Creates a reader backed by the default backends.
    pub fn new(desc: FileReaderDesc) -> Result<Self> {
        Self::with_registry(desc, ExtensionRegistry::with_default_backends())
    }

    pub fn with_registry(desc: FileReaderDesc, registry: ExtensionRegistry) -> Result<Self> {
        desc.validate()?;

        let (command_sender, command_receiver) =
            crossbeam_channel::bounded(desc.command_queue_capacity);

        Ok(Self {
            rate: RateAdapter::new(desc.rate_adaptation, 0.0, desc.destination_rate),
            ticks: TickCounter::new(desc.rate_adaptation),
            read_ahead_frames: desc.max_block_size,
            events: EventPublisher::new(desc.event_queue_capacity),
            desc,
            registry,
            input: None,
            recording: None,
            cursor: PlaybackCursor::default(),
            read_buffer: Vec::new(),
            timestamp: 0,
            markers: MarkerEmitter::new(),
            loop_count: 0,
            clamp_warned: false,
            command_sender,
            command_receiver,
        })
    }

    pub fn desc(&self) -> &FileReaderDesc {
        &self.desc
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Opens `path` with the backend registered for its extension and selects its first
    /// recording.
    ///
    /// On failure the error is also published as a status message and the previously
    /// active file stays untouched.
    pub fn set_file(&mut self, path: impl AsRef<Path>) -> Result<RecordingDescriptor> {
        let path = path.as_ref();
        let extension = path_extension(path).unwrap_or_default();

        let Some(info) = self.registry.resolve_backend(&extension).cloned() else {
            return Err(self.report(FileReaderError::UnsupportedFormat(format!(
                "{} (extension {:?})",
                path.display(),
                extension
            ))));
        };

        let mut source = info.create();
        if let Err(e) = source.open_file(path) {
            return Err(self.report(FileReaderError::InvalidFile(format!(
                "{}: {}",
                path.display(),
                e
            ))));
        }

        let num_records = source.num_records();
        if num_records == 0 {
            return Err(self.report(FileReaderError::EmptyFile(path.display().to_string())));
        }

        log::info!(
            "Opened {} with {} backend ({} recordings)",
            path.display(),
            info.name,
            num_records
        );

        let file_name = source.file_name();
        self.input = Some(source);
        self.events.publish(FileReaderEvent::FileOpened {
            file_name,
            num_records,
        });

        self.select_recording(0)
    }

    /// Makes recording `index` of the open file active and rewinds to its beginning.
    ///
    /// Out-of-range indices are handled by the backend. The returned descriptor describes the
    /// recording the backend actually made active.
    pub fn select_recording(&mut self, index: usize) -> Result<RecordingDescriptor> {
        let Some(input) = self.input.as_mut() else {
            log::warn!("Cannot select recording {}: no file is open", index);
            return Err(FileReaderError::NotReady);
        };

        input.set_active_record(index);
        input.seek_to(0);
        let recording = RecordingDescriptor::from_source(input.as_ref());
        if recording.index != index {
            log::warn!(
                "Recording {} was not selected, recording {} stays active",
                index,
                recording.index
            );
        }

        self.cursor = PlaybackCursor::new(recording.total_samples);
        self.rate = RateAdapter::new(
            self.desc.rate_adaptation,
            recording.sample_rate,
            self.desc.destination_rate,
        );
        self.read_ahead_frames = self
            .rate
            .max_samples_for_block(self.desc.max_block_size)
            .max(self.desc.max_block_size);
        self.read_buffer = vec![0; recording.channel_count * self.read_ahead_frames];
        log::debug!(
            "{} source samples per destination frame, read-ahead {} frames",
            self.rate.ratio(),
            self.read_ahead_frames
        );
        self.ticks.reset();
        self.clamp_warned = false;

        log::info!(
            "Selected recording {}: {} channels, {} samples at {} Hz",
            recording.index,
            recording.channel_count,
            recording.total_samples,
            recording.sample_rate
        );

        self.events.publish(FileReaderEvent::RecordingSelected {
            index: recording.index,
            channels: recording.channel_count,
            total_samples: recording.total_samples,
            sample_rate: recording.sample_rate,
        });

        self.recording = Some(recording.clone());
        Ok(recording)
    }

    /// Lists the recordings of the open file.
    pub fn recordings(&self) -> Vec<RecordingSummary> {
        let Some(input) = self.input.as_ref() else {
            return Vec::new();
        };

        (0..input.num_records())
            .map(|index| RecordingSummary {
                index,
                name: input.record_name(index),
            })
            .collect()
    }

    /// Fills `destination` with the next block.
    ///
    /// A block of `block_size` destination frames consumes `block_size * source_rate /
    /// destination_rate` source samples, which are copied without interpolation. Reads wrap
    /// from the stop bound to the start bound as often as needed.
    ///
    /// Markers are counted once per pull, however often it wraps. With
    /// [`RateAdaptation::Accumulate`](crate::RateAdaptation::Accumulate) each marker sits on a
    /// whole second of consumed source samples, so a run consuming `n` samples carries
    /// `floor(n / source_rate)` markers within one. With
    /// [`RateAdaptation::Truncate`](crate::RateAdaptation::Truncate) the marker may land up to
    /// one block early and the cadence runs slightly fast, see [`TickCounter`].
    ///
    /// The backend is read synchronously, so a slow backend delays the caller.
    pub fn pull(&mut self, destination: &mut ChannelBuffer, block_size: usize) -> BlockInfo {
        self.apply_queued_parameters();

        let Some(recording) = self.recording.as_ref() else {
            return self.pull_without_input(destination);
        };
        let channels = recording.channel_count;
        let source_rate = recording.sample_rate;

        let mut samples_needed = self.rate.samples_for_block(block_size);
        let capacity = self.read_ahead_frames.min(destination.capacity());
        if samples_needed > capacity {
            // the samples beyond capacity are skipped, not carried into the next pull
            if !self.clamp_warned {
                log::warn!(
                    "Block of {} frames needs {} samples, clamping to {}",
                    block_size,
                    samples_needed,
                    capacity
                );
                self.clamp_warned = true;
            }
            samples_needed = capacity;
        }

        let Some(input) = self.input.as_mut() else {
            return self.pull_without_input(destination);
        };

        let block_timestamp = self.timestamp;
        let mut samples_read = 0;

        while samples_read < samples_needed {
            let remaining = samples_needed - samples_read;
            let offset = samples_read * channels;

            let read = match self.cursor.span_for(remaining) {
                ReadSpan::Contiguous(count) => {
                    input.read_data(&mut self.read_buffer[offset..], count);
                    self.cursor.advance(count);
                    count
                }
                ReadSpan::Wrap(count) => {
                    if count > 0 {
                        input.read_data(&mut self.read_buffer[offset..], count);
                    }
                    input.seek_to(self.cursor.start_sample());
                    self.cursor.wrap();
                    self.loop_count += 1;

                    log::debug!(
                        "Looped to sample {} (loop {})",
                        self.cursor.start_sample(),
                        self.loop_count
                    );
                    self.events.publish(FileReaderEvent::Looped {
                        start_sample: self.cursor.start_sample(),
                        loop_count: self.loop_count,
                    });
                    count
                }
            };

            samples_read += read;

            if read == 0 && self.cursor.loop_length() == 0 {
                log::warn!(
                    "Loop window is empty at sample {}, filling {} frames with silence",
                    self.cursor.start_sample(),
                    samples_needed - samples_read
                );
                self.read_buffer[samples_read * channels..samples_needed * channels].fill(0);
                break;
            }
        }

        if samples_needed > 0 {
            if let Some(marker_offset) = self.ticks.tick(source_rate, samples_needed) {
                self.markers.emit(
                    source_rate,
                    block_timestamp,
                    marker_offset.min(samples_needed - 1),
                    &mut self.events,
                );
            }
        }

        let raw = &self.read_buffer[..samples_needed * channels];
        for channel in 0..destination.channels() {
            let out = destination.channel_mut(channel);
            if channel < channels {
                input.process_channel_data(raw, out, channel, samples_needed);
                out[samples_needed..].fill(0.0);
            } else {
                out.fill(0.0);
            }
        }

        self.timestamp += samples_needed as i64;

        BlockInfo {
            timestamp: self.timestamp,
            frames: samples_needed,
        }
    }

    fn pull_without_input(&mut self, destination: &mut ChannelBuffer) -> BlockInfo {
        self.report_status(FileReaderError::NotReady.status_message());
        destination.clear();

        BlockInfo {
            timestamp: self.timestamp,
            frames: 0,
        }
    }

    /// Applies a parameter update. Loop bounds are clamped to the recording and playback
    /// restarts from the start bound.
    pub fn set_parameter(&mut self, parameter: Parameter) {
        match parameter {
            Parameter::SelectRecording(index) => {
                if let Err(e) = self.select_recording(index) {
                    log::debug!("Recording {} not selected: {}", index, e);
                }
                return;
            }
            Parameter::StartTime(ms) => {
                let sample = milliseconds_to_samples(ms, self.default_sample_rate());
                self.cursor.set_start_sample(sample);
            }
            Parameter::StopTime(ms) => {
                let sample = milliseconds_to_samples(ms, self.default_sample_rate());
                self.cursor.set_stop_sample(sample);
            }
        }

        if let Some(input) = self.input.as_mut() {
            input.seek_to(self.cursor.current_sample());
        }

        log::debug!(
            "Loop bounds now [{}, {})",
            self.cursor.start_sample(),
            self.cursor.stop_sample()
        );
        self.events.publish(FileReaderEvent::LoopBoundsChanged {
            start_sample: self.cursor.start_sample(),
            stop_sample: self.cursor.stop_sample(),
        });
    }

    /// Numeric form of [`set_parameter`](Self::set_parameter): 0 selects a recording, 1 sets
    /// the start time and 2 the stop time, both in milliseconds.
    pub fn set_parameter_value(&mut self, index: usize, value: f32) {
        match Parameter::from_index(index, value) {
            Some(parameter) => self.set_parameter(parameter),
            None => log::warn!("Ignoring unknown parameter {} = {}", index, value),
        }
    }

    /// Handle for queuing parameter updates from another thread. They take effect at the
    /// start of the next pull.
    pub fn control_handle(&self) -> ControlHandle {
        ControlHandle::new(self.command_sender.clone())
    }

    fn apply_queued_parameters(&mut self) {
        while let Ok(parameter) = self.command_receiver.try_recv() {
            self.set_parameter(parameter);
        }
    }

    /// Returns every event published since the last call.
    pub fn poll_events(&self) -> Vec<FileReaderEvent> {
        self.events.drain()
    }

    /// Receiver of lifecycle and status events. Markers are delivered separately through
    /// [`marker_receiver`](Self::marker_receiver).
    pub fn event_receiver(&self) -> Receiver<FileReaderEvent> {
        self.events.receiver()
    }

    pub fn marker_receiver(&self) -> Receiver<MarkerEvent> {
        self.events.marker_receiver()
    }

    /// The marker channel, created on first access.
    pub fn marker_channel(&mut self) -> &MarkerChannel {
        let rate = self.default_sample_rate();
        self.markers.channel_or_init(rate)
    }

    pub fn markers_emitted(&self) -> u64 {
        self.markers.emitted()
    }

    /// Checks whether the reader can stream. Publishes a status message when no file is open.
    pub fn is_ready(&mut self) -> bool {
        match self.input.as_ref() {
            Some(input) => input.is_ready(),
            None => {
                self.report_status(FileReaderError::NotReady.status_message());
                false
            }
        }
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    /// Name of the open file, empty when none is open.
    pub fn file_name(&self) -> String {
        self.input
            .as_ref()
            .map(|input| input.file_name())
            .unwrap_or_default()
    }

    pub fn is_file_supported(&self, path: impl AsRef<Path>) -> bool {
        self.registry.supports_path(path.as_ref())
    }

    pub fn is_extension_supported(&self, extension: &str) -> bool {
        self.registry.supports(extension)
    }

    pub fn recording(&self) -> Option<&RecordingDescriptor> {
        self.recording.as_ref()
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn loop_count(&self) -> u64 {
        self.loop_count
    }

    /// Rate of the active recording, or the global rate when none is active.
    pub fn default_sample_rate(&self) -> f64 {
        self.recording
            .as_ref()
            .map_or(self.desc.global_sample_rate, |r| r.sample_rate)
    }

    /// Channel count of the active recording, or the placeholder count when none is active.
    pub fn default_num_outputs(&self) -> usize {
        self.recording
            .as_ref()
            .map_or(self.desc.placeholder_channel_count, |r| r.channel_count)
    }

    pub fn bit_volts(&self, channel: usize) -> f32 {
        self.recording
            .as_ref()
            .and_then(|r| r.channels.get(channel))
            .map_or(self.desc.placeholder_bit_volts, |info| info.bit_volts)
    }

    pub fn channel_infos(&self) -> &[ChannelInfo] {
        self.recording
            .as_ref()
            .map_or(&[][..], |r| r.channels.as_slice())
    }

    /// Destination buffer large enough for any pull up to `max_block_size` frames.
    pub fn allocate_output(&self) -> ChannelBuffer {
        ChannelBuffer::new(self.default_num_outputs(), self.read_ahead_frames)
    }

    pub fn current_time_ms(&self) -> u32 {
        self.samples_to_ms(self.cursor.current_sample())
    }

    pub fn total_time_ms(&self) -> u32 {
        self.samples_to_ms(self.cursor.total_samples())
    }

    pub fn start_time_ms(&self) -> u32 {
        self.samples_to_ms(self.cursor.start_sample())
    }

    pub fn stop_time_ms(&self) -> u32 {
        self.samples_to_ms(self.cursor.stop_sample())
    }

    fn samples_to_ms(&self, samples: i64) -> u32 {
        samples_to_milliseconds(samples, self.default_sample_rate())
    }

    fn report(&mut self, error: FileReaderError) -> FileReaderError {
        log::warn!("{}", error);
        self.events
            .publish(FileReaderEvent::Status(error.status_message()));
        error
    }

    fn report_status(&mut self, message: String) {
        log::warn!("{}", message);
        self.events.publish(FileReaderEvent::Status(message));
    }
}
