use crate::{
    error::{FileReaderError, Result},
    source::{ChannelInfo, FileSource, FileSourceInfo},
};
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
        io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// Scale that maps full-scale `i16` to `[-1.0, 1.0)`.
const I16_BIT_VOLTS: f32 = 1.0 / 32768.0;

/// Built-in backend decoding WAV, FLAC and OGG/Vorbis files with Symphonia.
///
/// The whole default track is decoded into memory as interleaved `i16` when the file is
/// opened, so seeks and reads afterwards are plain slice operations. A file always exposes a
/// single recording, unless it decodes to zero frames, in which case it has none.
#[derive(Debug, Default)]
pub struct SymphoniaFileSource {
    path: Option<PathBuf>,
    /// Interleaved frames of the decoded track
    samples: Vec<i16>,
    channels: usize,
    sample_rate: f64,
    total_frames: usize,
    position: usize,
    channel_infos: Vec<ChannelInfo>,
}

impl SymphoniaFileSource {
    pub const EXTENSIONS: &'static str = "wav;wave;flac;ogg;oga";

    pub fn new() -> Self {
        Self::default()
    }

    /// Registry entry for this backend.
    pub fn info() -> FileSourceInfo {
        FileSourceInfo::new("Symphonia", Self::EXTENSIONS, || {
            Box::new(SymphoniaFileSource::new()) as Box<dyn FileSource>
        })
    }

    fn decode(path: &Path) -> Result<(Vec<i16>, usize, f64)> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| FileReaderError::Decode(format!("Failed to probe format: {:?}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| FileReaderError::Decode("No default track found".to_string()))?;
        let track_id = track.id;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| FileReaderError::Decode("Sample rate not found".to_string()))?;

        let channels = track
            .codec_params
            .channels
            .ok_or_else(|| FileReaderError::Decode("Channel count not found".to_string()))?
            .count();

        let mut decoder = get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| FileReaderError::Decode(format!("Failed to create decoder: {:?}", e)))?;

        let mut samples: Vec<i16> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(_)) => break, // end-of-file
                Err(e) => {
                    return Err(FileReaderError::Decode(format!(
                        "Error reading packet: {:?}",
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(Error::IoError(_)) => break,
                Err(Error::DecodeError(e)) => {
                    log::warn!("Skipping corrupt packet in {}: {}", path.display(), e);
                    continue;
                }
                Err(e) => {
                    return Err(FileReaderError::Decode(format!(
                        "Error decoding packet: {:?}",
                        e
                    )));
                }
            };

            let spec = *decoded.spec();
            let mut tmp = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
            tmp.copy_interleaved_ref(decoded);
            samples.extend_from_slice(tmp.samples());
        }

        Ok((samples, channels, sample_rate as f64))
    }
}

impl FileSource for SymphoniaFileSource {
    fn open_file(&mut self, path: &Path) -> Result<()> {
        let (samples, channels, sample_rate) = Self::decode(path)?;
        if channels == 0 {
            return Err(FileReaderError::Decode("Track has no channels".to_string()));
        }

        self.total_frames = samples.len() / channels;
        self.samples = samples;
        self.channels = channels;
        self.sample_rate = sample_rate;
        self.position = 0;
        self.path = Some(path.to_path_buf());
        self.channel_infos = (0..channels)
            .map(|ch| ChannelInfo::new(format!("CH{}", ch + 1), I16_BIT_VOLTS))
            .collect();

        log::info!(
            "Decoded {}: {} channels, {} frames at {} Hz",
            path.display(),
            self.channels,
            self.total_frames,
            self.sample_rate
        );

        Ok(())
    }

    fn num_records(&self) -> usize {
        if self.total_frames > 0 { 1 } else { 0 }
    }

    fn set_active_record(&mut self, index: usize) {
        if index != 0 {
            log::warn!(
                "Recording {} does not exist in {}, staying on recording 0",
                index,
                self.file_name()
            );
        }
        self.position = 0;
    }

    fn active_record(&self) -> usize {
        0
    }

    fn active_num_channels(&self) -> usize {
        self.channels
    }

    fn active_num_samples(&self) -> i64 {
        self.total_frames as i64
    }

    fn active_sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn channel_info(&self, channel: usize) -> ChannelInfo {
        self.channel_infos
            .get(channel)
            .cloned()
            .unwrap_or_else(|| ChannelInfo::new(format!("CH{}", channel + 1), I16_BIT_VOLTS))
    }

    fn seek_to(&mut self, sample: i64) {
        self.position = sample.clamp(0, self.total_frames as i64) as usize;
    }

    fn read_data(&mut self, dest: &mut [i16], num_samples: usize) {
        let channels = self.channels;
        let available = self.total_frames.saturating_sub(self.position).min(num_samples);

        let src_start = self.position * channels;
        let copy_len = (available * channels).min(dest.len());
        dest[..copy_len].copy_from_slice(&self.samples[src_start..src_start + copy_len]);

        // Past the end of the track reads silence
        let fill_end = (num_samples * channels).min(dest.len());
        if copy_len < fill_end {
            dest[copy_len..fill_end].fill(0);
        }

        self.position += available;
    }

    fn file_name(&self) -> String {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn channel_scale(&self, _channel: usize) -> f32 {
        I16_BIT_VOLTS
    }

    fn record_name(&self, index: usize) -> String {
        format!("{} [{}]", self.file_name(), index)
    }
}
