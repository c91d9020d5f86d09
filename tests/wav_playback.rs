use approx::assert_relative_eq;
use filereader::{FileReader, FileReaderDesc, FileReaderError, FileReaderEvent, Parameter};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const RATE: u32 = 44_100;
const FRAMES: u32 = 44_100;
const SCALE: f32 = 1.0 / 32768.0;

/// Stereo ramp: channel 0 counts `n % 1000` up, channel 1 mirrors it negatively.
fn write_ramp(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for n in 0..FRAMES {
        let value = (n % 1000) as i16;
        writer.write_sample(value).unwrap();
        writer.write_sample(-value).unwrap();
    }
    writer.finalize().unwrap();

    path
}

#[test]
fn test_wav_is_streamed_and_calibrated() {
    let dir = TempDir::new().unwrap();
    let path = write_ramp(dir.path(), "ramp.wav");

    let mut reader = FileReader::new(FileReaderDesc::default()).unwrap();
    assert!(reader.is_file_supported(&path));

    let recording = reader.set_file(&path).unwrap();
    assert_eq!(recording.channel_count, 2);
    assert_eq!(recording.total_samples, FRAMES as i64);
    assert_eq!(recording.sample_rate, RATE as f64);
    assert_eq!(reader.total_time_ms(), 1000);
    assert_eq!(reader.file_name(), "ramp.wav");
    assert_relative_eq!(reader.bit_volts(0), SCALE);

    let mut block = reader.allocate_output();
    let info = reader.pull(&mut block, 1024);

    // source and destination rates match, so one frame per frame
    assert_eq!(info.frames, 1024);
    assert_eq!(info.timestamp, 1024);
    assert_relative_eq!(block.channel(0)[0], 0.0);
    assert_relative_eq!(block.channel(0)[999], 999.0 * SCALE);
    assert_relative_eq!(block.channel(0)[1000], 0.0);
    assert_relative_eq!(block.channel(1)[500], -500.0 * SCALE);
}

#[test]
fn test_wav_loops_at_stop_time() {
    let dir = TempDir::new().unwrap();
    let path = write_ramp(dir.path(), "loop.wav");

    let mut reader = FileReader::new(FileReaderDesc::default()).unwrap();
    reader.set_file(&path).unwrap();
    reader.set_parameter(Parameter::StopTime(500));
    assert_eq!(reader.cursor().stop_sample(), 22_050);

    let mut block = reader.allocate_output();
    for _ in 0..21 {
        reader.pull(&mut block, 1024);
    }
    assert_eq!(reader.cursor().current_sample(), 21_504);

    reader.pull(&mut block, 1024);
    assert_eq!(reader.loop_count(), 1);
    assert_eq!(reader.cursor().current_sample(), 1024 - 546);

    // frames 21504..22049 then 0.. again
    assert_relative_eq!(block.channel(0)[545], 49.0 * SCALE);
    assert_relative_eq!(block.channel(0)[546], 0.0);
    assert_relative_eq!(block.channel(0)[547], 1.0 * SCALE);

    let events = reader.poll_events();
    assert!(events.iter().any(|e| matches!(e, FileReaderEvent::Looped { .. })));
}

#[test]
fn test_wav_markers_once_per_second() {
    let dir = TempDir::new().unwrap();
    let path = write_ramp(dir.path(), "markers.wav");

    let mut reader = FileReader::new(FileReaderDesc::default()).unwrap();
    reader.set_file(&path).unwrap();

    // the file is one second long, so this loops every 43 pulls
    let mut block = reader.allocate_output();
    let mut positions = Vec::new();
    for _ in 0..430 {
        reader.pull(&mut block, 1024);
        for event in reader.poll_events() {
            if let FileReaderEvent::Marker(marker) = event {
                positions.push(marker.timestamp + marker.sample_offset as i64);
            }
        }
    }

    let consumed = reader.timestamp();
    assert_eq!(consumed, 430 * 1024);
    let expected: Vec<i64> = (1..=(consumed - 1) / RATE as i64)
        .map(|k| k * RATE as i64)
        .collect();
    assert_eq!(positions, expected);
    assert!(reader.loop_count() >= 9);
    assert_eq!(reader.marker_channel().sample_rate, RATE as f64);
}

#[test]
fn test_unreadable_wav_is_invalid() {
    let dir = TempDir::new().unwrap();
    let good = write_ramp(dir.path(), "good.wav");
    let bad = dir.path().join("bad.wav");
    std::fs::write(&bad, b"definitely not a RIFF header").unwrap();

    let mut reader = FileReader::new(FileReaderDesc::default()).unwrap();
    reader.set_file(&good).unwrap();

    let err = reader.set_file(&bad).unwrap_err();
    assert!(matches!(err, FileReaderError::InvalidFile(_)));
    assert_eq!(reader.file_name(), "good.wav");
    assert!(reader.is_ready());

    let err = reader.set_file(dir.path().join("notes.txt")).unwrap_err();
    assert!(matches!(err, FileReaderError::UnsupportedFormat(_)));
    assert_eq!(reader.recording().map(|r| r.channel_count), Some(2));
}
