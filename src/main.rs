//! Command-line host for the file reader.
//!
//! Opens a file, applies the requested loop bounds and pulls blocks the way a pipeline
//! scheduler would, logging markers, loops and progress along the way. Set `RUST_LOG=debug`
//! for per-loop detail.

use anyhow::{Context, Result, bail};
use filereader::{FileReader, FileReaderDesc, FileReaderEvent, Parameter, RateAdaptation};
use std::env;
use std::str::FromStr;

#[derive(Debug)]
struct CliArgs {
    file_path: Option<String>,
    start_ms: Option<u32>,
    stop_ms: Option<u32>,
    recording: usize,
    block_size: usize,
    pulls: usize,
    truncate: bool,
    show_help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            file_path: None,
            start_ms: None,
            stop_ms: None,
            recording: 0,
            block_size: 1024,
            pulls: 2000,
            truncate: false,
            show_help: false,
        }
    }
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = Self::default();
        let mut iter = env::args().skip(1);

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" | "-h" => args.show_help = true,
                "--truncate" => args.truncate = true,
                "--start-ms" => args.start_ms = Some(value(&mut iter, &arg)?),
                "--stop-ms" => args.stop_ms = Some(value(&mut iter, &arg)?),
                "--recording" => args.recording = value(&mut iter, &arg)?,
                "--block-size" => args.block_size = value(&mut iter, &arg)?,
                "--pulls" => args.pulls = value(&mut iter, &arg)?,
                _ if arg.starts_with('-') => bail!("Unknown flag: {}", arg),
                _ => args.file_path = Some(arg),
            }
        }

        Ok(args)
    }

    fn print_help() {
        eprintln!(
            "Usage:\n  filereader [options] <file>\n\n\
             Options:\n\
             \x20 --recording <n>     Recording to play (default 0)\n\
             \x20 --start-ms <ms>     Loop start in milliseconds\n\
             \x20 --stop-ms <ms>      Loop stop in milliseconds\n\
             \x20 --block-size <n>    Destination frames per pull (default 1024)\n\
             \x20 --pulls <n>         Number of pulls to run (default 2000)\n\
             \x20 --truncate          Drop the fractional sample count of each pull\n\
             \x20 -h, --help          Show this help"
        );
    }
}

fn value<T>(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = iter
        .next()
        .with_context(|| format!("{} requires a value", flag))?;
    raw.parse()
        .with_context(|| format!("Invalid value for {}: {}", flag, raw))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse()?;
    if args.show_help {
        CliArgs::print_help();
        return Ok(());
    }
    let Some(path) = args.file_path.as_deref() else {
        CliArgs::print_help();
        bail!("No input file given");
    };

    let rate_adaptation = if args.truncate {
        RateAdaptation::Truncate
    } else {
        RateAdaptation::Accumulate
    };
    let desc = FileReaderDesc::new()
        .block_size(args.block_size)
        .rate_adaptation(rate_adaptation);

    let mut reader = FileReader::new(desc)?;
    let block_size = reader.desc().block_size;
    log::info!("Supported files: {}", reader.registry().extension_filter());

    let recording = reader
        .set_file(path)
        .with_context(|| format!("Failed to open {}", path))?;
    log::info!("Opened {} ({:.2} s)", path, recording.duration_seconds());

    for recording in reader.recordings() {
        log::info!("  [{}] {}", recording.index, recording.name);
    }

    if args.recording != 0 {
        reader.set_parameter(Parameter::SelectRecording(args.recording));
    }
    if let Some(ms) = args.start_ms {
        reader.set_parameter(Parameter::StartTime(ms));
    }
    if let Some(ms) = args.stop_ms {
        reader.set_parameter(Parameter::StopTime(ms));
    }

    log::info!(
        "Looping {} ms to {} ms of {} ms ({} channels at {} Hz)",
        reader.start_time_ms(),
        reader.stop_time_ms(),
        reader.total_time_ms(),
        reader.default_num_outputs(),
        reader.default_sample_rate()
    );

    let mut block = reader.allocate_output();
    let mut peak = 0.0f32;

    for _ in 0..args.pulls {
        let info = reader.pull(&mut block, block_size);

        for channel in 0..block.channels() {
            let channel_peak = block.channel(channel)[..info.frames]
                .iter()
                .fold(0.0f32, |acc, s| acc.max(s.abs()));
            peak = peak.max(channel_peak);
        }

        for event in reader.poll_events() {
            match event {
                FileReaderEvent::Marker(marker) => log::info!(
                    "Marker at {} (+{}), position {} ms",
                    marker.timestamp,
                    marker.sample_offset,
                    reader.current_time_ms()
                ),
                FileReaderEvent::Looped { loop_count, .. } => {
                    log::info!("Loop {} complete", loop_count)
                }
                FileReaderEvent::Status(message) => log::warn!("{}", message),
                _ => {}
            }
        }
    }

    log::info!(
        "Done: timestamp {}, {} markers, {} loops, peak {:.4}",
        reader.timestamp(),
        reader.markers_emitted(),
        reader.loop_count(),
        peak
    );

    Ok(())
}
