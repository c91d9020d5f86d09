//! Event types published by the file reader, and the marker emitter.

use crate::config::RateAdaptation;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::fmt;

/// Stable identifier of the marker channel
pub const MARKER_CHANNEL_IDENTIFIER: &str = "secondly.reader.";

#[derive(Debug, Clone, PartialEq)]
pub enum FileReaderEvent {
    /// Zero-payload marker emitted roughly once per second of source time
    Marker(MarkerEvent),
    /// Playback wrapped from the stop bound back to the start bound
    Looped {
        start_sample: i64,
        loop_count: u64,
    },
    FileOpened {
        file_name: String,
        num_records: usize,
    },
    RecordingSelected {
        index: usize,
        channels: usize,
        total_samples: i64,
        sample_rate: f64,
    },
    LoopBoundsChanged {
        start_sample: i64,
        stop_sample: i64,
    },
    /// Human-readable status for the host's message sink
    Status(String),
}

impl FileReaderEvent {
    pub fn is_marker(&self) -> bool {
        matches!(self, Self::Marker(_))
    }
}

/// A marker event positioned inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerEvent {
    pub channel_id: u32,
    /// Timestamp of the block the marker belongs to
    pub timestamp: i64,
    /// Offset of the marker inside that block
    pub sample_offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventChannelKind {
    Ttl,
}

/// Description of the dedicated channel markers are sent on.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerChannel {
    pub id: u32,
    pub kind: EventChannelKind,
    pub bit_width: u8,
    pub sample_rate: f64,
    pub name: String,
    pub description: String,
    pub identifier: String,
}

impl MarkerChannel {
    fn new(sample_rate: f64) -> Self {
        Self {
            id: 0,
            kind: EventChannelKind::Ttl,
            bit_width: 8,
            sample_rate,
            name: "regular file reader output".to_string(),
            description: "Triggers about every second".to_string(),
            identifier: MARKER_CHANNEL_IDENTIFIER.to_string(),
        }
    }
}

/// Decides once per pull whether a marker is due.
///
/// In [`RateAdaptation::Accumulate`] mode the counter tracks the distance to the next whole
/// second of source samples and places the marker exactly on it, so over any run the number
/// of markers is `floor(consumed / source_rate)` within one.
///
/// In [`RateAdaptation::Truncate`] mode a marker fires whenever the pull count is a multiple
/// of `floor(source_rate / span)`, the number of pulls of `span` samples that fit into one
/// second, at the part of a second left over after those pulls. The divisor is floored at 1.
/// This runs fast by `(source_rate / span - divisor) / divisor` and may place the marker up
/// to one block early.
#[derive(Debug, Clone, Default)]
pub struct TickCounter {
    mode: RateAdaptation,
    count: u64,
    /// Source samples left until the next second boundary (accumulating mode only)
    until_next: Option<u64>,
}

impl TickCounter {
    pub fn new(mode: RateAdaptation) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Pulls counted since the last reset
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.until_next = None;
    }

    /// Registers one pull of `span` samples. Returns the marker's offset inside the pull when
    /// one is due. At most one marker is reported per pull.
    pub fn tick(&mut self, source_rate: f64, span: usize) -> Option<usize> {
        self.count += 1;

        match self.mode {
            RateAdaptation::Truncate => self.tick_modulus(source_rate, span),
            RateAdaptation::Accumulate => self.tick_boundary(source_rate, span as u64),
        }
    }

    fn tick_modulus(&self, source_rate: f64, span: usize) -> Option<usize> {
        let span = span.max(1);
        let iterations_per_second = ((source_rate.max(0.0) / span as f64).floor() as u64).max(1);

        if self.count % iterations_per_second == 0 {
            let leftover = source_rate - (iterations_per_second * span as u64) as f64;
            Some(leftover.max(0.0) as usize)
        } else {
            None
        }
    }

    fn tick_boundary(&mut self, source_rate: f64, span: u64) -> Option<usize> {
        let second = (source_rate.round().max(0.0) as u64).max(1);
        let until_next = self.until_next.unwrap_or(second);

        if until_next < span {
            // spans longer than a second skip the boundaries after the first
            let mut next = until_next + second;
            while next < span {
                next += second;
            }
            self.until_next = Some(next - span);
            Some(until_next as usize)
        } else {
            self.until_next = Some(until_next - span);
            None
        }
    }
}

/// One bounded queue. Never blocks: when the consumer falls behind, new items are dropped and
/// counted.
#[derive(Debug)]
struct BoundedQueue<T> {
    label: &'static str,
    sender: Sender<T>,
    receiver: Receiver<T>,
    dropped: u64,
}

impl<T: fmt::Debug> BoundedQueue<T> {
    fn new(label: &'static str, capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        Self {
            label,
            sender,
            receiver,
            dropped: 0,
        }
    }

    fn push(&mut self, item: T) {
        match self.sender.try_send(item) {
            Ok(()) => {
                if self.dropped > 0 {
                    log::warn!(
                        "{} queue recovered after dropping {} items",
                        self.label,
                        self.dropped
                    );
                    self.dropped = 0;
                }
            }
            Err(TrySendError::Full(item)) => {
                if self.dropped == 0 {
                    log::warn!("{} queue full, dropping {:?}", self.label, item);
                }
                self.dropped += 1;
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Outgoing events, split into two bounded queues of the same capacity.
///
/// Markers travel on their own queue, so lifecycle and status events piling up in front of a
/// slow consumer never push markers out.
#[derive(Debug)]
pub struct EventPublisher {
    events: BoundedQueue<FileReaderEvent>,
    markers: BoundedQueue<MarkerEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: BoundedQueue::new("Event", capacity),
            markers: BoundedQueue::new("Marker", capacity),
        }
    }

    pub fn publish(&mut self, event: FileReaderEvent) {
        match event {
            FileReaderEvent::Marker(marker) => self.markers.push(marker),
            other => self.events.push(other),
        }
    }

    /// Drains every pending event: lifecycle and status events in publication order,
    /// followed by the pending markers in order.
    pub fn drain(&self) -> Vec<FileReaderEvent> {
        self.events
            .receiver
            .try_iter()
            .chain(self.markers.receiver.try_iter().map(FileReaderEvent::Marker))
            .collect()
    }

    /// Receiver of lifecycle and status events, for consumers polling from another thread.
    pub fn receiver(&self) -> Receiver<FileReaderEvent> {
        self.events.receiver.clone()
    }

    pub fn marker_receiver(&self) -> Receiver<MarkerEvent> {
        self.markers.receiver.clone()
    }
}

/// Owns the marker channel and dispatches markers on it.
///
/// The channel is created on first use, with the rate passed at that moment, and reused for
/// every later marker.
#[derive(Debug, Default)]
pub struct MarkerEmitter {
    channel: Option<MarkerChannel>,
    emitted: u64,
}

impl MarkerEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel_or_init(&mut self, sample_rate: f64) -> &MarkerChannel {
        self.channel.get_or_insert_with(|| {
            log::debug!("Creating marker channel at {} Hz", sample_rate);
            MarkerChannel::new(sample_rate)
        })
    }

    pub fn channel(&self) -> Option<&MarkerChannel> {
        self.channel.as_ref()
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn emit(
        &mut self,
        sample_rate: f64,
        timestamp: i64,
        sample_offset: usize,
        publisher: &mut EventPublisher,
    ) {
        let channel_id = self.channel_or_init(sample_rate).id;
        self.emitted += 1;

        log::debug!(
            "Marker {} at timestamp {} (+{})",
            self.emitted,
            timestamp,
            sample_offset
        );

        publisher.publish(FileReaderEvent::Marker(MarkerEvent {
            channel_id,
            timestamp,
            sample_offset,
        }));
    }
}
