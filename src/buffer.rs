/// Planar multichannel `f32` buffer handed to [`FileReader::pull`](crate::FileReader::pull).
///
/// Each channel owns a contiguous run of `capacity` frames. The buffer is allocated once and
/// rewritten on every pull.
#[derive(Debug, Clone, Default)]
pub struct ChannelBuffer {
    data: Vec<f32>,
    channels: usize,
    capacity: usize,
}

impl ChannelBuffer {
    pub fn new(channels: usize, capacity: usize) -> Self {
        Self {
            data: vec![0.0; channels * capacity],
            channels,
            capacity,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Frames available per channel
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn channel(&self, channel: usize) -> &[f32] {
        let start = channel * self.capacity;
        &self.data[start..start + self.capacity]
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        let start = channel * self.capacity;
        &mut self.data[start..start + self.capacity]
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }
}
