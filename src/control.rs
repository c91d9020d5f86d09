//! Parameter updates from the UI side.
//!
//! Parameters can be applied directly with [`FileReader::set_parameter`](crate::FileReader::set_parameter),
//! or queued from another thread through a [`ControlHandle`]. Queued parameters are applied
//! at the start of the next pull, never in the middle of one.

use crate::error::{FileReaderError, Result};
use crossbeam_channel::{Sender, TrySendError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    /// Make the recording at this index active
    SelectRecording(usize),
    /// Loop start in milliseconds
    StartTime(u32),
    /// Loop stop in milliseconds
    StopTime(u32),
}

impl Parameter {
    pub const SELECT_RECORDING: usize = 0;
    pub const START_TIME: usize = 1;
    pub const STOP_TIME: usize = 2;

    /// Decodes the host's numeric `(index, value)` form. Negative values clamp to 0.
    pub fn from_index(index: usize, value: f32) -> Option<Self> {
        let value = value.max(0.0);
        match index {
            Self::SELECT_RECORDING => Some(Self::SelectRecording(value as usize)),
            Self::START_TIME => Some(Self::StartTime(value as u32)),
            Self::STOP_TIME => Some(Self::StopTime(value as u32)),
            _ => None,
        }
    }
}

/// Cloneable sender for queued parameter updates.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    sender: Sender<Parameter>,
}

impl ControlHandle {
    pub(crate) fn new(sender: Sender<Parameter>) -> Self {
        Self { sender }
    }

    pub fn send(&self, parameter: Parameter) -> Result<()> {
        self.sender.try_send(parameter).map_err(|e| match e {
            TrySendError::Full(p) => {
                FileReaderError::Control(format!("Command queue full, dropped {:?}", p))
            }
            TrySendError::Disconnected(p) => {
                FileReaderError::Control(format!("Reader is gone, dropped {:?}", p))
            }
        })
    }

    pub fn select_recording(&self, index: usize) -> Result<()> {
        self.send(Parameter::SelectRecording(index))
    }

    pub fn set_start_time(&self, ms: u32) -> Result<()> {
        self.send(Parameter::StartTime(ms))
    }

    pub fn set_stop_time(&self, ms: u32) -> Result<()> {
        self.send(Parameter::StopTime(ms))
    }
}
