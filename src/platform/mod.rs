//! Platform abstraction for queued audio output
//! The feeder only talks to devices through `AudioDevice`, so the same frame loop
//! runs against a real cpal stream or the in-memory simulated device.

use crate::buffer::{SampleBuffer, BYTES_PER_SAMPLE};
use crate::error::AudioError;

/// Requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Preferred device period in frames. Backends may ignore it.
    pub buffer_size_hint: u32,
}

impl DeviceSpec {
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    pub(crate) fn validate(&self) -> Result<(), AudioError> {
        if self.bits_per_sample as usize != BYTES_PER_SAMPLE * 8 {
            return Err(AudioError::Layout(format!(
                "{} bits per sample requested, only 16 is supported",
                self.bits_per_sample
            )));
        }
        if self.channels == 0 {
            return Err(AudioError::Layout("zero channels requested".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(AudioError::Layout("zero sample rate requested".to_string()));
        }
        Ok(())
    }

    pub(crate) fn check_buffer(&self, buffer: &SampleBuffer) -> Result<(), AudioError> {
        if buffer.channels() != self.channels {
            return Err(AudioError::Layout(format!(
                "{}-channel buffer enqueued on a {}-channel device",
                buffer.channels(),
                self.channels
            )));
        }
        Ok(())
    }
}

/// Trait for queue-style audio outputs
pub trait AudioDevice {
    /// Open a device for the given format
    fn open(spec: DeviceSpec) -> Result<Self, AudioError>
    where
        Self: Sized;

    /// The format the device was opened with
    fn spec(&self) -> &DeviceSpec;

    /// Bytes enqueued and not yet played
    fn queued_bytes(&self) -> usize;

    /// Hand a buffer to the device; returns without waiting for playback
    fn enqueue(&mut self, buffer: &SampleBuffer) -> Result<(), AudioError>;

    /// Start or pause draining the queue
    fn set_playing(&mut self, playing: bool) -> Result<(), AudioError>;

    fn is_playing(&self) -> bool;

    /// Release the device. Further enqueues fail with `AudioError::Closed`.
    fn close(&mut self) -> Result<(), AudioError>;
}

// Platform-specific implementations
#[cfg(feature = "native")]
pub mod cpal_output;

pub mod simulated;

#[cfg(feature = "native")]
pub use self::cpal_output::CpalQueueDevice;

pub use self::simulated::SimulatedDevice;
