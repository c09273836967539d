//! In-memory audio device with a synthetic playback clock
//!
//! Stands in for real hardware in tests and offline rendering. Playback only
//! happens when the owner calls `advance`, which drains frames at the device's
//! sample rate for the elapsed time. Every enqueue is recorded.

use std::collections::VecDeque;
use std::time::Duration;

use super::{AudioDevice, DeviceSpec};
use crate::buffer::{SampleBuffer, BYTES_PER_SAMPLE};
use crate::error::AudioError;

#[derive(Debug)]
pub struct SimulatedDevice {
    spec: DeviceSpec,
    queue: VecDeque<i16>,
    playing: bool,
    closed: bool,
    enqueue_log: Vec<usize>,
    captured: Option<Vec<i16>>,
    played_frames: u64,
    underrun_frames: u64,
    // Fraction of a frame owed from previous advances
    pending_frame_fraction: f64,
}

impl SimulatedDevice {
    /// Open a device that also keeps everything it plays.
    pub fn with_capture(spec: DeviceSpec) -> Result<Self, AudioError> {
        let mut device = Self::open(spec)?;
        device.captured = Some(Vec::new());
        Ok(device)
    }

    /// Let `elapsed` of wall time pass. Returns the number of frames played,
    /// including silent underrun frames.
    pub fn advance(&mut self, elapsed: Duration) -> usize {
        if !self.playing || self.closed {
            return 0;
        }
        let owed = elapsed.as_secs_f64() * self.spec.sample_rate as f64 + self.pending_frame_fraction;
        let frames = owed.floor();
        self.pending_frame_fraction = owed - frames;
        let frames = frames as usize;
        self.play_frames(frames);
        frames
    }

    /// Drain `frames` frames immediately, substituting silence once the queue runs dry.
    pub fn play_frames(&mut self, frames: usize) {
        let channels = self.spec.channels as usize;
        let available = self.queue.len() / channels;
        let from_queue = frames.min(available);
        let silent = frames - from_queue;

        let drained = self.queue.drain(..from_queue * channels);
        match self.captured.as_mut() {
            Some(captured) => {
                captured.extend(drained);
                captured.resize(captured.len() + silent * channels, 0);
            }
            None => drop(drained),
        }

        self.played_frames += frames as u64;
        self.underrun_frames += silent as u64;
    }

    /// Byte length of every enqueue call, in order.
    pub fn enqueue_calls(&self) -> &[usize] {
        &self.enqueue_log
    }

    pub fn queued_frames(&self) -> usize {
        self.queue.len() / self.spec.channels as usize
    }

    pub fn played_frames(&self) -> u64 {
        self.played_frames
    }

    pub fn underrun_frames(&self) -> u64 {
        self.underrun_frames
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Interleaved samples played so far, if capture was enabled.
    pub fn captured(&self) -> Option<&[i16]> {
        self.captured.as_deref()
    }

    pub fn take_captured(&mut self) -> Vec<i16> {
        self.captured.as_mut().map(std::mem::take).unwrap_or_default()
    }
}

impl AudioDevice for SimulatedDevice {
    fn open(spec: DeviceSpec) -> Result<Self, AudioError> {
        spec.validate()?;
        Ok(Self {
            spec,
            queue: VecDeque::new(),
            playing: false,
            closed: false,
            enqueue_log: Vec::new(),
            captured: None,
            played_frames: 0,
            underrun_frames: 0,
            pending_frame_fraction: 0.0,
        })
    }

    fn spec(&self) -> &DeviceSpec {
        &self.spec
    }

    fn queued_bytes(&self) -> usize {
        self.queue.len() * BYTES_PER_SAMPLE
    }

    fn enqueue(&mut self, buffer: &SampleBuffer) -> Result<(), AudioError> {
        if self.closed {
            return Err(AudioError::Closed);
        }
        self.spec.check_buffer(buffer)?;
        self.queue.extend(buffer.samples().iter().copied());
        self.enqueue_log.push(buffer.byte_len());
        Ok(())
    }

    fn set_playing(&mut self, playing: bool) -> Result<(), AudioError> {
        if self.closed {
            return Err(AudioError::Closed);
        }
        self.playing = playing;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn close(&mut self) -> Result<(), AudioError> {
        if self.closed {
            return Err(AudioError::Closed);
        }
        self.closed = true;
        self.playing = false;
        self.queue.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> DeviceSpec {
        DeviceSpec {
            sample_rate: 48000,
            channels: 2,
            bits_per_sample: 16,
            buffer_size_hint: 800,
        }
    }

    #[test]
    fn test_paused_device_does_not_drain() {
        let mut device = SimulatedDevice::open(spec()).unwrap();
        device.enqueue(&SampleBuffer::with_frames(100, 2).unwrap()).unwrap();

        assert_eq!(device.advance(Duration::from_millis(10)), 0);
        assert_eq!(device.queued_frames(), 100);
    }

    #[test]
    fn test_fractional_frames_carry() {
        let mut device = SimulatedDevice::open(spec()).unwrap();
        device.set_playing(true).unwrap();

        // 1/7 ms is not a whole number of frames at 48 kHz
        let mut total = 0;
        for _ in 0..7 {
            total += device.advance(Duration::from_nanos(1_000_000 / 7));
        }
        assert!(total == 47 || total == 48, "total {}", total);
        assert_eq!(device.underrun_frames(), total as u64);
    }

    #[test]
    fn test_capture_pads_underrun_with_silence() {
        let mut device = SimulatedDevice::with_capture(spec()).unwrap();
        let mut buffer = SampleBuffer::with_frames(2, 2).unwrap();
        for frame in buffer.frames_mut() {
            frame.fill(7);
        }
        device.enqueue(&buffer).unwrap();
        device.set_playing(true).unwrap();

        device.play_frames(3);
        assert_eq!(device.captured().unwrap(), &[7, 7, 7, 7, 0, 0]);
        assert_eq!(device.underrun_frames(), 1);
    }

    #[test]
    fn test_closed_device_rejects_enqueue() {
        let mut device = SimulatedDevice::open(spec()).unwrap();
        device.close().unwrap();
        assert!(matches!(
            device.enqueue(&SampleBuffer::with_frames(1, 2).unwrap()),
            Err(AudioError::Closed)
        ));
        assert!(matches!(device.close(), Err(AudioError::Closed)));
    }

    #[test]
    fn test_channel_mismatch() {
        let mut device = SimulatedDevice::open(spec()).unwrap();
        assert!(matches!(
            device.enqueue(&SampleBuffer::with_frames(1, 1).unwrap()),
            Err(AudioError::Layout(_))
        ));
    }
}
