//! Per-frame audio queue balancing
//!
//! The display loop runs at a variable cadence while the device drains at a fixed
//! hardware rate. Each tick the feeder tops the device queue back up to a target
//! depth, so a slow frame produces a larger write and a fast frame a smaller one
//! (or none at all).

use crate::buffer::{channels_for_frame_bytes, SampleBuffer};
use crate::error::AudioError;
use crate::gen::square_wave::SquareWave;
use crate::platform::AudioDevice;

/// Outcome of one feeder tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// Queue already at or above target; nothing synthesized.
    Idle,
    /// `frames` sample frames were synthesized and enqueued.
    Feeding { frames: usize },
}

pub struct AudioFeeder {
    wave: SquareWave,
    target_queue_bytes: usize,
}

impl AudioFeeder {
    pub fn new(wave: SquareWave, target_queue_bytes: usize) -> Self {
        Self {
            wave,
            target_queue_bytes,
        }
    }

    /// Synthesize the bytes missing between `current_queued_bytes` and
    /// `target_queue_bytes`, rounded down to whole frames.
    ///
    /// Every channel of a frame carries the same sample and the running index
    /// advances once per frame. An empty buffer leaves the index untouched.
    pub fn feed(
        &mut self,
        target_queue_bytes: usize,
        current_queued_bytes: usize,
        bytes_per_frame: usize,
    ) -> Result<SampleBuffer, AudioError> {
        let channels = channels_for_frame_bytes(bytes_per_frame)?;
        let bytes_to_write = target_queue_bytes.saturating_sub(current_queued_bytes);
        let frames = bytes_to_write / bytes_per_frame;
        if frames == 0 {
            return Ok(SampleBuffer::empty(channels));
        }

        let mut buffer = SampleBuffer::with_frames(frames, channels)?;
        for frame in buffer.frames_mut() {
            frame.fill(self.wave.next_sample());
        }
        Ok(buffer)
    }

    /// Run one frame's worth of queue balancing against `device`.
    pub fn tick<D: AudioDevice>(&mut self, device: &mut D) -> Result<FeedState, AudioError> {
        let bytes_per_frame = device.spec().bytes_per_frame();
        let queued = device.queued_bytes();
        let buffer = self.feed(self.target_queue_bytes, queued, bytes_per_frame)?;
        if buffer.is_empty() {
            return Ok(FeedState::Idle);
        }

        let frames = buffer.frames();
        device.enqueue(&buffer)?;
        if !device.is_playing() {
            device.set_playing(true)?;
        }
        log::trace!("Queued {} frames ({} bytes were pending)", frames, queued);
        Ok(FeedState::Feeding { frames })
    }

    pub fn target_queue_bytes(&self) -> usize {
        self.target_queue_bytes
    }

    pub fn wave(&self) -> &SquareWave {
        &self.wave
    }

    pub fn wave_mut(&mut self) -> &mut SquareWave {
        &mut self.wave
    }

    pub fn running_sample_index(&self) -> u32 {
        self.wave.running_sample_index()
    }
}
