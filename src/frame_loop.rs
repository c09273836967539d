//! Variable-rate frame loop driving the feeder
//!
//! One iteration: apply the input actions gathered this frame, top up the audio
//! queue, then hand a report to whatever redraws the screen.

use std::time::{Duration, Instant};

use crate::error::AudioError;
use crate::feeder::{AudioFeeder, FeedState};
use crate::platform::AudioDevice;

/// Equal-tempered semitone ratio, 2^(1/12).
pub const SEMITONE_RATIO: f64 = 1.059_463_094_359_295_3;

pub const AMPLITUDE_STEP: i16 = 500;

/// Frame pacing
pub struct FrameClock {
    frame_duration: Duration,
    max_delta: Duration,
    last_frame: Option<Instant>,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self {
            frame_duration: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            max_delta: Duration::from_millis(100),
            last_frame: None,
        }
    }

    /// Mark the start of a frame and return the time since the previous one,
    /// clamped to `max_delta`. The first frame reports one nominal frame.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = match self.last_frame {
            Some(last) => (now - last).min(self.max_delta),
            None => self.frame_duration,
        };
        self.last_frame = Some(now);
        delta
    }

    /// Time left before the current frame's budget is spent.
    pub fn remaining(&self) -> Duration {
        match self.last_frame {
            Some(last) => self.frame_duration.saturating_sub(last.elapsed()),
            None => self.frame_duration,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }
}

/// User intents the loop understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToneUp,
    ToneDown,
    Louder,
    Softer,
    TogglePause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub feed: FeedState,
    pub queued_bytes: usize,
    pub running_sample_index: u32,
}

pub struct FrameLoop<D: AudioDevice> {
    device: D,
    feeder: AudioFeeder,
    running: bool,
    paused: bool,
}

impl<D: AudioDevice> FrameLoop<D> {
    pub fn new(device: D, feeder: AudioFeeder) -> Self {
        Self {
            device,
            feeder,
            running: true,
            paused: false,
        }
    }

    pub fn apply(&mut self, action: Action) -> Result<(), AudioError> {
        match action {
            Action::Quit => self.running = false,
            Action::ToneUp => self.retune(SEMITONE_RATIO),
            Action::ToneDown => self.retune(1.0 / SEMITONE_RATIO),
            Action::Louder => {
                let wave = self.feeder.wave_mut();
                wave.set_amplitude(wave.amplitude().saturating_add(AMPLITUDE_STEP));
            }
            Action::Softer => {
                let wave = self.feeder.wave_mut();
                wave.set_amplitude(wave.amplitude().saturating_sub(AMPLITUDE_STEP));
            }
            Action::TogglePause => {
                // Flag follows the device, so a failed toggle leaves both unchanged
                let paused = !self.paused;
                self.device.set_playing(!paused)?;
                self.paused = paused;
                log::info!("Audio {}", if self.paused { "paused" } else { "resumed" });
            }
        }
        Ok(())
    }

    fn retune(&mut self, ratio: f64) {
        let wave = self.feeder.wave_mut();
        let current = wave.tone_hz();
        let mut next = (current as f64 * ratio).round() as u32;
        // Low tones round back onto themselves
        if next == current {
            next = if ratio > 1.0 { current + 1 } else { current.saturating_sub(1) };
        }
        match wave.set_tone(next) {
            Ok(()) => log::info!("Tone {} Hz -> {} Hz", current, next),
            Err(err) => log::warn!("Tone unchanged: {}", err),
        }
    }

    /// Run one iteration. Paused loops skip synthesis entirely.
    pub fn frame(&mut self) -> Result<FrameReport, AudioError> {
        let feed = if self.paused {
            FeedState::Idle
        } else {
            self.feeder.tick(&mut self.device)?
        };
        Ok(FrameReport {
            feed,
            queued_bytes: self.device.queued_bytes(),
            running_sample_index: self.feeder.running_sample_index(),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn feeder(&self) -> &AudioFeeder {
        &self.feeder
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Stop feeding and release the device.
    pub fn shutdown(mut self) -> Result<D, AudioError> {
        self.device.close()?;
        Ok(self.device)
    }
}
