//! Tone and queue configuration

use crate::buffer::BYTES_PER_SAMPLE;
use crate::error::ConfigError;
use crate::feeder::AudioFeeder;
use crate::gen::square_wave::SquareWave;
use crate::platform::DeviceSpec;

pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
pub const DEFAULT_TONE_HZ: u32 = 256;
pub const DEFAULT_AMPLITUDE: i16 = 3000;
/// Target queue depth is `1 / DEFAULT_LATENCY_DIVISOR` seconds of audio.
pub const DEFAULT_LATENCY_DIVISOR: u32 = 15;
pub const DEFAULT_CHANNELS: u16 = 2;
pub const DEFAULT_FPS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneConfig {
    pub sample_rate: u32,
    pub tone_hz: u32,
    pub amplitude: i16,
    pub latency_divisor: u32,
    pub channels: u16,
    pub fps: u32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            tone_hz: DEFAULT_TONE_HZ,
            amplitude: DEFAULT_AMPLITUDE,
            latency_divisor: DEFAULT_LATENCY_DIVISOR,
            channels: DEFAULT_CHANNELS,
            fps: DEFAULT_FPS,
        }
    }
}

impl ToneConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.tone_hz == 0 {
            return Err(ConfigError::ZeroTone);
        }
        if self.sample_rate / self.tone_hz / 2 == 0 {
            return Err(ConfigError::ToneAboveNyquist {
                tone_hz: self.tone_hz,
                sample_rate: self.sample_rate,
            });
        }
        if self.amplitude < 0 {
            return Err(ConfigError::NegativeAmplitude(self.amplitude));
        }
        if self.latency_divisor == 0 || self.latency_divisor > self.sample_rate {
            return Err(ConfigError::LatencyDivisor(self.latency_divisor));
        }
        if !(1..=8).contains(&self.channels) {
            return Err(ConfigError::Channels(self.channels));
        }
        if self.fps == 0 {
            return Err(ConfigError::ZeroFps);
        }
        Ok(())
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * BYTES_PER_SAMPLE
    }

    /// Frames the device queue should hold: `sample_rate / latency_divisor`.
    pub fn target_queue_frames(&self) -> usize {
        (self.sample_rate / self.latency_divisor.max(1)) as usize
    }

    pub fn target_queue_bytes(&self) -> usize {
        self.target_queue_frames() * self.bytes_per_frame()
    }

    /// Device period hint: one display frame of audio.
    pub fn buffer_size_hint(&self) -> u32 {
        (self.sample_rate / self.fps.max(1)).max(1)
    }

    pub fn device_spec(&self) -> DeviceSpec {
        DeviceSpec {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: (BYTES_PER_SAMPLE * 8) as u16,
            buffer_size_hint: self.buffer_size_hint(),
        }
    }

    pub fn square_wave(&self) -> Result<SquareWave, ConfigError> {
        SquareWave::new(self.sample_rate, self.tone_hz, self.amplitude)
    }

    /// Validate and build a feeder primed with this config's target depth.
    pub fn build_feeder(&self) -> Result<AudioFeeder, ConfigError> {
        self.validate()?;
        Ok(AudioFeeder::new(self.square_wave()?, self.target_queue_bytes()))
    }
}
