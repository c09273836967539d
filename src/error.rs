//! Error types for the feeder, its devices and configuration

use thiserror::Error;

/// Failures raised by audio devices and the feed path.
///
/// None of these are retryable: callers abort the audio subsystem on any of them.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Default output device is not available")]
    NoDevice,

    #[error("Failed to open audio device: {0}")]
    Open(String),

    /// The device could not grant the sample layout the synthesis assumes.
    #[error("Device cannot provide {channels} channel(s) at {sample_rate} Hz in a supported sample format")]
    FormatMismatch { sample_rate: u32, channels: u16 },

    #[error("Unsupported sample layout: {0}")]
    Layout(String),

    #[error("Failed to allocate {bytes} bytes for the synthesis buffer")]
    Allocation { bytes: usize },

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Audio device is closed")]
    Closed,
}

/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Sample rate must be greater than zero")]
    ZeroSampleRate,

    #[error("Tone frequency must be greater than zero")]
    ZeroTone,

    #[error("Tone of {tone_hz} Hz is above the Nyquist limit for {sample_rate} Hz")]
    ToneAboveNyquist { tone_hz: u32, sample_rate: u32 },

    #[error("Amplitude must be non-negative, got {0}")]
    NegativeAmplitude(i16),

    #[error("Latency divisor must be between 1 and the sample rate, got {0}")]
    LatencyDivisor(u32),

    #[error("Channel count must be between 1 and 8, got {0}")]
    Channels(u16),

    #[error("Frames per second must be greater than zero")]
    ZeroFps,
}
