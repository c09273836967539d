//! Offline render of the fed stream to WAV
//!
//! Runs the frame loop against a capturing simulated device at the configured
//! frame rate and writes what the device played, underrun silence included.

use std::path::Path;
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::config::ToneConfig;
use crate::frame_loop::FrameLoop;
use crate::platform::SimulatedDevice;

/// Longest render `render_wav` accepts.
pub const MAX_BOUNCE_SECONDS: f32 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BounceReport {
    pub frames_written: u64,
    pub underrun_frames: u64,
    pub enqueue_calls: usize,
}

/// Render `seconds` of output to `path` as 16-bit PCM.
pub fn render_wav(config: &ToneConfig, seconds: f32, path: &Path) -> anyhow::Result<BounceReport> {
    check_seconds(seconds)?;
    let feeder = config.build_feeder()?;
    let device = SimulatedDevice::with_capture(config.device_spec())?;
    let mut frame_loop = FrameLoop::new(device, feeder);

    let total_frames = (seconds as f64 * config.sample_rate as f64).round() as u64;
    let frame_duration = Duration::from_secs_f64(1.0 / config.fps as f64);

    while frame_loop.device().played_frames() < total_frames {
        frame_loop.frame()?;
        frame_loop.device_mut().advance(frame_duration);
    }

    let mut device = frame_loop.shutdown()?;
    let underrun_frames = device.underrun_frames();
    let enqueue_calls = device.enqueue_calls().len();
    let mut samples = device.take_captured();
    samples.truncate(total_frames as usize * config.channels as usize);

    let spec = WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in &samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    let frames_written = (samples.len() / config.channels as usize) as u64;
    log::info!(
        "Bounced {} frames to {} ({} enqueues, {} underrun frames)",
        frames_written,
        path.display(),
        enqueue_calls,
        underrun_frames
    );

    Ok(BounceReport {
        frames_written,
        underrun_frames,
        enqueue_calls,
    })
}

/// Accepts finite lengths in `0.0..=MAX_BOUNCE_SECONDS`.
pub fn check_seconds(seconds: f32) -> anyhow::Result<()> {
    if !seconds.is_finite() || !(0.0..=MAX_BOUNCE_SECONDS).contains(&seconds) {
        anyhow::bail!(
            "Render length must be between 0 and {} seconds, got {}",
            MAX_BOUNCE_SECONDS,
            seconds
        );
    }
    Ok(())
}
