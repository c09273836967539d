//! Owned interleaved sample buffers handed from the feeder to a device

use crate::error::AudioError;

/// Bytes per sample of the signed 16-bit layout the feeder writes.
pub const BYTES_PER_SAMPLE: usize = std::mem::size_of::<i16>();

/// Interleaved signed 16-bit samples for a whole number of frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: Vec<i16>,
    channels: u16,
}

impl SampleBuffer {
    /// An empty buffer for the given channel count.
    pub fn empty(channels: u16) -> Self {
        Self {
            samples: Vec::new(),
            channels,
        }
    }

    /// Allocate room for exactly `frames` frames, reporting allocation failure
    /// instead of aborting.
    pub fn with_frames(frames: usize, channels: u16) -> Result<Self, AudioError> {
        let len = frames * channels as usize;
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(len)
            .map_err(|_| AudioError::Allocation {
                bytes: len * BYTES_PER_SAMPLE,
            })?;
        samples.resize(len, 0);
        Ok(Self { samples, channels })
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn byte_len(&self) -> usize {
        self.samples.len() * BYTES_PER_SAMPLE
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Mutable view split into frames of `channels` samples each.
    pub fn frames_mut(&mut self) -> std::slice::ChunksExactMut<'_, i16> {
        self.samples.chunks_exact_mut(self.channels.max(1) as usize)
    }

    /// Little-endian byte image, the layout a 16-bit LSB device queue expects.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}

/// Channel count for a frame size in bytes.
pub fn channels_for_frame_bytes(bytes_per_frame: usize) -> Result<u16, AudioError> {
    if bytes_per_frame == 0 || bytes_per_frame % BYTES_PER_SAMPLE != 0 {
        return Err(AudioError::Layout(format!(
            "{} bytes per frame is not a whole number of 16-bit samples",
            bytes_per_frame
        )));
    }
    u16::try_from(bytes_per_frame / BYTES_PER_SAMPLE)
        .map_err(|_| AudioError::Layout(format!("{} bytes per frame is too large", bytes_per_frame)))
}
