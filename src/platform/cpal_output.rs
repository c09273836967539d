use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    BufferSize, Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig,
    SupportedBufferSize, SupportedStreamConfig, SupportedStreamConfigRange,
};
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{AudioDevice, DeviceSpec};
use crate::buffer::{SampleBuffer, BYTES_PER_SAMPLE};
use crate::error::AudioError;

/// cpal output stream fed from a lock-free sample queue.
///
/// `enqueue` pushes into the producer side on the main thread and the cpal
/// callback pops from the consumer side, filling any shortfall with silence.
/// The queue always holds interleaved i16 frames whatever format the device
/// runs in; F32 and U16 devices get converted copies in the callback.
pub struct CpalQueueDevice {
    stream: Option<Stream>,
    producer: HeapProd<i16>,
    spec: DeviceSpec,
    is_playing: bool,
    underrun_samples: Arc<AtomicU64>,
}

/// Pick a supported config matching the requested rate and channel count.
/// Native 16-bit output is preferred over formats that need conversion.
fn negotiate<I>(candidates: I, spec: &DeviceSpec) -> Result<SupportedStreamConfig, AudioError>
where
    I: IntoIterator<Item = SupportedStreamConfigRange>,
{
    let rate = cpal::SampleRate(spec.sample_rate);
    candidates
        .into_iter()
        .filter(|range| range.channels() == spec.channels)
        .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
        .filter_map(|range| format_rank(range.sample_format()).map(|rank| (rank, range)))
        .max_by_key(|(rank, _)| *rank)
        .map(|(_, range)| range.with_sample_rate(rate))
        .ok_or(AudioError::FormatMismatch {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
}

fn stream_config(supported: &SupportedStreamConfig, spec: &DeviceSpec) -> StreamConfig {
    let buffer_size = match supported.buffer_size() {
        SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&spec.buffer_size_hint) => {
            BufferSize::Fixed(spec.buffer_size_hint)
        }
        _ => BufferSize::Default,
    };
    StreamConfig {
        channels: spec.channels,
        sample_rate: supported.sample_rate(),
        buffer_size,
    }
}

/// Samples of a `len`-sample buffer that fit in `vacant` slots, cut to whole frames.
fn whole_frames_fitting(len: usize, vacant: usize, channels: usize) -> usize {
    len.min(vacant / channels * channels)
}

impl CpalQueueDevice {
    /// Create a typed stream for the given sample format
    fn make_stream<T>(
        device: &Device,
        config: &StreamConfig,
        mut consumer: HeapCons<i16>,
        underrun_samples: Arc<AtomicU64>,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<i16>,
    {
        let mut scratch: Vec<i16> = vec![0; 4096];

        let stream = device
            .build_output_stream(
                config,
                move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
                    if scratch.len() < output.len() {
                        scratch.resize(output.len(), 0);
                    }
                    let popped = consumer.pop_slice(&mut scratch[..output.len()]);
                    for (out, &sample) in output.iter_mut().zip(&scratch[..popped]) {
                        *out = T::from_sample(sample);
                    }
                    if popped < output.len() {
                        output[popped..].fill(T::EQUILIBRIUM);
                        underrun_samples.fetch_add((output.len() - popped) as u64, Ordering::Relaxed);
                    }
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::Open(e.to_string()))?;

        Ok(stream)
    }

    /// Samples the callback had to fill with silence so far.
    pub fn underrun_samples(&self) -> u64 {
        self.underrun_samples.load(Ordering::Relaxed)
    }
}

/// Preference order of device formats; `None` means unusable.
fn format_rank(format: SampleFormat) -> Option<u8> {
    match format {
        SampleFormat::I16 => Some(3),
        SampleFormat::F32 => Some(2),
        SampleFormat::U16 => Some(1),
        _ => None,
    }
}

impl AudioDevice for CpalQueueDevice {
    fn open(spec: DeviceSpec) -> Result<Self, AudioError> {
        spec.validate()?;

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        log::info!(
            "Output device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let candidates = device
            .supported_output_configs()
            .map_err(|e| AudioError::Open(e.to_string()))?;
        let supported = negotiate(candidates, &spec)?;
        let config = stream_config(&supported, &spec);
        let sample_format = supported.sample_format();
        log::info!("Negotiated output config: {:?} ({:?})", config, sample_format);

        let one_second = spec.sample_rate as usize * spec.channels as usize;
        let hint = spec.buffer_size_hint as usize * spec.channels as usize * 2;
        let ring = HeapRb::<i16>::new(one_second.max(hint));
        log::info!("Queue capacity: {} bytes", ring.capacity().get() * BYTES_PER_SAMPLE);
        let (producer, consumer) = ring.split();

        let underrun_samples = Arc::new(AtomicU64::new(0));
        let counter = underrun_samples.clone();
        let stream = match sample_format {
            SampleFormat::I16 => Self::make_stream::<i16>(&device, &config, consumer, counter)?,
            SampleFormat::F32 => Self::make_stream::<f32>(&device, &config, consumer, counter)?,
            SampleFormat::U16 => Self::make_stream::<u16>(&device, &config, consumer, counter)?,
            _ => {
                return Err(AudioError::FormatMismatch {
                    sample_rate: spec.sample_rate,
                    channels: spec.channels,
                })
            }
        };

        // Some hosts start streams on creation; playback begins on the first enqueue.
        if let Err(err) = stream.pause() {
            log::warn!("Could not pause new stream: {}", err);
        }

        Ok(Self {
            stream: Some(stream),
            producer,
            spec,
            is_playing: false,
            underrun_samples,
        })
    }

    fn spec(&self) -> &DeviceSpec {
        &self.spec
    }

    fn queued_bytes(&self) -> usize {
        self.producer.occupied_len() * BYTES_PER_SAMPLE
    }

    fn enqueue(&mut self, buffer: &SampleBuffer) -> Result<(), AudioError> {
        if self.stream.is_none() {
            return Err(AudioError::Closed);
        }
        self.spec.check_buffer(buffer)?;
        // A partial frame would shift every later frame by a channel
        let samples = buffer.samples();
        let fitting = whole_frames_fitting(
            samples.len(),
            self.producer.vacant_len(),
            self.spec.channels as usize,
        );
        let pushed = self.producer.push_slice(&samples[..fitting]);
        if pushed < samples.len() {
            log::warn!(
                "Audio queue overflow: dropped {} frames",
                (samples.len() - pushed) / self.spec.channels as usize
            );
        }
        Ok(())
    }

    fn set_playing(&mut self, playing: bool) -> Result<(), AudioError> {
        let stream = self.stream.as_ref().ok_or(AudioError::Closed)?;
        if playing {
            stream.play().map_err(|e| AudioError::Stream(e.to_string()))?;
            log::info!("Audio stream started at sample rate: {}", self.spec.sample_rate);
        } else {
            stream.pause().map_err(|e| AudioError::Stream(e.to_string()))?;
            log::info!("Audio stream paused");
        }
        self.is_playing = playing;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.is_playing
    }

    fn close(&mut self) -> Result<(), AudioError> {
        let stream = self.stream.take().ok_or(AudioError::Closed)?;
        if self.is_playing {
            // Dropping the stream stops it regardless; a failed pause is not worth failing close over.
            if let Err(err) = stream.pause() {
                log::debug!("Pause before close failed: {}", err);
            }
        }
        self.is_playing = false;
        drop(stream);
        log::info!("Audio device closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::SampleRate;

    fn spec() -> DeviceSpec {
        DeviceSpec {
            sample_rate: 48000,
            channels: 2,
            bits_per_sample: 16,
            buffer_size_hint: 800,
        }
    }

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Range { min: 64, max: 4096 },
            format,
        )
    }

    #[test]
    fn test_negotiate_rejects_mismatched_layouts() {
        let candidates = vec![
            range(1, 8000, 96000, SampleFormat::I16),
            range(2, 8000, 44100, SampleFormat::I16),
            range(2, 8000, 96000, SampleFormat::I32),
        ];
        match negotiate(candidates, &spec()) {
            Err(AudioError::FormatMismatch {
                sample_rate,
                channels,
            }) => {
                assert_eq!(sample_rate, 48000);
                assert_eq!(channels, 2);
            }
            other => panic!("expected FormatMismatch, got {:?}", other.map(|c| c.sample_format())),
        }
    }

    #[test]
    fn test_negotiate_rejects_empty_device() {
        let result = negotiate(Vec::new(), &spec());
        assert!(matches!(result, Err(AudioError::FormatMismatch { .. })));
    }

    #[test]
    fn test_negotiate_prefers_i16_then_f32_then_u16() {
        let all = vec![
            range(2, 8000, 96000, SampleFormat::U16),
            range(2, 8000, 96000, SampleFormat::I16),
            range(2, 8000, 96000, SampleFormat::F32),
        ];
        let chosen = negotiate(all, &spec()).unwrap();
        assert_eq!(chosen.sample_format(), SampleFormat::I16);
        assert_eq!(chosen.sample_rate(), SampleRate(48000));
        assert_eq!(chosen.channels(), 2);

        let no_i16 = vec![
            range(2, 8000, 96000, SampleFormat::U16),
            range(2, 8000, 96000, SampleFormat::F32),
        ];
        assert_eq!(negotiate(no_i16, &spec()).unwrap().sample_format(), SampleFormat::F32);

        let only_u16 = vec![
            range(2, 8000, 96000, SampleFormat::U16),
            range(2, 8000, 96000, SampleFormat::I8),
        ];
        assert_eq!(negotiate(only_u16, &spec()).unwrap().sample_format(), SampleFormat::U16);
    }

    #[test]
    fn test_stream_config_uses_hint_inside_range() {
        let supported = SupportedStreamConfig::new(
            2,
            SampleRate(48000),
            SupportedBufferSize::Range { min: 64, max: 4096 },
            SampleFormat::I16,
        );
        let config = stream_config(&supported, &spec());
        assert_eq!(config.buffer_size, BufferSize::Fixed(800));
        assert_eq!(config.channels, 2);
        assert_eq!(config.sample_rate, SampleRate(48000));
    }

    #[test]
    fn test_stream_config_falls_back_to_default() {
        let narrow = SupportedStreamConfig::new(
            2,
            SampleRate(48000),
            SupportedBufferSize::Range { min: 64, max: 512 },
            SampleFormat::I16,
        );
        assert_eq!(stream_config(&narrow, &spec()).buffer_size, BufferSize::Default);

        let unknown = SupportedStreamConfig::new(
            2,
            SampleRate(48000),
            SupportedBufferSize::Unknown,
            SampleFormat::F32,
        );
        assert_eq!(stream_config(&unknown, &spec()).buffer_size, BufferSize::Default);
    }

    #[test]
    fn test_whole_frames_fitting() {
        // Odd vacancy on a stereo queue rounds down to a whole frame
        assert_eq!(whole_frames_fitting(10, 7, 2), 6);
        assert_eq!(whole_frames_fitting(10, 100, 2), 10);
        assert_eq!(whole_frames_fitting(10, 1, 2), 0);
        assert_eq!(whole_frames_fitting(9, 8, 3), 6);
    }
}
