use crate::error::ConfigError;

/// Naive (non band-limited) square wave addressed by a global sample index.
///
/// The value at index `i` is `+amplitude` when `(i / half_period_samples)` is even
/// and `-amplitude` otherwise. The running index wraps modulo 2^32.
#[derive(Debug, Clone)]
pub struct SquareWave {
    sample_rate: u32,
    tone_hz: u32,
    period_samples: u32,
    half_period_samples: u32,
    running_sample_index: u32,
    amplitude: i16,
}

impl SquareWave {
    pub fn new(sample_rate: u32, tone_hz: u32, amplitude: i16) -> Result<Self, ConfigError> {
        let (period_samples, half_period_samples) = Self::period_for(sample_rate, tone_hz)?;
        if amplitude < 0 {
            return Err(ConfigError::NegativeAmplitude(amplitude));
        }
        Ok(Self {
            sample_rate,
            tone_hz,
            period_samples,
            half_period_samples,
            running_sample_index: 0,
            amplitude,
        })
    }

    fn period_for(sample_rate: u32, tone_hz: u32) -> Result<(u32, u32), ConfigError> {
        if sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if tone_hz == 0 {
            return Err(ConfigError::ZeroTone);
        }
        let period = sample_rate / tone_hz;
        let half = period / 2;
        if half == 0 {
            return Err(ConfigError::ToneAboveNyquist { tone_hz, sample_rate });
        }
        Ok((period, half))
    }

    /// Sample value at a global index. Pure; does not touch the running index.
    pub fn sample_at(&self, index: u32) -> i16 {
        if (index / self.half_period_samples) % 2 == 0 {
            self.amplitude
        } else {
            self.amplitude.saturating_neg()
        }
    }

    /// Emit the sample at the running index, then advance it by one.
    pub fn next_sample(&mut self) -> i16 {
        let value = self.sample_at(self.running_sample_index);
        self.running_sample_index = self.running_sample_index.wrapping_add(1);
        value
    }

    /// Retune without resetting the running index.
    pub fn set_tone(&mut self, tone_hz: u32) -> Result<(), ConfigError> {
        let (period, half) = Self::period_for(self.sample_rate, tone_hz)?;
        self.tone_hz = tone_hz;
        self.period_samples = period;
        self.half_period_samples = half;
        Ok(())
    }

    pub fn set_amplitude(&mut self, amplitude: i16) {
        self.amplitude = amplitude.max(0);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn tone_hz(&self) -> u32 {
        self.tone_hz
    }

    pub fn period_samples(&self) -> u32 {
        self.period_samples
    }

    pub fn half_period_samples(&self) -> u32 {
        self.half_period_samples
    }

    pub fn amplitude(&self) -> i16 {
        self.amplitude
    }

    pub fn running_sample_index(&self) -> u32 {
        self.running_sample_index
    }

    /// Start emitting from an arbitrary index.
    pub fn seek(&mut self, index: u32) {
        self.running_sample_index = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_at_default_settings() {
        let wave = SquareWave::new(48000, 256, 3000).unwrap();
        assert_eq!(wave.period_samples(), 187);
        assert_eq!(wave.half_period_samples(), 93);
    }

    #[test]
    fn test_half_period_boundary() {
        let wave = SquareWave::new(48000, 256, 3000).unwrap();

        for i in 0..=92 {
            assert_eq!(wave.sample_at(i), 3000, "index {}", i);
        }
        for i in 93..=185 {
            assert_eq!(wave.sample_at(i), -3000, "index {}", i);
        }
        // The period is odd, so 186 starts the next high half
        assert_eq!(wave.sample_at(186), 3000);
    }

    #[test]
    fn test_next_sample_wraps() {
        let mut wave = SquareWave::new(48000, 256, 3000).unwrap();
        wave.seek(u32::MAX);

        let expected = wave.sample_at(u32::MAX);
        assert_eq!(wave.next_sample(), expected);
        assert_eq!(wave.running_sample_index(), 0);
    }

    #[test]
    fn test_rejects_tone_above_nyquist() {
        assert_eq!(
            SquareWave::new(48000, 30000, 3000).unwrap_err(),
            ConfigError::ToneAboveNyquist { tone_hz: 30000, sample_rate: 48000 }
        );
        assert_eq!(SquareWave::new(0, 256, 3000).unwrap_err(), ConfigError::ZeroSampleRate);
        assert_eq!(SquareWave::new(48000, 0, 3000).unwrap_err(), ConfigError::ZeroTone);
    }

    #[test]
    fn test_set_tone_keeps_index() {
        let mut wave = SquareWave::new(48000, 256, 3000).unwrap();
        for _ in 0..500 {
            wave.next_sample();
        }

        wave.set_tone(440).unwrap();
        assert_eq!(wave.running_sample_index(), 500);
        assert_eq!(wave.period_samples(), 109);
        assert_eq!(wave.half_period_samples(), 54);

        assert!(wave.set_tone(0).is_err());
        assert_eq!(wave.tone_hz(), 440);
    }
}
