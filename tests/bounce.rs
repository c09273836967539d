// Integration tests for offline WAV rendering

#![cfg(feature = "bounce")]

use tonequeue::bounce::{render_wav, MAX_BOUNCE_SECONDS};
use tonequeue::config::ToneConfig;
use tonequeue::gen::SquareWave;

#[test]
fn test_bounce_writes_expected_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let config = ToneConfig::default();

    let report = render_wav(&config, 0.5, &path).unwrap();
    assert_eq!(report.frames_written, 24_000);
    assert_eq!(report.underrun_frames, 0);
    assert!(report.enqueue_calls > 1);

    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 48_000);
    assert_eq!(spec.bits_per_sample, 16);

    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), 48_000);

    let wave = SquareWave::new(48_000, 256, 3000).unwrap();
    for (i, frame) in samples.chunks_exact(2).enumerate().take(2000) {
        let expected = wave.sample_at(i as u32);
        assert_eq!(frame, &[expected, expected], "frame {}", i);
    }
}

#[test]
fn test_bounce_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.wav");
    let config = ToneConfig { tone_hz: 0, ..Default::default() };

    assert!(render_wav(&config, 0.1, &path).is_err());
    assert!(!path.exists());
}

#[test]
fn test_bounce_rejects_unbounded_lengths() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.wav");
    let config = ToneConfig::default();

    for seconds in [f32::INFINITY, f32::NAN, -1.0, MAX_BOUNCE_SECONDS + 1.0] {
        assert!(render_wav(&config, seconds, &path).is_err(), "{} seconds", seconds);
        assert!(!path.exists());
    }
}

#[test]
fn test_bounce_zero_seconds_writes_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.wav");

    let report = render_wav(&ToneConfig::default(), 0.0, &path).unwrap();
    assert_eq!(report.frames_written, 0);
    assert_eq!(hound::WavReader::open(&path).unwrap().len(), 0);
}
