//! Decoder tests against generated WAV fixtures

use std::f32::consts::TAU;

use veriwave_player::audio::decoder::decode_file;

/// Write a mono 16-bit PCM sine wave fixture
fn write_sine_wav(path: &std::path::Path, sample_rate: u32, seconds: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();

    let frames = (sample_rate as f32 * seconds) as u32;
    for n in 0..frames {
        let t = n as f32 / sample_rate as f32;
        let sample = (t * 440.0 * TAU).sin() * 0.5;
        writer
            .write_sample((sample * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn decodes_wav_to_stereo_with_correct_duration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    write_sine_wav(&path, 44100, 1.0);

    let decoded = decode_file(&path).unwrap();

    assert_eq!(decoded.sample_rate, 44100);
    // Mono source is duplicated to stereo
    assert_eq!(decoded.frames(), 44100);
    assert!((decoded.duration_secs() - 1.0).abs() < 0.01);
    assert_eq!(decoded.samples.len(), decoded.frames() * 2);

    // Left and right carry the same signal
    assert_eq!(decoded.samples[100], decoded.samples[101]);
    // The tone actually has energy
    assert!(decoded.samples.iter().any(|s| s.abs() > 0.4));
}

#[test]
fn decode_rejects_non_audio_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not-audio.wav");
    std::fs::write(&path, b"definitely not a riff header").unwrap();

    assert!(decode_file(&path).is_err());
}
