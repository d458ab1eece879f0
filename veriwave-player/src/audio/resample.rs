//! Offline resampling using rubato
//!
//! The decoded recording is converted once to the output device rate before
//! playback starts, so the audio callback never resamples.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::debug;

use crate::error::{Error, Result};

/// Resample interleaved audio to the device rate.
///
/// Returns the input untouched when the rates already match.
pub fn to_device_rate(
    input: &[f32],
    input_rate: u32,
    output_rate: u32,
    channels: u16,
) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        return Ok(input.to_vec());
    }

    debug!(
        "resampling from {}Hz to {}Hz ({} channels)",
        input_rate, output_rate, channels
    );

    let planar_input = deinterleave(input, channels);
    let input_frames = planar_input[0].len();
    if input_frames == 0 {
        return Ok(Vec::new());
    }

    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input_frames,
        channels as usize,
    )
    .map_err(|e| Error::Decode(format!("failed to create resampler: {}", e)))?;

    let planar_output = resampler
        .process(&planar_input, None)
        .map_err(|e| Error::Decode(format!("resampling failed: {}", e)))?;

    Ok(interleave(&planar_output))
}

fn deinterleave(input: &[f32], channels: u16) -> Vec<Vec<f32>> {
    let channels = channels as usize;
    let frames = input.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];

    for frame in input.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            planar[ch].push(sample);
        }
    }
    planar
}

fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let channels = planar.len();
    let frames = planar.first().map_or(0, |c| c.len());
    let mut interleaved = Vec::with_capacity(frames * channels);

    for frame in 0..frames {
        for chan in planar {
            interleaved.push(chan[frame]);
        }
    }
    interleaved
}
