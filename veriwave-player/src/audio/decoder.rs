//! Audio decoder using symphonia
//!
//! Decodes the entire recording up front into interleaved stereo f32. The
//! recordings under review are short (a spoken clip, not an album), so one
//! full decode keeps seeking trivial and gives the waveform its samples for
//! free.

use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Fully decoded recording, normalized to interleaved stereo f32
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// All decoded audio is carried as stereo
    pub const CHANNELS: u16 = 2;

    pub fn frames(&self) -> usize {
        self.samples.len() / Self::CHANNELS as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Decode an entire audio file to PCM.
pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    debug!("decoding {}", path.display());

    let file = std::fs::File::open(path)
        .map_err(|e| Error::Decode(format!("failed to open {}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("failed to probe format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("no audio track found".to_string()))?;
    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("sample rate not found".to_string()))?;
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .ok_or_else(|| Error::Decode("channel count not found".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("failed to create decoder: {}", e)))?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                warn!("error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if sample_buf.is_none() {
                    let spec = *decoded.spec();
                    sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
            }
            Err(e) => {
                warn!("decode error: {}", e);
                continue;
            }
        }
    }

    if samples.is_empty() {
        return Err(Error::Decode(format!(
            "no audio frames decoded from {}",
            path.display()
        )));
    }

    let samples = to_stereo(samples, channels);
    let decoded = DecodedAudio {
        samples,
        sample_rate,
    };
    debug!(
        "decoded {} frames ({:.2}s at {}Hz, {} source channels)",
        decoded.frames(),
        decoded.duration_secs(),
        sample_rate,
        channels
    );
    Ok(decoded)
}

/// Normalize interleaved samples of any channel count to stereo.
///
/// Mono is duplicated; anything above stereo keeps its first two channels.
fn to_stereo(samples: Vec<f32>, channels: u16) -> Vec<f32> {
    match channels {
        2 => samples,
        1 => {
            let mut stereo = Vec::with_capacity(samples.len() * 2);
            for s in samples {
                stereo.push(s);
                stereo.push(s);
            }
            stereo
        }
        n => {
            let n = n as usize;
            let mut stereo = Vec::with_capacity(samples.len() / n * 2);
            for frame in samples.chunks_exact(n) {
                stereo.push(frame[0]);
                stereo.push(frame[1]);
            }
            stereo
        }
    }
}
