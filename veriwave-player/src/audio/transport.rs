//! Real transport backed by decoded PCM and a cpal output stream
//!
//! One `AudioTransport` is opened per recording and shared by every logical
//! unit in the session. The transport knows nothing about windows or
//! activation; it is just the physical head.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::audio::decoder::{self, DecodedAudio};
use crate::audio::output::{self, OutputStream, Playhead};
use crate::audio::resample;
use crate::error::Result;
use crate::playback::transport::Transport;

/// Opened recording: the transport plus the decoded samples for the
/// waveform presenter
pub struct OpenedMedia {
    pub transport: Arc<AudioTransport>,
    pub samples: Arc<Vec<f32>>,
    pub channels: u16,
}

/// Shared physical playback resource
pub struct AudioTransport {
    playhead: Arc<Playhead>,
    duration_secs: f64,
    _output: OutputStream,
}

impl AudioTransport {
    /// Decode `path`, match it to the output device rate and start the
    /// (initially paused) output stream.
    pub fn open(path: &Path) -> Result<OpenedMedia> {
        let decoded = decoder::decode_file(path)?;
        let duration_secs = decoded.duration_secs();

        let device_rate = output::probe_output_rate()?;
        let samples = if device_rate != decoded.sample_rate {
            resample::to_device_rate(
                &decoded.samples,
                decoded.sample_rate,
                device_rate,
                DecodedAudio::CHANNELS,
            )?
        } else {
            decoded.samples
        };
        let samples = Arc::new(samples);

        let total_frames = (samples.len() / DecodedAudio::CHANNELS as usize) as u64;
        let playhead = Arc::new(Playhead::new(total_frames, device_rate));
        let output = OutputStream::spawn(samples.clone(), playhead.clone())?;

        info!(
            media = %path.display(),
            duration_secs,
            device_rate,
            "transport opened"
        );

        Ok(OpenedMedia {
            transport: Arc::new(Self {
                playhead,
                duration_secs,
                _output: output,
            }),
            samples,
            channels: DecodedAudio::CHANNELS,
        })
    }
}

impl Transport for AudioTransport {
    fn duration(&self) -> Option<f64> {
        Some(self.duration_secs)
    }

    fn position(&self) -> f64 {
        self.playhead.position_secs()
    }

    fn seek(&self, secs: f64) {
        self.playhead.seek_secs(secs);
    }

    fn play(&self) -> Result<()> {
        self.playhead.play()
    }

    fn pause(&self) {
        self.playhead.pause();
    }

    fn is_playing(&self) -> bool {
        self.playhead.is_playing()
    }

    fn has_ended(&self) -> bool {
        self.playhead.has_ended()
    }
}
