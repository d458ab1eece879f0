//! Audio output using cpal
//!
//! The output stream lives on a dedicated thread (cpal streams are not
//! `Send`), rendering directly from the shared decoded buffer through an
//! atomic playhead. Play/pause/seek are plain atomic flag flips observed by
//! the callback, so no commands cross the real-time boundary.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Shared playback head over the decoded buffer
pub struct Playhead {
    /// Cursor in frames into the decoded buffer
    cursor: AtomicU64,
    playing: AtomicBool,
    ended: AtomicBool,
    /// Set by the stream error callback; playback cannot be (re)started
    failed: AtomicBool,
    total_frames: u64,
    sample_rate: u32,
}

impl Playhead {
    pub fn new(total_frames: u64, sample_rate: u32) -> Self {
        Self {
            cursor: AtomicU64::new(0),
            playing: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            total_frames,
            sample_rate,
        }
    }

    pub fn position_secs(&self) -> f64 {
        self.cursor.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }

    pub fn seek_secs(&self, secs: f64) {
        let frame = (secs.max(0.0) * self.sample_rate as f64) as u64;
        self.cursor
            .store(frame.min(self.total_frames), Ordering::Relaxed);
        self.ended.store(false, Ordering::Relaxed);
    }

    pub fn play(&self) -> Result<()> {
        if self.failed.load(Ordering::Relaxed) {
            return Err(Error::AudioOutput(
                "output stream is in a failed state".to_string(),
            ));
        }
        self.playing.store(true, Ordering::Relaxed);
        Ok(())
    }

    pub fn pause(&self) {
        self.playing.store(false, Ordering::Relaxed);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    pub fn has_ended(&self) -> bool {
        self.ended.load(Ordering::Relaxed)
    }

    fn mark_failed(&self) {
        self.failed.store(true, Ordering::Relaxed);
        self.playing.store(false, Ordering::Relaxed);
    }
}

/// Sample rate the default output device wants
pub fn probe_output_rate() -> Result<u32> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::AudioOutput("no default output device found".to_string()))?;
    let config = device
        .default_output_config()
        .map_err(|e| Error::AudioOutput(format!("failed to get device config: {}", e)))?;
    Ok(config.sample_rate().0)
}

/// Running output stream on its own thread.
///
/// Dropping the handle shuts the thread (and the stream) down.
pub struct OutputStream {
    shutdown_tx: Option<mpsc::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl OutputStream {
    /// Start rendering `samples` (interleaved stereo at the device rate)
    /// under control of `playhead`.
    pub fn spawn(samples: Arc<Vec<f32>>, playhead: Arc<Playhead>) -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("veriwave-audio".to_string())
            .spawn(move || {
                let stream = match build_stream(samples, playhead) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(Error::AudioOutput(format!(
                        "failed to start stream: {}",
                        e
                    ))));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                // Hold the stream alive until shutdown
                let _ = shutdown_rx.recv();
                debug!("audio output thread exiting");
            })
            .map_err(|e| Error::Internal(format!("failed to spawn audio thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("audio output stream started");
                Ok(Self {
                    shutdown_tx: Some(shutdown_tx),
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::AudioOutput(
                "audio output thread died during startup".to_string(),
            )),
        }
    }
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        self.shutdown_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn build_stream(samples: Arc<Vec<f32>>, playhead: Arc<Playhead>) -> Result<Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::AudioOutput("no default output device found".to_string()))?;

    let supported = device
        .default_output_config()
        .map_err(|e| Error::AudioOutput(format!("failed to get device config: {}", e)))?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.config();
    let channels = config.channels as usize;

    debug!(
        "audio config: sample_rate={}, channels={}, format={:?}",
        config.sample_rate.0, channels, sample_format
    );

    let err_playhead = playhead.clone();
    let err_fn = move |err| {
        warn!("audio stream error: {}", err);
        err_playhead.mark_failed();
    };

    let stream = match sample_format {
        SampleFormat::F32 => device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _| fill_output(data, channels, &samples, &playhead),
                err_fn,
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("failed to build stream: {}", e)))?,
        SampleFormat::I16 => device
            .build_output_stream(
                &config,
                move |data: &mut [i16], _| {
                    let mut scratch = vec![0.0_f32; data.len()];
                    fill_output(&mut scratch, channels, &samples, &playhead);
                    for (out, s) in data.iter_mut().zip(scratch.iter()) {
                        *out = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("failed to build stream: {}", e)))?,
        other => {
            return Err(Error::AudioOutput(format!(
                "unsupported sample format: {:?}",
                other
            )));
        }
    };

    Ok(stream)
}

/// Render one callback's worth of frames from the shared buffer.
///
/// Outputs silence while paused; at the end of the buffer flips the ended
/// flag and stops. Runs on the real-time audio thread.
fn fill_output(data: &mut [f32], out_channels: usize, samples: &[f32], playhead: &Playhead) {
    if !playhead.playing.load(Ordering::Relaxed) {
        data.fill(0.0);
        return;
    }

    let mut cursor = playhead.cursor.load(Ordering::Relaxed);
    for frame in data.chunks_mut(out_channels) {
        if cursor >= playhead.total_frames {
            playhead.playing.store(false, Ordering::Relaxed);
            playhead.ended.store(true, Ordering::Relaxed);
            frame.fill(0.0);
            continue;
        }

        let left = samples[cursor as usize * 2];
        let right = samples[cursor as usize * 2 + 1];
        match out_channels {
            1 => frame[0] = (left + right) * 0.5,
            _ => {
                frame[0] = left;
                frame[1] = right;
                for extra in frame.iter_mut().skip(2) {
                    *extra = 0.0;
                }
            }
        }
        cursor += 1;
    }
    playhead.cursor.store(cursor, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playhead_seek_clamps() {
        let playhead = Playhead::new(48000, 48000);
        playhead.seek_secs(0.5);
        assert_eq!(playhead.position_secs(), 0.5);

        playhead.seek_secs(10.0);
        assert_eq!(playhead.position_secs(), 1.0);

        playhead.seek_secs(-1.0);
        assert_eq!(playhead.position_secs(), 0.0);
    }

    #[test]
    fn test_playhead_failed_rejects_play() {
        let playhead = Playhead::new(48000, 48000);
        playhead.mark_failed();
        assert!(playhead.play().is_err());
        assert!(!playhead.is_playing());
    }

    #[test]
    fn test_fill_silence_while_paused() {
        let playhead = Playhead::new(4, 48000);
        let samples = vec![0.5; 8];
        let mut data = vec![1.0; 8];

        fill_output(&mut data, 2, &samples, &playhead);
        assert!(data.iter().all(|&s| s == 0.0));
        assert_eq!(playhead.position_secs(), 0.0);
    }

    #[test]
    fn test_fill_advances_cursor() {
        let playhead = Playhead::new(4, 48000);
        playhead.play().unwrap();
        let samples = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];
        let mut data = vec![0.0; 4];

        fill_output(&mut data, 2, &samples, &playhead);
        assert_eq!(data, vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(playhead.cursor.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_fill_ends_at_buffer_end() {
        let playhead = Playhead::new(2, 48000);
        playhead.play().unwrap();
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        let mut data = vec![9.0; 8];

        fill_output(&mut data, 2, &samples, &playhead);
        assert_eq!(&data[..4], &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(&data[4..], &[0.0, 0.0, 0.0, 0.0]);
        assert!(playhead.has_ended());
        assert!(!playhead.is_playing());
    }

    #[test]
    fn test_fill_downmixes_to_mono() {
        let playhead = Playhead::new(2, 48000);
        playhead.play().unwrap();
        let samples = vec![0.2, 0.4, 0.6, 0.8];
        let mut data = vec![0.0; 2];

        fill_output(&mut data, 1, &samples, &playhead);
        assert!((data[0] - 0.3).abs() < 1e-6);
        assert!((data[1] - 0.7).abs() < 1e-6);
    }
}
