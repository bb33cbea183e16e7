//! Audio playback through rodio.
//!
//! The output stream is not `Send`, so one dedicated thread owns it for
//! the process lifetime and everyone else talks to it through a small
//! channel. Playback is serialized: a new utterance first fades out and
//! stops whatever is still audible, and only then starts. Two
//! utterances are never audible at once.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

const FADE_OUT: Duration = Duration::from_millis(1000);
const FADE_STEPS: u32 = 20;
const QUEUE_DEPTH: usize = 4;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("no audio output device: {0}")]
    NoOutput(String),
    #[error("audio file could not be opened: {0}")]
    Io(#[from] std::io::Error),
    #[error("audio file could not be decoded: {0}")]
    Decode(String),
    #[error("playback failed: {0}")]
    Playback(String),
}

enum PlayerRequest {
    Play(PathBuf),
    Flush(oneshot::Sender<()>),
}

/// Clone-safe handle to the audio thread.
#[derive(Clone)]
pub struct AudioPlayer {
    tx: mpsc::Sender<PlayerRequest>,
}

impl AudioPlayer {
    /// Spawn the audio thread and open the default output device on it.
    /// Fails fast when the host has no usable output.
    pub fn spawn() -> Result<Self, PlayerError> {
        let (tx, rx) = mpsc::channel::<PlayerRequest>(QUEUE_DEPTH);
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel::<Result<(), PlayerError>>(1);

        std::thread::Builder::new()
            .name("facesay-audio".into())
            .spawn(move || run_audio_thread(rx, ready_tx))
            .expect("failed to spawn audio thread");

        ready_rx
            .recv()
            .map_err(|_| PlayerError::NoOutput("audio thread died during startup".into()))??;
        Ok(Self { tx })
    }

    /// Start playing the given audio file, fading out whatever is
    /// currently audible first. Returns once the request is queued;
    /// playback continues inside the audio subsystem.
    ///
    /// The file is probed here so the caller learns about unreadable or
    /// undecodable audio; the audio thread decodes its own copy.
    pub fn play_file(&self, path: &Path) -> Result<(), PlayerError> {
        let file = File::open(path)?;
        Decoder::new(BufReader::new(file)).map_err(|e| PlayerError::Decode(e.to_string()))?;

        self.tx
            .try_send(PlayerRequest::Play(path.to_path_buf()))
            .map_err(|_| PlayerError::Playback("audio thread not accepting requests".into()))
    }

    /// Wait until the current utterance (if any) has played out.
    pub async fn wait_until_idle(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(PlayerRequest::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }
}

fn run_audio_thread(
    mut rx: mpsc::Receiver<PlayerRequest>,
    ready_tx: std::sync::mpsc::SyncSender<Result<(), PlayerError>>,
) {
    let (stream, handle) = match OutputStream::try_default() {
        Ok(pair) => {
            let _ = ready_tx.send(Ok(()));
            pair
        }
        Err(err) => {
            let _ = ready_tx.send(Err(PlayerError::NoOutput(err.to_string())));
            return;
        }
    };
    // Dropping the stream silences the handle; keep it alive for the loop.
    let _stream = stream;

    tracing::info!("audio thread started");
    let mut current: Option<Sink> = None;

    while let Some(request) = rx.blocking_recv() {
        match request {
            PlayerRequest::Play(path) => {
                if let Some(old) = current.take() {
                    fade_out_blocking(&old);
                }
                match start_playback(&handle, &path) {
                    Ok(sink) => current = Some(sink),
                    Err(err) => {
                        tracing::warn!(error = %err, path = ?path, "playback failed");
                    }
                }
            }
            PlayerRequest::Flush(ack) => {
                if let Some(sink) = current.as_ref() {
                    sink.sleep_until_end();
                }
                let _ = ack.send(());
            }
        }
    }
    tracing::info!("audio thread exiting");
}

fn start_playback(handle: &OutputStreamHandle, path: &Path) -> Result<Sink, PlayerError> {
    let file = File::open(path)?;
    let source = Decoder::new(BufReader::new(file)).map_err(|e| PlayerError::Decode(e.to_string()))?;
    let sink = Sink::try_new(handle).map_err(|e| PlayerError::Playback(e.to_string()))?;
    sink.append(source);
    Ok(sink)
}

/// Ramp the sink's volume to zero over the fade window, then stop it.
/// Runs on the audio thread itself, so the next utterance cannot start
/// until the previous one is silent. An already-drained sink is stopped
/// without the ramp.
fn fade_out_blocking(sink: &Sink) {
    if !sink.empty() {
        let step = FADE_OUT / FADE_STEPS;
        for volume in fade_curve(sink.volume()) {
            sink.set_volume(volume);
            std::thread::sleep(step);
        }
    }
    sink.stop();
}

/// Descending volume ramp for the fade window, ending at exactly zero.
fn fade_curve(start: f32) -> impl Iterator<Item = f32> {
    (0..FADE_STEPS)
        .rev()
        .map(move |remaining| fade_volume(start, remaining))
}

fn fade_volume(start: f32, remaining_steps: u32) -> f32 {
    start * remaining_steps as f32 / FADE_STEPS as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_volume_ramps_to_zero() {
        let mut previous = f32::MAX;
        for remaining in (0..FADE_STEPS).rev() {
            let volume = fade_volume(1.0, remaining);
            assert!(volume < previous, "fade must decrease monotonically");
            previous = volume;
        }
        assert_eq!(fade_volume(1.0, 0), 0.0);
    }

    #[test]
    fn test_fade_volume_scales_with_start() {
        assert_eq!(fade_volume(0.5, FADE_STEPS), 0.5);
        assert!(fade_volume(0.5, FADE_STEPS / 2) < 0.5);
    }

    #[test]
    fn test_fade_curve_ends_silent() {
        // The previous utterance must be at volume zero by the time the
        // ramp finishes and the sink is stopped; only then may the next
        // utterance start.
        let curve: Vec<f32> = fade_curve(1.0).collect();
        assert_eq!(curve.len(), FADE_STEPS as usize);
        assert_eq!(*curve.last().unwrap(), 0.0);
        for pair in curve.windows(2) {
            assert!(pair[1] < pair[0], "fade must decrease monotonically");
        }
    }
}
