//! Bounded fire-and-forget speech worker.
//!
//! The local variant must never block the foreground on synthesis, and
//! engine failures must never reach the user. One named worker thread
//! drains a small queue; enqueueing into a full queue drops the
//! utterance with a warning. There is no cancellation and no retry.

use crate::engine::SpeechEngine;
use async_trait::async_trait;
use facesay_core::{ProviderError, SpeechPresenter};
use tokio::sync::{mpsc, oneshot};

const QUEUE_DEPTH: usize = 4;

enum Job {
    Utterance(String),
    Flush(oneshot::Sender<()>),
}

/// Clone-safe handle to the worker thread.
#[derive(Clone)]
pub struct SpeechHandle {
    tx: mpsc::Sender<Job>,
}

impl SpeechHandle {
    /// Queue an utterance. A full queue or a gone worker drops it; this
    /// never blocks and never fails the caller.
    pub fn enqueue(&self, text: String) {
        match self.tx.try_send(Job::Utterance(text)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("speech queue full; dropping utterance");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("speech worker gone; dropping utterance");
            }
        }
    }

    /// Wait until every queued utterance has been spoken.
    pub async fn wait_idle(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Job::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }
}

/// Spawn the worker thread and return its handle.
pub fn spawn_speech_worker(engine: SpeechEngine) -> SpeechHandle {
    let (tx, mut rx) = mpsc::channel::<Job>(QUEUE_DEPTH);

    std::thread::Builder::new()
        .name("facesay-speech".into())
        .spawn(move || {
            tracing::info!(engine = ?engine.binary(), "speech worker started");
            while let Some(job) = rx.blocking_recv() {
                match job {
                    Job::Utterance(text) => {
                        if let Err(err) = engine.speak_blocking(&text) {
                            // Best-effort: failures stay inside the worker.
                            tracing::debug!(error = %err, "speech engine failed; utterance dropped");
                        }
                    }
                    Job::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
            tracing::info!("speech worker exiting");
        })
        .expect("failed to spawn speech worker thread");

    SpeechHandle { tx }
}

/// Speech presenter backed by the worker queue. `speak` cannot fail;
/// anything that goes wrong past the queue is logged and discarded.
pub struct LocalSpeechPresenter {
    handle: SpeechHandle,
}

impl LocalSpeechPresenter {
    pub fn new(handle: SpeechHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl SpeechPresenter for LocalSpeechPresenter {
    async fn speak(&self, text: &str) -> Result<(), ProviderError> {
        self.handle.enqueue(text.to_string());
        Ok(())
    }

    async fn drain(&self) {
        self.handle.wait_idle().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_after_worker_gone_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = SpeechHandle { tx };
        // Must neither panic nor block.
        handle.enqueue("hello".into());
    }

    #[test]
    fn test_enqueue_into_full_queue_drops() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = SpeechHandle { tx };
        handle.enqueue("one".into());
        // Queue is full and nobody is draining; the second utterance is
        // dropped without blocking.
        handle.enqueue("two".into());
    }

    #[tokio::test]
    async fn test_local_presenter_speak_never_fails() {
        let (tx, _rx) = mpsc::channel(1);
        let presenter = LocalSpeechPresenter::new(SpeechHandle { tx });
        assert!(presenter.speak("hello").await.is_ok());
        assert!(presenter.speak("overflow").await.is_ok());
    }
}
