//! facesay-speech — speech playback and local synthesis.
//!
//! Owns the process-wide audio output, discovers local command-line
//! speech engines, and runs the bounded fire-and-forget worker the
//! local presenter enqueues into.

pub mod engine;
pub mod player;
pub mod worker;

pub use engine::{EngineError, SpeechEngine};
pub use player::{AudioPlayer, PlayerError};
pub use worker::{spawn_speech_worker, LocalSpeechPresenter, SpeechHandle};
