//! Local speech engine discovery and invocation.
//!
//! Synthesis is delegated to whatever command-line engine the host has:
//! espeak-ng (or plain espeak) on Linux, `say` on macOS. The binary can
//! be pinned with FACESAY_SPEECH_BIN.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

const ENGINE_CANDIDATES: [&str; 3] = ["espeak-ng", "espeak", "say"];
const ESPEAK_WORDS_PER_MINUTE: u32 = 160;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no speech engine found (tried espeak-ng, espeak, say)")]
    NotFound,
    #[error("speech engine failed to run: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("speech engine exited with {0}")]
    Failed(std::process::ExitStatus),
}

/// A resolved local text-to-speech engine.
#[derive(Debug, Clone)]
pub struct SpeechEngine {
    bin: PathBuf,
}

impl SpeechEngine {
    /// Resolve an engine: FACESAY_SPEECH_BIN wins, then a PATH scan over
    /// the known candidates.
    pub fn discover() -> Result<Self, EngineError> {
        if let Ok(pinned) = std::env::var("FACESAY_SPEECH_BIN") {
            let path = PathBuf::from(pinned);
            if path.exists() {
                tracing::info!(bin = ?path, "speech engine pinned via FACESAY_SPEECH_BIN");
                return Ok(Self { bin: path });
            }
            tracing::warn!(bin = ?path, "FACESAY_SPEECH_BIN does not exist; falling back to PATH");
        }
        for candidate in ENGINE_CANDIDATES {
            if let Some(path) = find_in_path(candidate) {
                tracing::info!(bin = ?path, "speech engine detected");
                return Ok(Self { bin: path });
            }
        }
        Err(EngineError::NotFound)
    }

    pub fn binary(&self) -> &Path {
        &self.bin
    }

    /// Synthesize and play the text, blocking until the engine exits.
    /// Callers that must not block run this on the speech worker.
    pub fn speak_blocking(&self, text: &str) -> Result<(), EngineError> {
        let status = Command::new(&self.bin)
            .args(engine_args(&self.bin, text))
            .status()?;
        if !status.success() {
            return Err(EngineError::Failed(status));
        }
        Ok(())
    }
}

/// Arguments for the given engine binary. The espeak family takes a
/// speaking rate; everything else just gets the text.
fn engine_args(bin: &Path, text: &str) -> Vec<String> {
    let name = bin.file_name().and_then(|s| s.to_str()).unwrap_or("");
    match name {
        "espeak-ng" | "espeak" => vec![
            "-s".to_string(),
            ESPEAK_WORDS_PER_MINUTE.to_string(),
            text.to_string(),
        ],
        _ => vec![text.to_string()],
    }
}

fn find_in_path(bin: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.exists())
}
