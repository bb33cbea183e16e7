//! Cloud speech synthesis client.
//!
//! Text goes to the synthesize-speech endpoint and comes back as MP3
//! bytes. The audio is written to the configured output file, replacing
//! the previous utterance, and handed to the audio player. A new
//! utterance fades out whatever is still playing.

use std::path::PathBuf;

use async_trait::async_trait;
use facesay_core::{ProviderError, SpeechPresenter};
use facesay_speech::{AudioPlayer, PlayerError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudSpeechError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("service error ({status}): {body}")]
    Service { status: u16, body: String },
    #[error("could not write audio file: {0}")]
    Io(#[from] std::io::Error),
    #[error("audio playback failed: {0}")]
    Player(#[from] PlayerError),
}

impl From<CloudSpeechError> for ProviderError {
    fn from(err: CloudSpeechError) -> Self {
        match err {
            CloudSpeechError::Network(e) => ProviderError::Unavailable(e.to_string()),
            CloudSpeechError::Service { status, body } if status < 500 => {
                ProviderError::Rejected(format!("{status}: {body}"))
            }
            CloudSpeechError::Service { status, body } => {
                ProviderError::Unavailable(format!("{status}: {body}"))
            }
            CloudSpeechError::Io(e) => ProviderError::Unavailable(e.to_string()),
            CloudSpeechError::Player(e) => ProviderError::Unavailable(e.to_string()),
        }
    }
}

/// Connection and output settings for the speech service.
#[derive(Debug, Clone)]
pub struct CloudSpeechConfig {
    /// Service base URL, without a trailing slash.
    pub endpoint: String,
    pub api_key: String,
    /// Voice identifier passed to the service.
    pub voice: String,
    /// Where the synthesized MP3 lands; overwritten per utterance.
    pub output_path: PathBuf,
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
    #[serde(rename = "OutputFormat")]
    output_format: &'a str,
    #[serde(rename = "VoiceId")]
    voice_id: &'a str,
}

/// Speech presenter backed by the remote synthesis service.
pub struct CloudSpeechPresenter {
    client: reqwest::Client,
    config: CloudSpeechConfig,
    player: AudioPlayer,
}

impl CloudSpeechPresenter {
    pub fn new(config: CloudSpeechConfig, player: AudioPlayer) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            player,
        }
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CloudSpeechError> {
        let url = format!(
            "{}/synthesize-speech",
            self.config.endpoint.trim_end_matches('/')
        );
        let body = SynthesizeRequest {
            text,
            output_format: "mp3",
            voice_id: &self.config.voice,
        };

        tracing::debug!(voice = %self.config.voice, chars = text.len(), "synthesize request");
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudSpeechError::Service {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SpeechPresenter for CloudSpeechPresenter {
    async fn speak(&self, text: &str) -> Result<(), ProviderError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let audio = self.synthesize(text).await.map_err(ProviderError::from)?;
        std::fs::write(&self.config.output_path, &audio)
            .map_err(CloudSpeechError::from)
            .map_err(ProviderError::from)?;
        self.player
            .play_file(&self.config.output_path)
            .map_err(CloudSpeechError::from)
            .map_err(ProviderError::from)?;
        tracing::info!(
            bytes = audio.len(),
            path = ?self.config.output_path,
            "utterance synthesized and playing"
        );
        Ok(())
    }

    async fn drain(&self) {
        self.player.wait_until_idle().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesize_request_shape() {
        let request = SynthesizeRequest {
            text: "Detected face: 20 - 30 years old",
            output_format: "mp3",
            voice_id: "Joanna",
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["Text"], "Detected face: 20 - 30 years old");
        assert_eq!(value["OutputFormat"], "mp3");
        assert_eq!(value["VoiceId"], "Joanna");
    }

    #[test]
    fn test_service_error_mapping() {
        let rejected: ProviderError = CloudSpeechError::Service {
            status: 400,
            body: "bad voice".into(),
        }
        .into();
        assert!(matches!(rejected, ProviderError::Rejected(_)));

        let unavailable: ProviderError = CloudSpeechError::Service {
            status: 500,
            body: "oops".into(),
        }
        .into();
        assert!(matches!(unavailable, ProviderError::Unavailable(_)));
    }
}
