//! Wires a provider, the report formatter, and a speech presenter into
//! the analyze/speak flows.

use std::sync::Arc;

use anyhow::Context;
use facesay_cloud::{
    CloudFaceConfig, CloudFaceSource, CloudSpeechConfig, CloudSpeechPresenter,
};
use facesay_core::{report, FaceAttributeSource, ImageRef, SpeechPresenter};
use facesay_local::LocalFaceSource;
use facesay_speech::{spawn_speech_worker, AudioPlayer, LocalSpeechPresenter, SpeechEngine};
use thiserror::Error;

use crate::config::{Config, ProviderKind};

#[derive(Error, Debug)]
pub enum InputError {
    #[error("no image reference given")]
    EmptyReference,
    #[error("no text given to speak")]
    EmptyText,
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),
}

/// Analyze one image and print the report; speak it unless quieted.
pub async fn run_analysis(config: &Config, image: &str, quiet: bool) -> anyhow::Result<()> {
    if image.trim().is_empty() {
        return Err(InputError::EmptyReference.into());
    }

    let source = build_source(config)?;
    let image_ref = image_ref_for(config, image);

    let records = source
        .analyze(&image_ref)
        .await
        .context("face analysis failed")?;
    let report = report::format(&records);

    println!("{}", report.display_text);

    if !quiet {
        if let Some(presenter) = build_presenter(config)? {
            presenter
                .speak(&report.speech_text)
                .await
                .context("speech synthesis failed")?;
            presenter.drain().await;
        }
    }

    Ok(())
}

/// Speak arbitrary text through the configured presenter.
pub async fn run_speak(config: &Config, text: &str) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        return Err(InputError::EmptyText.into());
    }

    let presenter = build_presenter(config)?
        .ok_or_else(|| anyhow::anyhow!("no speech output available on this host"))?;
    presenter.speak(text).await.context("speech synthesis failed")?;
    presenter.drain().await;
    Ok(())
}

/// Report what the current environment can and cannot do.
pub fn run_doctor(config: &Config) {
    match config.provider {
        ProviderKind::Cloud => {
            println!("provider: cloud");
            println!(
                "  endpoint: {}",
                present_or(&config.cloud_endpoint, "NOT SET (FACESAY_CLOUD_ENDPOINT)")
            );
            println!(
                "  api key: {}",
                if config.cloud_api_key.is_empty() {
                    "NOT SET (FACESAY_CLOUD_API_KEY)"
                } else {
                    "set"
                }
            );
            println!("  bucket: {} ({})", config.cloud_bucket, config.cloud_region);
            println!("  voice: {}", config.voice);
        }
        ProviderKind::Local => {
            println!("provider: local");
            println!("  model dir: {}", config.model_dir.display());
            for path in facesay_local::model_paths(&config.model_dir) {
                let status = if path.exists() { "ok" } else { "MISSING" };
                println!("  {}: {status}", path.display());
            }
            match SpeechEngine::discover() {
                Ok(engine) => println!("  speech engine: {}", engine.binary().display()),
                Err(err) => println!("  speech engine: {err}"),
            }
        }
    }

    match AudioPlayer::spawn() {
        Ok(_) => println!("audio output: ok"),
        Err(err) => println!("audio output: {err}"),
    }
}

fn build_source(config: &Config) -> anyhow::Result<Arc<dyn FaceAttributeSource>> {
    match config.provider {
        ProviderKind::Cloud => {
            if config.cloud_endpoint.is_empty() {
                return Err(InputError::MissingSetting("FACESAY_CLOUD_ENDPOINT").into());
            }
            if config.cloud_api_key.is_empty() {
                return Err(InputError::MissingSetting("FACESAY_CLOUD_API_KEY").into());
            }
            Ok(Arc::new(CloudFaceSource::new(CloudFaceConfig {
                endpoint: config.cloud_endpoint.clone(),
                api_key: config.cloud_api_key.clone(),
                bucket: config.cloud_bucket.clone(),
            })))
        }
        ProviderKind::Local => {
            let source = LocalFaceSource::load(&config.model_dir)
                .context("could not load local models")?;
            Ok(Arc::new(source))
        }
    }
}

/// Cloud analysis addresses images by object key; local analysis by
/// file path.
fn image_ref_for(config: &Config, image: &str) -> ImageRef {
    match config.provider {
        ProviderKind::Cloud => ImageRef::RemoteObject {
            key: image.to_string(),
        },
        ProviderKind::Local => ImageRef::LocalFile(image.into()),
    }
}

/// Build the speech presenter for the configured provider. A host with
/// no local speech engine degrades to text-only output rather than
/// failing the analysis.
fn build_presenter(config: &Config) -> anyhow::Result<Option<Arc<dyn SpeechPresenter>>> {
    match config.provider {
        ProviderKind::Cloud => {
            if config.cloud_endpoint.is_empty() {
                return Err(InputError::MissingSetting("FACESAY_CLOUD_ENDPOINT").into());
            }
            if config.cloud_api_key.is_empty() {
                return Err(InputError::MissingSetting("FACESAY_CLOUD_API_KEY").into());
            }
            let player = AudioPlayer::spawn().context("could not open audio output")?;
            Ok(Some(Arc::new(CloudSpeechPresenter::new(
                CloudSpeechConfig {
                    endpoint: config.cloud_endpoint.clone(),
                    api_key: config.cloud_api_key.clone(),
                    voice: config.voice.clone(),
                    output_path: config.speech_output.clone(),
                },
                player,
            ))))
        }
        ProviderKind::Local => match SpeechEngine::discover() {
            Ok(engine) => {
                let handle = spawn_speech_worker(engine);
                Ok(Some(Arc::new(LocalSpeechPresenter::new(handle))))
            }
            Err(err) => {
                tracing::warn!(error = %err, "no speech engine; continuing without audio");
                Ok(None)
            }
        },
    }
}

fn present_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cloud_config() -> Config {
        Config {
            provider: ProviderKind::Cloud,
            cloud_endpoint: "https://example.test".to_string(),
            cloud_api_key: "key".to_string(),
            cloud_bucket: "face-reports".to_string(),
            cloud_region: "us-east-2".to_string(),
            voice: "Joanna".to_string(),
            speech_output: PathBuf::from("speech_output.mp3"),
            model_dir: PathBuf::from("/nonexistent"),
        }
    }

    #[test]
    fn test_image_ref_follows_provider() {
        let mut config = cloud_config();
        assert!(matches!(
            image_ref_for(&config, "portrait.jpg"),
            ImageRef::RemoteObject { .. }
        ));

        config.provider = ProviderKind::Local;
        assert!(matches!(
            image_ref_for(&config, "portrait.jpg"),
            ImageRef::LocalFile(_)
        ));
    }

    #[test]
    fn test_cloud_source_requires_endpoint_and_key() {
        let mut config = cloud_config();
        config.cloud_endpoint.clear();
        assert!(build_source(&config).is_err());

        let mut config = cloud_config();
        config.cloud_api_key.clear();
        assert!(build_source(&config).is_err());

        assert!(build_source(&cloud_config()).is_ok());
    }

    #[tokio::test]
    async fn test_empty_image_reference_is_rejected() {
        let config = cloud_config();
        assert!(run_analysis(&config, "  ", true).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_speak_text_is_rejected_with_text_error() {
        let config = cloud_config();
        let err = run_speak(&config, "  ").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("text"), "got: {message}");
        assert!(!message.contains("image"), "got: {message}");
    }
}
