use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Age estimate for one face. Cloud analysis returns a bracket;
/// on-device regression returns a single figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeEstimate {
    Range { low: u32, high: u32 },
    Exact(u32),
}

/// One entry of a cloud emotion distribution.
/// Confidence is a percentage in [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionScore {
    pub label: String,
    pub confidence: f32,
}

/// Emotion information in the shape the provider delivered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EmotionReading {
    /// Full distribution; the report formatter resolves the dominant label.
    Scored(Vec<EmotionScore>),
    /// Already-resolved dominant label, lowercase as the attribute head emits it.
    Resolved(String),
}

/// Facial-hair and accessory flags. Only the cloud provider reports these.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GroomingFlags {
    pub beard: bool,
    pub mustache: bool,
    pub sunglasses: bool,
    pub eyeglasses: bool,
}

/// One detected face. Immutable once produced by a source; consumed by
/// the report formatter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRecord {
    pub age: AgeEstimate,
    pub gender: String,
    pub emotion: EmotionReading,
    pub grooming: Option<GroomingFlags>,
}

/// Reference to the image under analysis.
#[derive(Debug, Clone)]
pub enum ImageRef {
    /// Object key resolved against the cloud provider's configured bucket.
    RemoteObject { key: String },
    /// Path on the local filesystem.
    LocalFile(PathBuf),
}

/// Failure crossing the provider boundary. Zero detected faces is not
/// an error — sources return an empty record list for that.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("image could not be read: {0}")]
    UnreadableImage(String),
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider rejected the request: {0}")]
    Rejected(String),
}

/// A face-analysis capability: given an image reference, produce face
/// records in the provider's detection order.
#[async_trait]
pub trait FaceAttributeSource: Send + Sync {
    async fn analyze(&self, image: &ImageRef) -> Result<Vec<FaceRecord>, ProviderError>;
}

/// A speech capability.
#[async_trait]
pub trait SpeechPresenter: Send + Sync {
    /// Vocalize the text. Returns once the utterance has been issued;
    /// playback continues in the background.
    async fn speak(&self, text: &str) -> Result<(), ProviderError>;

    /// Block until queued or playing speech has finished. The shell
    /// calls this before process exit so audio is not cut off.
    async fn drain(&self) {}
}
