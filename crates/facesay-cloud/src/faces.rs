//! Cloud face-analysis client.
//!
//! Speaks the DetectFaces wire contract: the image is addressed by
//! object key inside the configured storage bucket, the request asks
//! for all attributes, and the response carries one FaceDetails entry
//! per detected face. A response without faces is an empty record list,
//! not an error.

use async_trait::async_trait;
use facesay_core::{
    AgeEstimate, EmotionReading, EmotionScore, FaceAttributeSource, FaceRecord, GroomingFlags,
    ImageRef, ProviderError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudFaceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("service error ({status}): {body}")]
    Service { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("empty object key")]
    EmptyKey,
    #[error("cloud source needs a remote object key, got a local path")]
    NotRemote,
}

impl From<CloudFaceError> for ProviderError {
    fn from(err: CloudFaceError) -> Self {
        match err {
            CloudFaceError::Network(e) => ProviderError::Unavailable(e.to_string()),
            CloudFaceError::Service { status, body } if status < 500 => {
                ProviderError::Rejected(format!("{status}: {body}"))
            }
            CloudFaceError::Service { status, body } => {
                ProviderError::Unavailable(format!("{status}: {body}"))
            }
            CloudFaceError::Malformed(e) => ProviderError::Rejected(e),
            CloudFaceError::EmptyKey => ProviderError::Rejected("empty object key".to_string()),
            CloudFaceError::NotRemote => {
                ProviderError::Rejected("cloud source needs a remote object key".to_string())
            }
        }
    }
}

/// Connection settings for the face-analysis service.
#[derive(Debug, Clone)]
pub struct CloudFaceConfig {
    /// Service base URL, without a trailing slash.
    pub endpoint: String,
    pub api_key: String,
    /// Storage bucket the object keys are resolved against.
    pub bucket: String,
}

/// Face attribute source backed by the remote analysis service.
pub struct CloudFaceSource {
    client: reqwest::Client,
    config: CloudFaceConfig,
}

impl CloudFaceSource {
    pub fn new(config: CloudFaceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn detect_faces(&self, key: &str) -> Result<Vec<FaceRecord>, CloudFaceError> {
        if key.trim().is_empty() {
            return Err(CloudFaceError::EmptyKey);
        }

        let url = format!("{}/detect-faces", self.config.endpoint.trim_end_matches('/'));
        let body = DetectFacesRequest {
            image: ImageSpec {
                s3_object: S3Object {
                    bucket: &self.config.bucket,
                    name: key,
                },
            },
            attributes: ["ALL"],
        };

        tracing::debug!(bucket = %self.config.bucket, key, "detect-faces request");
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
            return Err(CloudFaceError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        parse_detect_response(&text)
    }
}

#[async_trait]
impl FaceAttributeSource for CloudFaceSource {
    async fn analyze(&self, image: &ImageRef) -> Result<Vec<FaceRecord>, ProviderError> {
        let key = match image {
            ImageRef::RemoteObject { key } => key,
            ImageRef::LocalFile(_) => return Err(CloudFaceError::NotRemote.into()),
        };
        let faces = self.detect_faces(key).await?;
        tracing::info!(count = faces.len(), "cloud analysis complete");
        Ok(faces)
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct DetectFacesRequest<'a> {
    #[serde(rename = "Image")]
    image: ImageSpec<'a>,
    #[serde(rename = "Attributes")]
    attributes: [&'a str; 1],
}

#[derive(Serialize)]
struct ImageSpec<'a> {
    #[serde(rename = "S3Object")]
    s3_object: S3Object<'a>,
}

#[derive(Serialize)]
struct S3Object<'a> {
    #[serde(rename = "Bucket")]
    bucket: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct DetectFacesResponse {
    #[serde(default)]
    face_details: Vec<FaceDetail>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FaceDetail {
    age_range: Option<WireAgeRange>,
    gender: Option<ValueOf<String>>,
    #[serde(default)]
    emotions: Vec<WireEmotion>,
    beard: Option<ValueOf<bool>>,
    mustache: Option<ValueOf<bool>>,
    sunglasses: Option<ValueOf<bool>>,
    eyeglasses: Option<ValueOf<bool>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireAgeRange {
    low: u32,
    high: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireEmotion {
    r#type: String,
    confidence: f32,
}

/// Service attribute wrapper: `{"Value": ...}`.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ValueOf<T> {
    value: T,
}

/// Parse a DetectFaces response body into face records, preserving the
/// service's detection order. A missing or empty `FaceDetails` array
/// means no faces.
fn parse_detect_response(body: &str) -> Result<Vec<FaceRecord>, CloudFaceError> {
    let response: DetectFacesResponse =
        serde_json::from_str(body).map_err(|e| CloudFaceError::Malformed(e.to_string()))?;
    Ok(response
        .face_details
        .into_iter()
        .map(record_from_detail)
        .collect())
}

fn record_from_detail(detail: FaceDetail) -> FaceRecord {
    FaceRecord {
        age: detail
            .age_range
            .map(|r| AgeEstimate::Range {
                low: r.low,
                high: r.high,
            })
            .unwrap_or(AgeEstimate::Range { low: 0, high: 0 }),
        gender: detail
            .gender
            .map(|g| g.value)
            .unwrap_or_else(|| "Unknown".to_string()),
        emotion: EmotionReading::Scored(
            detail
                .emotions
                .into_iter()
                .map(|e| EmotionScore {
                    label: e.r#type,
                    confidence: e.confidence,
                })
                .collect(),
        ),
        grooming: Some(GroomingFlags {
            beard: detail.beard.map(|v| v.value).unwrap_or(false),
            mustache: detail.mustache.map(|v| v.value).unwrap_or(false),
            sunglasses: detail.sunglasses.map(|v| v.value).unwrap_or(false),
            eyeglasses: detail.eyeglasses.map(|v| v.value).unwrap_or(false),
        }),
    }
}
