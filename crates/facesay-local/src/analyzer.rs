//! On-device analysis pipeline: detect faces, crop with margin, run the
//! attribute models per face.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use facesay_core::{
    AgeEstimate, EmotionReading, FaceAttributeSource, FaceRecord, ImageRef, ProviderError,
};
use image::RgbImage;
use thiserror::Error;

use crate::attributes::{AttributeError, AttributeExtractor};
use crate::detector::{DetectorError, FaceBox, FaceDetector};

/// Crop margin around a detected box, as a fraction of its size. The
/// attribute models want some forehead and chin context.
const CROP_MARGIN: f32 = 0.2;

pub const DETECTOR_MODEL: &str = "version-RFB-320.onnx";
pub const EMOTION_MODEL: &str = "emotion-7.onnx";
pub const AGE_GENDER_MODEL: &str = "age-gender.onnx";

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("could not read image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Attributes(#[from] AttributeError),
    #[error("local source needs a file path, got a remote object key")]
    NotLocal,
}

impl From<AnalyzerError> for ProviderError {
    fn from(err: AnalyzerError) -> Self {
        match err {
            AnalyzerError::Image(e) => ProviderError::UnreadableImage(e.to_string()),
            AnalyzerError::Detector(e) => ProviderError::Unavailable(e.to_string()),
            AnalyzerError::Attributes(e) => ProviderError::Unavailable(e.to_string()),
            AnalyzerError::NotLocal => {
                ProviderError::Rejected("local source needs a file path".to_string())
            }
        }
    }
}

/// The three model files expected under a model directory.
pub fn model_paths(model_dir: &Path) -> [std::path::PathBuf; 3] {
    [
        model_dir.join(DETECTOR_MODEL),
        model_dir.join(EMOTION_MODEL),
        model_dir.join(AGE_GENDER_MODEL),
    ]
}

struct Inner {
    detector: FaceDetector,
    attributes: AttributeExtractor,
}

/// Face attribute source running entirely on-device.
pub struct LocalFaceSource {
    // Sessions take &mut to run; the trait hands out &self.
    inner: Mutex<Inner>,
}

impl LocalFaceSource {
    /// Load all three models from the directory, failing fast if any
    /// file is missing.
    pub fn load(model_dir: &Path) -> Result<Self, AnalyzerError> {
        let [detector_path, emotion_path, age_gender_path] = model_paths(model_dir);

        let detector = FaceDetector::load(&detector_path)?;
        let attributes = AttributeExtractor::load(&emotion_path, &age_gender_path)?;

        Ok(Self {
            inner: Mutex::new(Inner {
                detector,
                attributes,
            }),
        })
    }

    fn analyze_file(&self, path: &Path) -> Result<Vec<FaceRecord>, AnalyzerError> {
        let image = image::open(path)?.to_rgb8();

        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let faces = inner.detector.detect(&image)?;
        tracing::debug!(count = faces.len(), path = %path.display(), "faces detected");

        let mut records = Vec::with_capacity(faces.len());
        for face in &faces {
            let crop = crop_face(&image, face);
            let attrs = inner.attributes.extract(&crop)?;
            records.push(FaceRecord {
                age: AgeEstimate::Exact(attrs.age),
                gender: attrs.gender,
                emotion: EmotionReading::Resolved(attrs.emotion),
                grooming: None,
            });
        }

        Ok(records)
    }
}

#[async_trait]
impl FaceAttributeSource for LocalFaceSource {
    async fn analyze(&self, image: &ImageRef) -> Result<Vec<FaceRecord>, ProviderError> {
        let path = match image {
            ImageRef::LocalFile(path) => path,
            ImageRef::RemoteObject { .. } => return Err(AnalyzerError::NotLocal.into()),
        };
        let records = self.analyze_file(path)?;
        tracing::info!(count = records.len(), "local analysis complete");
        Ok(records)
    }
}

/// Crop the box expanded by the margin, clamped to the image bounds.
fn crop_face(image: &RgbImage, face: &FaceBox) -> RgbImage {
    let margin_x = face.width() * CROP_MARGIN;
    let margin_y = face.height() * CROP_MARGIN;

    let x1 = (face.x1 - margin_x).max(0.0) as u32;
    let y1 = (face.y1 - margin_y).max(0.0) as u32;
    let x2 = ((face.x2 + margin_x) as u32).min(image.width());
    let y2 = ((face.y2 + margin_y) as u32).min(image.height());

    let width = (x2.saturating_sub(x1)).max(1);
    let height = (y2.saturating_sub(y1)).max(1);

    image::imageops::crop_imm(image, x1, y1, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_box(x1: f32, y1: f32, x2: f32, y2: f32) -> FaceBox {
        FaceBox {
            x1,
            y1,
            x2,
            y2,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_crop_face_adds_margin() {
        let image = RgbImage::new(400, 300);
        let crop = crop_face(&image, &make_box(100.0, 100.0, 200.0, 200.0));
        // 100-wide box with 20% margin each side.
        assert_eq!(crop.width(), 140);
        assert_eq!(crop.height(), 140);
    }

    #[test]
    fn test_crop_face_clamps_to_image_bounds() {
        let image = RgbImage::new(200, 150);
        let crop = crop_face(&image, &make_box(-10.0, -10.0, 250.0, 250.0));
        assert_eq!(crop.width(), 200);
        assert_eq!(crop.height(), 150);
    }

    #[test]
    fn test_crop_face_degenerate_box_yields_nonempty_crop() {
        let image = RgbImage::new(100, 100);
        let crop = crop_face(&image, &make_box(50.0, 50.0, 50.0, 50.0));
        assert!(crop.width() >= 1 && crop.height() >= 1);
    }

    #[test]
    fn test_model_paths_join_all_three() {
        let paths = model_paths(Path::new("/models"));
        assert!(paths[0].ends_with(DETECTOR_MODEL));
        assert!(paths[1].ends_with(EMOTION_MODEL));
        assert!(paths[2].ends_with(AGE_GENDER_MODEL));
    }
}
