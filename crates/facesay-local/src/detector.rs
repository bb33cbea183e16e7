//! UltraFace face detector via ONNX Runtime.
//!
//! Runs the version-RFB-320 UltraFace model: a single 320x240 RGB pass
//! producing per-prior [background, face] scores and normalized corner
//! boxes, filtered by confidence and greedy NMS.

use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const ULTRAFACE_INPUT_WIDTH: usize = 320;
const ULTRAFACE_INPUT_HEIGHT: usize = 240;
const ULTRAFACE_MEAN: f32 = 127.0;
const ULTRAFACE_STD: f32 = 128.0;
const ULTRAFACE_CONFIDENCE_THRESHOLD: f32 = 0.7;
const ULTRAFACE_NMS_THRESHOLD: f32 = 0.4;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// A detected face in original-image pixel coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FaceBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
}

impl FaceBox {
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// UltraFace-based face detector.
pub struct FaceDetector {
    session: Session,
}

impl FaceDetector {
    /// Load the UltraFace ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(
                model_path.display().to_string(),
            ));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = %model_path.display(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded UltraFace model"
        );

        Ok(Self { session })
    }

    /// Detect faces in an RGB image, returning boxes ordered left to
    /// right in the original image.
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>, DetectorError> {
        let input = preprocess(image);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("scores: {e}")))?;
        let (_, boxes) = outputs[1]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("boxes: {e}")))?;

        let candidates = decode(
            scores,
            boxes,
            image.width() as f32,
            image.height() as f32,
            ULTRAFACE_CONFIDENCE_THRESHOLD,
        );

        let mut kept = nms(candidates, ULTRAFACE_NMS_THRESHOLD);
        kept.sort_by(|a, b| a.x1.partial_cmp(&b.x1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(kept)
    }
}

/// Resize to the model input and normalize to (p - 127) / 128, NCHW.
fn preprocess(image: &RgbImage) -> Array4<f32> {
    let resized = image::imageops::resize(
        image,
        ULTRAFACE_INPUT_WIDTH as u32,
        ULTRAFACE_INPUT_HEIGHT as u32,
        image::imageops::FilterType::Triangle,
    );

    let mut tensor = Array4::<f32>::zeros((1, 3, ULTRAFACE_INPUT_HEIGHT, ULTRAFACE_INPUT_WIDTH));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel.0[c] as f32 - ULTRAFACE_MEAN) / ULTRAFACE_STD;
        }
    }
    tensor
}

/// Decode raw tensors into candidate boxes above the threshold.
///
/// `scores` is flat [background, face] pairs per prior; `boxes` is flat
/// normalized [x1, y1, x2, y2] corners per prior.
fn decode(
    scores: &[f32],
    boxes: &[f32],
    image_width: f32,
    image_height: f32,
    threshold: f32,
) -> Vec<FaceBox> {
    let num_priors = scores.len() / 2;
    let mut candidates = Vec::new();

    for idx in 0..num_priors {
        let confidence = scores[idx * 2 + 1];
        if confidence <= threshold {
            continue;
        }

        let box_off = idx * 4;
        if box_off + 3 >= boxes.len() {
            continue;
        }

        candidates.push(FaceBox {
            x1: boxes[box_off] * image_width,
            y1: boxes[box_off + 1] * image_height,
            x2: boxes[box_off + 2] * image_width,
            y2: boxes[box_off + 3] * image_height,
            confidence,
        });
    }

    candidates
}

/// Greedy NMS: highest confidence first, drop anything overlapping a
/// kept box past the threshold.
fn nms(mut candidates: Vec<FaceBox>, iou_threshold: f32) -> Vec<FaceBox> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<FaceBox> = Vec::new();
    for candidate in candidates {
        if keep.iter().all(|kept| iou(kept, &candidate) <= iou_threshold) {
            keep.push(candidate);
        }
    }
    keep
}

fn iou(a: &FaceBox, b: &FaceBox) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width() * a.height() + b.width() * b.height() - inter;

    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}
