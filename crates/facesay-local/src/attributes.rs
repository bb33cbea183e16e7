//! Per-face attribute models: emotion classification and age/gender
//! estimation over a cropped face.

use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const EMOTION_INPUT_SIZE: usize = 64;
const EMOTION_LABELS: [&str; 7] = [
    "angry", "disgust", "fear", "happy", "sad", "surprise", "neutral",
];

const AGE_GENDER_INPUT_SIZE: usize = 224;
const GENDER_LABELS: [&str; 2] = ["Woman", "Man"];
const MAX_AGE: f32 = 120.0;

#[derive(Error, Debug)]
pub enum AttributeError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Attributes read off a single face crop.
#[derive(Debug, Clone)]
pub struct FaceAttributes {
    pub age: u32,
    pub gender: String,
    pub emotion: String,
}

/// Runs the emotion and age/gender models over face crops.
pub struct AttributeExtractor {
    emotion: Session,
    age_gender: Session,
}

impl AttributeExtractor {
    pub fn load(emotion_path: &Path, age_gender_path: &Path) -> Result<Self, AttributeError> {
        for path in [emotion_path, age_gender_path] {
            if !path.exists() {
                return Err(AttributeError::ModelNotFound(path.display().to_string()));
            }
        }

        let emotion = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(emotion_path)?;
        let age_gender = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(age_gender_path)?;

        tracing::info!(
            emotion = %emotion_path.display(),
            age_gender = %age_gender_path.display(),
            "loaded attribute models"
        );

        Ok(Self { emotion, age_gender })
    }

    pub fn extract(&mut self, crop: &RgbImage) -> Result<FaceAttributes, AttributeError> {
        let emotion = self.classify_emotion(crop)?;
        let (age, gender) = self.estimate_age_gender(crop)?;
        Ok(FaceAttributes {
            age,
            gender,
            emotion,
        })
    }

    /// 64x64 grayscale in [0, 1], seven-way softmax over emotion logits.
    fn classify_emotion(&mut self, crop: &RgbImage) -> Result<String, AttributeError> {
        let gray = image::imageops::grayscale(crop);
        let resized = image::imageops::resize(
            &gray,
            EMOTION_INPUT_SIZE as u32,
            EMOTION_INPUT_SIZE as u32,
            image::imageops::FilterType::Triangle,
        );

        let mut input = Array4::<f32>::zeros((1, 1, EMOTION_INPUT_SIZE, EMOTION_INPUT_SIZE));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel.0[0] as f32 / 255.0;
        }

        let outputs = self
            .emotion
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
        let (_, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| AttributeError::InferenceFailed(format!("emotion logits: {e}")))?;

        let probs = softmax(logits);
        let winner = argmax(&probs).ok_or_else(|| {
            AttributeError::InferenceFailed("emotion model produced no logits".to_string())
        })?;

        Ok(emotion_label(winner).to_string())
    }

    /// 224x224 RGB in [0, 1]; output 0 is gender logits, output 1 a
    /// raw age scalar.
    fn estimate_age_gender(&mut self, crop: &RgbImage) -> Result<(u32, String), AttributeError> {
        let resized = image::imageops::resize(
            crop,
            AGE_GENDER_INPUT_SIZE as u32,
            AGE_GENDER_INPUT_SIZE as u32,
            image::imageops::FilterType::Triangle,
        );

        let mut input =
            Array4::<f32>::zeros((1, 3, AGE_GENDER_INPUT_SIZE, AGE_GENDER_INPUT_SIZE));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                input[[0, c, y as usize, x as usize]] = pixel.0[c] as f32 / 255.0;
            }
        }

        let outputs = self
            .age_gender
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
        let (_, gender_logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| AttributeError::InferenceFailed(format!("gender logits: {e}")))?;
        let (_, age_raw) = outputs[1]
            .try_extract_tensor::<f32>()
            .map_err(|e| AttributeError::InferenceFailed(format!("age output: {e}")))?;

        let gender_idx = argmax(gender_logits).ok_or_else(|| {
            AttributeError::InferenceFailed("gender model produced no logits".to_string())
        })?;
        let age = age_raw.first().copied().unwrap_or(0.0);

        Ok((clamp_age(age), gender_label(gender_idx).to_string()))
    }
}

fn emotion_label(index: usize) -> &'static str {
    EMOTION_LABELS[index.min(EMOTION_LABELS.len() - 1)]
}

fn gender_label(index: usize) -> &'static str {
    GENDER_LABELS[index.min(GENDER_LABELS.len() - 1)]
}

fn clamp_age(raw: f32) -> u32 {
    raw.round().clamp(0.0, MAX_AGE) as u32
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.iter().map(|&v| v / sum).collect()
    } else {
        exps
    }
}

/// Index of the largest value; the first one wins ties.
fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_stable_for_large_logits() {
        let probs = softmax(&[1000.0, 1001.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!(probs[1] > probs[0]);
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[0.2, 0.5, 0.5, 0.1]), Some(1));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[3.0]), Some(0));
    }

    #[test]
    fn test_emotion_labels_cover_model_outputs() {
        assert_eq!(emotion_label(0), "angry");
        assert_eq!(emotion_label(3), "happy");
        assert_eq!(emotion_label(6), "neutral");
        // Out-of-range indices clamp to the last label.
        assert_eq!(emotion_label(42), "neutral");
    }

    #[test]
    fn test_gender_labels() {
        assert_eq!(gender_label(0), "Woman");
        assert_eq!(gender_label(1), "Man");
        assert_eq!(gender_label(7), "Man");
    }

    #[test]
    fn test_clamp_age_bounds() {
        assert_eq!(clamp_age(-3.0), 0);
        assert_eq!(clamp_age(33.6), 34);
        assert_eq!(clamp_age(500.0), 120);
    }
}
