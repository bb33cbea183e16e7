//! Report formatter: face records in, display text and speech text out.
//!
//! Each record renders one block; blocks are joined by a fixed-width
//! divider, one divider between adjacent blocks and none after the
//! last. The shape of the record picks the rendering: a scored emotion
//! distribution gets the detailed cloud block (with stress suggestion
//! and grooming status), a pre-resolved emotion gets the tabular
//! on-device block. The whole report is regenerated on every run.

use crate::stress;
use crate::types::{AgeEstimate, EmotionReading, EmotionScore, FaceRecord, GroomingFlags};

const DIVIDER_WIDTH: usize = 40;
const NO_FACES_NOTICE: &str = "No faces were detected in the image.";

/// The rendered output of one analysis run.
#[derive(Debug, Clone)]
pub struct Report {
    pub display_text: String,
    pub speech_text: String,
}

/// Build the report for one analysis run. An empty record list yields
/// the no-faces notice in both texts; it is not an error.
pub fn format(faces: &[FaceRecord]) -> Report {
    if faces.is_empty() {
        return Report {
            display_text: NO_FACES_NOTICE.to_string(),
            speech_text: NO_FACES_NOTICE.to_string(),
        };
    }

    let mut display = String::new();
    let mut speech = String::new();

    for (index, face) in faces.iter().enumerate() {
        if index > 0 {
            display.push_str(&"-".repeat(DIVIDER_WIDTH));
            display.push('\n');
        }
        match &face.emotion {
            EmotionReading::Scored(scores) => {
                render_detailed_block(face, scores, &mut display, &mut speech);
            }
            EmotionReading::Resolved(label) => {
                render_compact_block(face, label, index, &mut display, &mut speech);
            }
        }
    }

    Report {
        display_text: display,
        speech_text: speech,
    }
}

/// Highest-confidence entry of a distribution. The first entry wins an
/// exact tie, so the outcome only depends on provider order.
pub fn dominant_emotion(scores: &[EmotionScore]) -> Option<&EmotionScore> {
    let mut best: Option<&EmotionScore> = None;
    for score in scores {
        match best {
            Some(prev) if score.confidence <= prev.confidence => {}
            _ => best = Some(score),
        }
    }
    best
}

/// Detailed block for cloud-shaped records: bracketed age, resolved
/// dominant emotion with confidence, stress suggestion, grooming lines.
/// Every line lands in both the display text and the speech text.
fn render_detailed_block(
    face: &FaceRecord,
    scores: &[EmotionScore],
    display: &mut String,
    speech: &mut String,
) {
    let mut line = |text: String| {
        display.push_str(&text);
        display.push('\n');
        speech.push_str(&text);
        speech.push('\n');
    };

    let age_line = match face.age {
        AgeEstimate::Range { low, high } => format!("Detected face: {low} - {high} years old"),
        AgeEstimate::Exact(age) => format!("Detected face: {age} years old"),
    };
    line(age_line);
    line(format!("Gender: {}", face.gender));

    if let Some(dominant) = dominant_emotion(scores) {
        line(format!(
            "Emotional State: {} (Confidence: {:.1}%)",
            dominant.label, dominant.confidence
        ));
        line(stress::assess(&dominant.label).suggestion.to_string());
    }

    line(format!("Facial Hair: {}", facial_hair_status(face.grooming)));
    line(format!("Accessories: {}", accessory_status(face.grooming)));
}

/// Tabular block for on-device records plus one spoken sentence.
/// `index` is the zero-based detection position; subjects are numbered
/// from one.
fn render_compact_block(
    face: &FaceRecord,
    emotion_label: &str,
    index: usize,
    display: &mut String,
    speech: &mut String,
) {
    let emotion = emotion_label.to_uppercase();
    let age_text = match face.age {
        AgeEstimate::Exact(age) => age.to_string(),
        AgeEstimate::Range { low, high } => format!("{low} - {high}"),
    };

    display.push_str(&format!("{:<8}: {}\n", "AGE", age_text));
    display.push_str(&format!("{:<8}: {}\n", "GENDER", face.gender));
    display.push_str(&format!("{:<8}: {}\n", "EMOTION", emotion));

    speech.push_str(&format!(
        "Subject {} is a {} year old {} feeling {}. ",
        index + 1,
        age_text,
        face.gender,
        emotion
    ));
}

/// Beard outranks mustache when both flags are set.
fn facial_hair_status(grooming: Option<GroomingFlags>) -> &'static str {
    match grooming {
        Some(g) if g.beard => "Beard detected",
        Some(g) if g.mustache => "Mustache detected",
        _ => "None",
    }
}

/// Sunglasses outrank eyeglasses when both flags are set.
fn accessory_status(grooming: Option<GroomingFlags>) -> &'static str {
    match grooming {
        Some(g) if g.sunglasses => "Sunglasses detected",
        Some(g) if g.eyeglasses => "Eyeglasses detected",
        _ => "None",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stress::{SUGGESTION_HIGH, SUGGESTION_LOW};

    fn cloud_face(
        low: u32,
        high: u32,
        gender: &str,
        scores: Vec<(&str, f32)>,
        grooming: GroomingFlags,
    ) -> FaceRecord {
        FaceRecord {
            age: AgeEstimate::Range { low, high },
            gender: gender.to_string(),
            emotion: EmotionReading::Scored(
                scores
                    .into_iter()
                    .map(|(label, confidence)| EmotionScore {
                        label: label.to_string(),
                        confidence,
                    })
                    .collect(),
            ),
            grooming: Some(grooming),
        }
    }

    fn local_face(age: u32, gender: &str, emotion: &str) -> FaceRecord {
        FaceRecord {
            age: AgeEstimate::Exact(age),
            gender: gender.to_string(),
            emotion: EmotionReading::Resolved(emotion.to_string()),
            grooming: None,
        }
    }

    fn divider() -> String {
        "-".repeat(DIVIDER_WIDTH)
    }

    #[test]
    fn test_empty_input_yields_no_faces_notice() {
        let report = format(&[]);
        assert!(report.display_text.contains("No faces were detected"));
        assert!(!report.speech_text.is_empty());
        assert!(report.speech_text.contains("No faces were detected in the image."));
    }

    #[test]
    fn test_single_cloud_face_block() {
        let face = cloud_face(
            20,
            30,
            "Female",
            vec![("HAPPY", 98.5)],
            GroomingFlags::default(),
        );
        let report = format(&[face]);

        assert!(report.display_text.contains("20 - 30 years old"));
        assert!(report.display_text.contains("Gender: Female"));
        assert!(report.display_text.contains("HAPPY (Confidence: 98.5%)"));
        assert!(report.display_text.contains("Facial Hair: None"));
        assert!(report.display_text.contains("Accessories: None"));
        assert!(report.display_text.contains(SUGGESTION_LOW));

        assert!(!report.speech_text.is_empty());
        assert!(report.speech_text.contains("20 - 30 years old"));
        assert!(report.speech_text.contains("Gender: Female"));
        assert!(report.speech_text.contains("HAPPY"));
        assert!(report.speech_text.contains(SUGGESTION_LOW));
    }

    #[test]
    fn test_dominant_emotion_is_max_confidence() {
        let face = cloud_face(
            40,
            50,
            "Male",
            vec![("CALM", 10.0), ("ANGRY", 55.5), ("SAD", 30.0)],
            GroomingFlags::default(),
        );
        let report = format(&[face]);
        assert!(report.display_text.contains("ANGRY (Confidence: 55.5%)"));
        assert!(report.display_text.contains(SUGGESTION_HIGH));
    }

    #[test]
    fn test_dominant_emotion_tie_first_wins() {
        let scores = [
            EmotionScore { label: "HAPPY".into(), confidence: 50.0 },
            EmotionScore { label: "SAD".into(), confidence: 50.0 },
        ];
        assert_eq!(dominant_emotion(&scores).map(|s| s.label.as_str()), Some("HAPPY"));
    }

    #[test]
    fn test_empty_distribution_omits_emotion_and_stress_lines() {
        let face = cloud_face(20, 30, "Male", vec![], GroomingFlags::default());
        let report = format(&[face]);
        assert!(!report.display_text.contains("Emotional State"));
        assert!(!report.display_text.contains("stress"));
        assert!(report.display_text.contains("Facial Hair: None"));
    }

    #[test]
    fn test_two_faces_order_and_single_divider() {
        let faces = [
            cloud_face(20, 30, "Female", vec![("HAPPY", 90.0)], GroomingFlags::default()),
            cloud_face(60, 70, "Male", vec![("CALM", 80.0)], GroomingFlags::default()),
        ];
        let report = format(&faces);

        assert_eq!(report.display_text.matches(&divider()).count(), 1);
        assert!(!report.display_text.trim_end().ends_with(&divider()));

        let first = report.display_text.find("20 - 30 years old").unwrap();
        let second = report.display_text.find("60 - 70 years old").unwrap();
        assert!(first < second, "input order must be preserved");
    }

    #[test]
    fn test_beard_outranks_mustache() {
        let grooming = GroomingFlags { beard: true, mustache: true, ..Default::default() };
        let face = cloud_face(20, 30, "Male", vec![("CALM", 99.0)], grooming);
        let report = format(&[face]);
        assert!(report.display_text.contains("Facial Hair: Beard detected"));
        assert!(!report.display_text.contains("Mustache detected"));
    }

    #[test]
    fn test_mustache_alone_is_reported() {
        let grooming = GroomingFlags { mustache: true, ..Default::default() };
        let face = cloud_face(20, 30, "Male", vec![("CALM", 99.0)], grooming);
        let report = format(&[face]);
        assert!(report.display_text.contains("Facial Hair: Mustache detected"));
    }

    #[test]
    fn test_sunglasses_outrank_eyeglasses() {
        let grooming = GroomingFlags { sunglasses: true, eyeglasses: true, ..Default::default() };
        let face = cloud_face(20, 30, "Female", vec![("CALM", 99.0)], grooming);
        let report = format(&[face]);
        assert!(report.display_text.contains("Accessories: Sunglasses detected"));
        assert!(!report.display_text.contains("Eyeglasses detected"));
    }

    #[test]
    fn test_eyeglasses_alone_are_reported() {
        let grooming = GroomingFlags { eyeglasses: true, ..Default::default() };
        let face = cloud_face(20, 30, "Female", vec![("CALM", 99.0)], grooming);
        let report = format(&[face]);
        assert!(report.display_text.contains("Accessories: Eyeglasses detected"));
    }

    #[test]
    fn test_local_face_block_and_sentence() {
        let report = format(&[local_face(34, "Man", "sad")]);

        assert!(report.display_text.contains("AGE     : 34"));
        assert!(report.display_text.contains("GENDER  : Man"));
        assert!(report.display_text.contains("EMOTION : SAD"));
        assert!(report
            .speech_text
            .contains("Subject 1 is a 34 year old Man feeling SAD."));
    }

    #[test]
    fn test_local_faces_are_numbered_in_order() {
        let faces = [local_face(34, "Man", "sad"), local_face(28, "Woman", "happy")];
        let report = format(&faces);
        assert!(report.speech_text.contains("Subject 1 is a 34 year old Man feeling SAD."));
        assert!(report.speech_text.contains("Subject 2 is a 28 year old Woman feeling HAPPY."));
        assert_eq!(report.display_text.matches(&divider()).count(), 1);
    }

    #[test]
    fn test_runs_do_not_leak_state() {
        let first = format(&[cloud_face(
            20,
            30,
            "Female",
            vec![("HAPPY", 98.5)],
            GroomingFlags::default(),
        )]);
        assert!(first.display_text.contains("Female"));

        let second = format(&[local_face(34, "Man", "sad")]);
        assert!(!second.display_text.contains("Female"));
        assert!(!second.display_text.contains("20 - 30"));
        assert!(!second.speech_text.contains("HAPPY"));
    }
}
