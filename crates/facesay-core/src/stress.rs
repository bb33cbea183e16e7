//! Stress heuristic over the dominant-emotion label.
//!
//! Deterministic, no side effects, no error conditions: every label
//! maps to a level, unknown labels read as Low.

/// Qualitative stress level derived from a dominant emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

/// A stress level with its relaxation suggestion. Created per face,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressAssessment {
    pub level: StressLevel,
    pub suggestion: &'static str,
}

const HIGH_STRESS_EMOTIONS: [&str; 3] = ["ANGRY", "FEAR", "SAD"];
const MEDIUM_STRESS_EMOTIONS: [&str; 2] = ["DISGUST", "SURPRISED"];

pub const SUGGESTION_HIGH: &str = "It seems you're experiencing high stress. \
     Try deep breathing exercises, meditation, or taking a short walk.";
pub const SUGGESTION_MEDIUM: &str = "It seems you're feeling some stress. \
     Try listening to calming music or doing some light stretches.";
pub const SUGGESTION_LOW: &str =
    "You seem to be in a normal state. Keep up with your routine to stay relaxed.";

/// Classify a dominant-emotion label. Case-sensitive on the fixed
/// vocabulary the cloud provider emits.
pub fn assess(dominant_emotion: &str) -> StressAssessment {
    let level = if HIGH_STRESS_EMOTIONS.contains(&dominant_emotion) {
        StressLevel::High
    } else if MEDIUM_STRESS_EMOTIONS.contains(&dominant_emotion) {
        StressLevel::Medium
    } else {
        StressLevel::Low
    };

    let suggestion = match level {
        StressLevel::High => SUGGESTION_HIGH,
        StressLevel::Medium => SUGGESTION_MEDIUM,
        StressLevel::Low => SUGGESTION_LOW,
    };

    StressAssessment { level, suggestion }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_stress_labels() {
        for label in ["ANGRY", "FEAR", "SAD"] {
            assert_eq!(assess(label).level, StressLevel::High, "label {label}");
            assert_eq!(assess(label).suggestion, SUGGESTION_HIGH);
        }
    }

    #[test]
    fn test_medium_stress_labels() {
        for label in ["DISGUST", "SURPRISED"] {
            assert_eq!(assess(label).level, StressLevel::Medium, "label {label}");
            assert_eq!(assess(label).suggestion, SUGGESTION_MEDIUM);
        }
    }

    #[test]
    fn test_everything_else_is_low() {
        for label in ["CALM", "HAPPY", "CONFUSED", "UNKNOWN_LABEL", "", "garbage"] {
            assert_eq!(assess(label).level, StressLevel::Low, "label {label:?}");
            assert_eq!(assess(label).suggestion, SUGGESTION_LOW);
        }
    }

    #[test]
    fn test_classification_is_case_sensitive() {
        // Lowercase variants are outside the fixed vocabulary.
        assert_eq!(assess("sad").level, StressLevel::Low);
        assert_eq!(assess("angry").level, StressLevel::Low);
    }
}
