//! facesay-core — face report pipeline.
//!
//! Pure transformation from provider-produced face records into the
//! on-screen report and the spoken summary, plus the stress heuristic
//! and the traits both provider stacks implement.

pub mod report;
pub mod stress;
pub mod types;

pub use report::Report;
pub use stress::{assess, StressAssessment, StressLevel};
pub use types::{
    AgeEstimate, EmotionReading, EmotionScore, FaceAttributeSource, FaceRecord, GroomingFlags,
    ImageRef, ProviderError, SpeechPresenter,
};
