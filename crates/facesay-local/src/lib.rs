//! facesay-local — on-device face analysis with ONNX Runtime.
//!
//! Three models run per image: UltraFace for detection, a 7-class
//! emotion classifier, and a combined age/gender estimator. All records
//! come back with exact ages and resolved emotion labels.

pub mod analyzer;
pub mod attributes;
pub mod detector;

pub use analyzer::{model_paths, AnalyzerError, LocalFaceSource};
pub use attributes::{AttributeError, AttributeExtractor, FaceAttributes};
pub use detector::{DetectorError, FaceBox, FaceDetector};
