//! facesay-cloud — remote face analysis and speech synthesis.
//!
//! Both clients speak a Rekognition/Polly-style JSON wire contract over
//! HTTPS with key-header auth; request signing is the gateway's concern.

pub mod faces;
pub mod speech;

pub use faces::{CloudFaceConfig, CloudFaceError, CloudFaceSource};
pub use speech::{CloudSpeechConfig, CloudSpeechError, CloudSpeechPresenter};
