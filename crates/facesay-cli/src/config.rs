use std::path::PathBuf;

/// Which backend analyzes images and speaks the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Cloud,
    Local,
}

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// Backend selection (default: cloud).
    pub provider: ProviderKind,
    /// Base URL of the cloud analysis/speech gateway.
    pub cloud_endpoint: String,
    /// API key sent with every cloud request.
    pub cloud_api_key: String,
    /// Storage bucket image keys are resolved against.
    pub cloud_bucket: String,
    /// Storage region, reported by `doctor`.
    pub cloud_region: String,
    /// Voice used by cloud speech synthesis.
    pub voice: String,
    /// Where synthesized audio lands; overwritten per utterance.
    pub speech_output: PathBuf,
    /// Directory containing ONNX model files for the local provider.
    pub model_dir: PathBuf,
}

impl Config {
    /// Load configuration from `FACESAY_*` environment variables with
    /// defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("FACESAY_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_model_dir());

        Self {
            provider: provider_kind(
                &std::env::var("FACESAY_PROVIDER").unwrap_or_else(|_| "cloud".to_string()),
            ),
            cloud_endpoint: env_string("FACESAY_CLOUD_ENDPOINT", ""),
            cloud_api_key: env_string("FACESAY_CLOUD_API_KEY", ""),
            cloud_bucket: env_string("FACESAY_CLOUD_BUCKET", "face-reports"),
            cloud_region: env_string("FACESAY_CLOUD_REGION", "us-east-2"),
            voice: env_string("FACESAY_VOICE", "Joanna"),
            speech_output: std::env::var("FACESAY_SPEECH_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("speech_output.mp3")),
            model_dir,
        }
    }
}

/// Anything other than "local" (case-insensitive) selects the cloud
/// provider.
pub fn provider_kind(value: &str) -> ProviderKind {
    if value.eq_ignore_ascii_case("local") {
        ProviderKind::Local
    } else {
        ProviderKind::Cloud
    }
}

fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facesay/models")
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_defaults_to_cloud() {
        assert_eq!(provider_kind("cloud"), ProviderKind::Cloud);
        assert_eq!(provider_kind(""), ProviderKind::Cloud);
        assert_eq!(provider_kind("anything"), ProviderKind::Cloud);
    }

    #[test]
    fn test_provider_kind_local_is_case_insensitive() {
        assert_eq!(provider_kind("local"), ProviderKind::Local);
        assert_eq!(provider_kind("LOCAL"), ProviderKind::Local);
        assert_eq!(provider_kind("Local"), ProviderKind::Local);
    }
}
