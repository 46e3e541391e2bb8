use thiserror::Error;

/// Top-level error type for the Verbatim system.
///
/// Each variant corresponds to a failure class from one subsystem. Subsystem
/// crates return `VerbatimError` directly so the `?` operator works across
/// crate boundaries without per-crate conversion boilerplate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VerbatimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ASR returned an empty transcript")]
    EmptyTranscript,

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Speaker identification error: {0}")]
    Speaker(String),

    #[error("Enrollment sample failed: {0}")]
    EnrollmentSample(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Search index error: {0}")]
    Index(String),

    #[error("Model output not parseable: {0}")]
    ModelOutput(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Store corrupt at {path}: {detail}")]
    StoreCorrupt { path: String, detail: String },

    #[error("Speech output error: {0}")]
    Tts(String),

    #[error("Provider call timed out: {0}")]
    Timeout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for VerbatimError {
    fn from(err: toml::de::Error) -> Self {
        VerbatimError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VerbatimError {
    fn from(err: toml::ser::Error) -> Self {
        VerbatimError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for VerbatimError {
    fn from(err: serde_json::Error) -> Self {
        VerbatimError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Verbatim operations.
pub type Result<T> = std::result::Result<T, VerbatimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VerbatimError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_empty_transcript_display() {
        assert_eq!(
            VerbatimError::EmptyTranscript.to_string(),
            "ASR returned an empty transcript"
        );
    }

    #[test]
    fn test_store_corrupt_names_path() {
        let err = VerbatimError::StoreCorrupt {
            path: "/data/speakers.json".to_string(),
            detail: "expected object".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/speakers.json"));
        assert!(msg.contains("expected object"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VerbatimError = io_err.into();
        assert!(matches!(err, VerbatimError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let err: VerbatimError = parsed.unwrap_err().into();
        assert!(matches!(err, VerbatimError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let parsed: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{ invalid json }");
        let err: VerbatimError = parsed.unwrap_err().into();
        assert!(matches!(err, VerbatimError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }
        assert_eq!(inner().unwrap(), "success");
    }
}
