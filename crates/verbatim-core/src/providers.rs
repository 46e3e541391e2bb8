//! Narrow trait interfaces to external capability providers.
//!
//! The orchestration layer never talks to a model or an index directly; it
//! goes through these traits. Every call is blocking, and implementations
//! are expected to bound their own latency — call sites translate any
//! provider error (timeouts included) into a per-site safe default rather
//! than letting a turn stall or crash.
//!
//! Optional capabilities (speaker identification, the probabilistic intent
//! fallback) use the `Null*` implementations below when disabled, selected
//! once at construction time.

use tracing::debug;

use crate::error::{Result, VerbatimError};
use crate::types::{AudioClip, IndexHit, VoicePrefs};

/// Corpus lookup over a full-text index.
///
/// Results come back ordered by descending raw score. A failed query is an
/// error; the retrieval engine decides whether that aborts anything.
pub trait SearchIndex: Send + Sync {
    fn query(&self, index_name: &str, query: &str, limit: usize) -> Result<Vec<IndexHit>>;
}

/// Speech-to-text with deterministic decoding.
///
/// The fast mode trades accuracy for latency and is used for command
/// detection; the full mode is used for quote text.
pub trait AsrProvider: Send + Sync {
    fn transcribe_fast(&self, clip: &AudioClip, language: Option<&str>) -> Result<String>;
    fn transcribe(&self, clip: &AudioClip, language: Option<&str>) -> Result<String>;
}

/// Synchronous text-to-speech rendering.
pub trait TtsProvider: Send + Sync {
    fn speak(&self, text: &str, prefs: &VoicePrefs) -> Result<()>;

    /// Installed voices as `(id, display name)` pairs.
    fn list_voices(&self) -> Result<Vec<(String, String)>>;

    /// Resolve a requested voice by case-insensitive substring match against
    /// id and display name.
    fn resolve_voice(&self, requested: &str) -> Result<Option<(String, String)>> {
        let want = requested.trim().to_lowercase();
        if want.is_empty() {
            return Ok(None);
        }
        Ok(self.list_voices()?.into_iter().find(|(id, name)| {
            id.to_lowercase().contains(&want) || name.to_lowercase().contains(&want)
        }))
    }
}

/// Speaker-embedding model: audio in, unit-length vector out.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, clip: &AudioClip) -> Result<Vec<f32>>;

    /// Embedding dimensionality.
    fn dim(&self) -> usize;

    /// Whether the provider can serve requests at all. Enrollment aborts
    /// when this is false; identification degrades to "no identity".
    fn is_available(&self) -> bool {
        true
    }
}

/// Source of captured audio at the capture boundary. Capture itself lives
/// outside the orchestration layer; enrollment uses this to collect its
/// scripted samples.
pub trait CaptureSource: Send + Sync {
    fn record(&self) -> Result<AudioClip>;
}

/// Generative language model used for fragment extraction, intent mapping
/// and the constrained free-form rephrase.
pub trait LanguageModel: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: usize,
        temperature: f32,
    ) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Null implementations for disabled capabilities
// ---------------------------------------------------------------------------

/// No-op TTS: logs the utterance instead of rendering it.
pub struct NullTts;

impl TtsProvider for NullTts {
    fn speak(&self, text: &str, _prefs: &VoicePrefs) -> Result<()> {
        debug!(text, "TTS disabled; dropping utterance");
        Ok(())
    }

    fn list_voices(&self) -> Result<Vec<(String, String)>> {
        Ok(Vec::new())
    }
}

/// ASR stand-in for text-only deployments. Turns arriving with a transcript
/// already attached never reach it.
pub struct NullAsr;

impl AsrProvider for NullAsr {
    fn transcribe_fast(&self, _clip: &AudioClip, _language: Option<&str>) -> Result<String> {
        Err(VerbatimError::ProviderUnavailable(
            "speech recognition is not available".to_string(),
        ))
    }

    fn transcribe(&self, _clip: &AudioClip, _language: Option<&str>) -> Result<String> {
        Err(VerbatimError::ProviderUnavailable(
            "speech recognition is not available".to_string(),
        ))
    }
}

/// Capture stand-in for text-only deployments.
pub struct NullCapture;

impl CaptureSource for NullCapture {
    fn record(&self) -> Result<AudioClip> {
        Err(VerbatimError::ProviderUnavailable(
            "audio capture is not available".to_string(),
        ))
    }
}

/// Embedding provider stand-in when speaker identification is disabled.
pub struct NullEmbedding;

impl EmbeddingProvider for NullEmbedding {
    fn embed(&self, _clip: &AudioClip) -> Result<Vec<f32>> {
        Err(VerbatimError::ProviderUnavailable(
            "speaker identification is disabled".to_string(),
        ))
    }

    fn dim(&self) -> usize {
        0
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Language model stand-in when the probabilistic fallback is disabled.
pub struct NullLanguageModel;

impl LanguageModel for NullLanguageModel {
    fn complete(&self, _system: &str, _user: &str, _max: usize, _temp: f32) -> Result<String> {
        Err(VerbatimError::ProviderUnavailable(
            "language model is disabled".to_string(),
        ))
    }
}
