use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, VerbatimError};

/// Top-level configuration for the Verbatim assistant.
///
/// Loaded from `~/.verbatim/config.toml` by default. Each section covers one
/// subsystem or cross-cutting concern. Startup uses the strict [`load`];
/// a missing or unparseable file at startup is a fatal configuration error
/// (per-turn code never reloads configuration).
///
/// [`load`]: VerbatimConfig::load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbatimConfig {
    pub general: GeneralConfig,
    pub asr: AsrConfig,
    pub speaker: SpeakerConfig,
    pub retrieval: RetrievalConfig,
    pub tts: TtsConfig,
    pub intent: IntentConfig,
    pub api: ApiConfig,
}

impl VerbatimConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VerbatimConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not
    /// exist or cannot be parsed. Used by tooling, never by startup.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VerbatimError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the speaker and preference stores.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.verbatim/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AsrConfig {
    /// Language hint passed to the provider; "auto" means detect.
    pub language: String,
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
        }
    }
}

/// Speaker identification and session-routing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerConfig {
    /// Whether speaker identification is enabled at all.
    pub enabled: bool,
    /// Cosine-similarity acceptance threshold for identification.
    pub threshold: f32,
    /// Utterances shorter than this are never identified (seconds).
    pub min_duration_secs: f32,
    /// Short-utterance cutoff for sticky speaker reuse (seconds).
    pub sticky_short_secs: f32,
    /// How long a prior recognition stays reusable for short clips (seconds).
    pub sticky_ttl_secs: f32,
    /// Extended reuse window for follow-up-shaped utterances (seconds).
    pub long_sticky_ttl_secs: f32,
    /// Minimum utterance duration that alone justifies a session switch.
    pub switch_min_secs: f32,
    /// Minimum similarity score that alone justifies a session switch.
    pub switch_min_score: f32,
    /// Window in which a bare "register" re-enrolls the last recognized
    /// identity directly (seconds).
    pub recent_recognition_secs: f32,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.65,
            min_duration_secs: 0.8,
            sticky_short_secs: 0.9,
            sticky_ttl_secs: 18.0,
            long_sticky_ttl_secs: 90.0,
            switch_min_secs: 1.2,
            switch_min_score: 0.66,
            recent_recognition_secs: 10.0,
        }
    }
}

/// Retrieval engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Name of the full-text index to query.
    pub index_name: String,
    /// Default result count.
    pub k: usize,
    /// Raw-score floor below which index hits are discarded.
    pub min_score: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            index_name: "quoteTextFT".to_string(),
            k: 5,
            min_score: 3.0,
        }
    }
}

/// Default text-to-speech settings used for identities without saved prefs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Default engine voice id ("" = engine default).
    pub voice: String,
    /// Default speaking rate in words per minute.
    pub rate: u32,
    /// Default volume.
    pub volume: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            voice: String::new(),
            rate: 185,
            volume: 1.0,
        }
    }
}

/// Intent dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    /// Whether the probabilistic LLM fallback classifier is consulted when
    /// no deterministic rule matches.
    pub llm_fallback: bool,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self { llm_fallback: true }
    }
}

/// Read-only lookup API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Whether to serve the lookup endpoint.
    pub enabled: bool,
    /// Listen port.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 3040,
        }
    }
}
