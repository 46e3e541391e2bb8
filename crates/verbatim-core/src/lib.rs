//! Core types, configuration, and provider interfaces for Verbatim.
//!
//! Everything here is shared across the workspace: the error type, the
//! TOML configuration, the domain model (utterances, quote facts, voice
//! preferences, retrieval candidates), and the narrow trait boundaries to
//! the external ASR/TTS/embedding/LLM/search-index providers.

pub mod config;
pub mod error;
pub mod json;
pub mod providers;
pub mod types;

pub use config::VerbatimConfig;
pub use error::{Result, VerbatimError};
pub use providers::{
    AsrProvider, CaptureSource, EmbeddingProvider, LanguageModel, NullAsr, NullCapture,
    NullEmbedding, NullLanguageModel, NullTts, SearchIndex, TtsProvider,
};
pub use types::*;
