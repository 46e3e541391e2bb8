//! Shared domain types for the quote assistant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default TTS speaking rate in words per minute.
pub const DEFAULT_RATE: u32 = 185;
/// Default TTS volume.
pub const DEFAULT_VOLUME: f32 = 1.0;

/// How a person relates to a quote in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "SAID_BY")]
    SaidBy,
    #[serde(rename = "ABOUT")]
    About,
    #[serde(rename = "MISATTRIBUTED_TO")]
    MisattributedTo,
    #[serde(rename = "DISPUTED_WITH")]
    DisputedWith,
}

impl Relation {
    /// Wire name as stored in the index.
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::SaidBy => "SAID_BY",
            Relation::About => "ABOUT",
            Relation::MisattributedTo => "MISATTRIBUTED_TO",
            Relation::DisputedWith => "DISPUTED_WITH",
        }
    }
}

/// A `(relation, person)` pair attached to a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    #[serde(rename = "relation")]
    pub relation: Relation,
    pub name: String,
}

impl PersonRef {
    pub fn new(relation: Relation, name: impl Into<String>) -> Self {
        Self {
            relation,
            name: name.into(),
        }
    }
}

/// A grounded quote answer: the one fact a session remembers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteFact {
    /// Quote text verbatim.
    pub quote: String,
    /// Source string (book, speech, collection).
    pub source: String,
    /// Heading or surrounding context from the corpus.
    pub heading_context: String,
    /// Ordered relation pairs for this quote.
    pub people: Vec<PersonRef>,
    /// Raw index score of the match that produced this fact.
    pub score: f64,
}

impl QuoteFact {
    /// Names attached via the given relation, in corpus order.
    pub fn names(&self, relation: Relation) -> Vec<&str> {
        self.people
            .iter()
            .filter(|p| p.relation == relation && !p.name.is_empty())
            .map(|p| p.name.as_str())
            .collect()
    }
}

/// A single hit returned by the external search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    pub id: String,
    pub quote: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub heading_context: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub people: Vec<PersonRef>,
    pub score: f64,
}

impl IndexHit {
    /// Convert a hit into the fact shape stored in session memory.
    pub fn into_fact(self) -> QuoteFact {
        QuoteFact {
            quote: self.quote,
            source: self.source,
            heading_context: self.heading_context,
            people: self.people,
            score: self.score,
        }
    }
}

/// A pooled, scored retrieval candidate prior to final selection.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub hit: IndexHit,
    /// Maximum raw index score observed across query variants.
    pub raw_score: f64,
    /// Composite re-rank score; filled in after pooling.
    pub rerank_score: f64,
}

/// Per-identity voice output preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoicePrefs {
    /// Engine voice id, or empty for the engine default.
    pub voice: String,
    /// Speaking rate in words per minute (valid 80..=300).
    pub rate: u32,
    /// Output volume (valid 0.0..=1.0).
    pub volume: f32,
}

impl Default for VoicePrefs {
    fn default() -> Self {
        Self {
            voice: String::new(),
            rate: DEFAULT_RATE,
            volume: DEFAULT_VOLUME,
        }
    }
}

/// Opaque audio handle passed to external providers.
///
/// Capture itself is out of scope; the orchestration layer only carries the
/// samples from the capture boundary to the ASR/embedding providers.
#[derive(Debug, Clone, Default)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Clip duration in seconds; zero when the sample rate is unknown.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// One captured user turn as it enters the orchestration layer.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Raw transcript, possibly empty until ASR has run.
    pub text: String,
    /// Audio handle, absent for text-only turns (tests, typed input).
    pub clip: Option<AudioClip>,
    /// Measured duration in seconds.
    pub duration_secs: f32,
    /// Arrival timestamp.
    pub arrived: DateTime<Utc>,
}

impl Utterance {
    /// Build an utterance from a captured clip; duration is measured from
    /// the samples.
    pub fn from_clip(clip: AudioClip) -> Self {
        let duration_secs = clip.duration_secs();
        Self {
            text: String::new(),
            clip: Some(clip),
            duration_secs,
            arrived: Utc::now(),
        }
    }

    /// Build a text-only utterance (typed input and tests).
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            clip: None,
            duration_secs: 0.0,
            arrived: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_wire_names() {
        assert_eq!(Relation::SaidBy.as_str(), "SAID_BY");
        assert_eq!(Relation::About.as_str(), "ABOUT");
        assert_eq!(Relation::MisattributedTo.as_str(), "MISATTRIBUTED_TO");
        assert_eq!(Relation::DisputedWith.as_str(), "DISPUTED_WITH");
    }

    #[test]
    fn test_relation_serde_round_trip() {
        let json = serde_json::to_string(&Relation::SaidBy).unwrap();
        assert_eq!(json, "\"SAID_BY\"");
        let back: Relation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Relation::SaidBy);
    }

    #[test]
    fn test_fact_names_filters_by_relation() {
        let fact = QuoteFact {
            quote: "Two things are infinite".to_string(),
            source: String::new(),
            heading_context: String::new(),
            people: vec![
                PersonRef::new(Relation::SaidBy, "Albert Einstein"),
                PersonRef::new(Relation::About, "The Universe"),
                PersonRef::new(Relation::SaidBy, ""),
            ],
            score: 7.5,
        };
        assert_eq!(fact.names(Relation::SaidBy), vec!["Albert Einstein"]);
        assert_eq!(fact.names(Relation::About), vec!["The Universe"]);
        assert!(fact.names(Relation::DisputedWith).is_empty());
    }

    #[test]
    fn test_voice_prefs_defaults() {
        let prefs = VoicePrefs::default();
        assert_eq!(prefs.voice, "");
        assert_eq!(prefs.rate, 185);
        assert_eq!(prefs.volume, 1.0);
    }

    #[test]
    fn test_voice_prefs_partial_deserialize_uses_defaults() {
        let prefs: VoicePrefs = serde_json::from_str(r#"{"rate": 210}"#).unwrap();
        assert_eq!(prefs.rate, 210);
        assert_eq!(prefs.voice, "");
        assert_eq!(prefs.volume, 1.0);
    }

    #[test]
    fn test_clip_duration() {
        let clip = AudioClip::new(vec![0.0; 16_000], 16_000);
        assert!((clip.duration_secs() - 1.0).abs() < f32::EPSILON);
        let empty = AudioClip::new(vec![], 0);
        assert_eq!(empty.duration_secs(), 0.0);
    }

    #[test]
    fn test_utterance_from_clip_measures_duration() {
        let utt = Utterance::from_clip(AudioClip::new(vec![0.0; 8_000], 16_000));
        assert!((utt.duration_secs - 0.5).abs() < 1e-6);
        assert!(utt.text.is_empty());
    }

    #[test]
    fn test_index_hit_into_fact() {
        let hit = IndexHit {
            id: "q1".to_string(),
            quote: "quote text".to_string(),
            source: "src".to_string(),
            heading_context: "ctx".to_string(),
            status: "verified".to_string(),
            people: vec![PersonRef::new(Relation::SaidBy, "A")],
            score: 4.2,
        };
        let fact = hit.into_fact();
        assert_eq!(fact.quote, "quote text");
        assert_eq!(fact.source, "src");
        assert_eq!(fact.score, 4.2);
        assert_eq!(fact.people.len(), 1);
    }

    #[test]
    fn test_index_hit_deserialize_missing_optionals() {
        let hit: IndexHit =
            serde_json::from_str(r#"{"id":"x","quote":"text","score":1.0}"#).unwrap();
        assert!(hit.people.is_empty());
        assert!(hit.source.is_empty());
    }
}
