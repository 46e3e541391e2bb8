//! Speaker identification and session routing.
//!
//! Identification turns an utterance into an identity with a confidence
//! score. Routing decides which session a turn belongs to: a recognized
//! speaker only takes over the active session when a switch rule is met,
//! and short or follow-up-shaped utterances stick to the last recognized
//! speaker instead of being treated as anonymous.

use std::sync::{Arc, LazyLock, RwLock};
use std::time::Instant;

use regex::Regex;
use tracing::{debug, info, warn};

use verbatim_core::config::SpeakerConfig;
use verbatim_core::providers::EmbeddingProvider;
use verbatim_core::types::Utterance;

use crate::profile::SpeakerRegistry;

/// Session used when nobody is recognized; never a switch target.
pub const DEFAULT_SESSION: &str = "default";

/// Whole-utterance self-introduction: "This is John", "I am Jane Doe".
/// Deliberately strict (capitalized name, nothing after it) so ordinary
/// questions starting with "I am" never read as a switch request.
static SELF_HINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[Tt]his\s+is|[Ii]\s+am)\s+(?P<name>[A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})\s*[.,!?]?\s*$")
        .expect("valid regex")
});

/// Follow-up-shaped questions that refer back to an earlier answer.
static FOLLOWUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:who\s+said|who\s+wrote|about\s+whom|source|citation|finish|complete|when|disputed|misattributed)\b")
        .expect("valid regex")
});

/// The name from a whole-utterance self-introduction, if any.
pub fn self_announced_name(text: &str) -> Option<String> {
    SELF_HINT_RE
        .captures(text.trim())
        .map(|c| c["name"].to_string())
}

/// Whether the utterance looks like a follow-up to a previous answer.
pub fn is_followup_shaped(text: &str) -> bool {
    FOLLOWUP_RE.is_match(text)
}

/// An identified (or stickily reused) speaker for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub name: String,
    /// Cosine score from identification; absent when the identity was
    /// reused from stickiness rather than matched.
    pub score: Option<f32>,
}

/// Mutable routing state carried across turns. One record, no globals.
#[derive(Debug, Clone)]
pub struct RouterState {
    /// Whose session context the current turn uses.
    pub active_session: String,
    /// Whether the next turn is expected to be "my name is ...".
    pub pending_enroll: bool,
    last_recognized: Option<(String, Instant)>,
}

impl Default for RouterState {
    fn default() -> Self {
        Self {
            active_session: DEFAULT_SESSION.to_string(),
            pending_enroll: false,
            last_recognized: None,
        }
    }
}

impl RouterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_recognition(&mut self, name: &str, now: Instant) {
        self.last_recognized = Some((name.to_string(), now));
    }

    /// The last recognized identity, if seen within the window.
    pub fn recognized_within(&self, window_secs: f32, now: Instant) -> Option<String> {
        let (name, at) = self.last_recognized.as_ref()?;
        let age = now.duration_since(*at).as_secs_f32();
        (age < window_secs).then(|| name.clone())
    }

    pub fn last_recognized_name(&self) -> Option<&str> {
        self.last_recognized.as_ref().map(|(n, _)| n.as_str())
    }

    /// Drop back to the default session. Recognition history is kept so
    /// stickiness still works if the same speaker continues talking.
    pub fn logout(&mut self) {
        self.active_session = DEFAULT_SESSION.to_string();
    }
}

/// Identifies speakers and applies the session-switch and stickiness policy.
pub struct SpeakerRouter {
    registry: RwLock<SpeakerRegistry>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: SpeakerConfig,
}

impl SpeakerRouter {
    pub fn new(
        registry: SpeakerRegistry,
        embedder: Arc<dyn EmbeddingProvider>,
        config: SpeakerConfig,
    ) -> Self {
        Self {
            registry: RwLock::new(registry),
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &SpeakerConfig {
        &self.config
    }

    /// Whether identification can run at all this session.
    pub fn enabled(&self) -> bool {
        self.config.enabled && self.embedder.is_available()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.read().map(|r| r.contains(name)).unwrap_or(false)
    }

    pub fn known_names(&self) -> Vec<String> {
        self.registry
            .read()
            .map(|r| r.names().into_iter().map(String::from).collect())
            .unwrap_or_default()
    }

    pub(crate) fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    pub(crate) fn with_registry_mut<T>(&self, f: impl FnOnce(&mut SpeakerRegistry) -> T) -> Option<T> {
        self.registry.write().ok().map(|mut r| f(&mut r))
    }

    /// Identify the speaker of an utterance.
    ///
    /// Returns nothing for disabled identification, clips shorter than the
    /// duration gate, embedding failures, and scores below the threshold.
    /// Identification failure degrades the turn, never fails it.
    pub fn identify(&self, utterance: &Utterance) -> Option<Recognition> {
        if !self.enabled() {
            return None;
        }
        let clip = utterance.clip.as_ref()?;
        if utterance.duration_secs < self.config.min_duration_secs {
            debug!(
                duration = utterance.duration_secs,
                "Clip too short to identify"
            );
            return None;
        }
        let embedding = match self.embedder.embed(clip) {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "Speaker embedding failed; treating turn as anonymous");
                return None;
            }
        };
        let registry = self.registry.read().ok()?;
        let (name, score) = registry.best_match(&embedding)?;
        debug!(name, score, "Best speaker match");
        if score >= self.config.threshold {
            Some(Recognition {
                name: name.to_string(),
                score: Some(score),
            })
        } else {
            None
        }
    }

    /// Identify with short-clip stickiness: a clip too short to identify
    /// reuses the last recognized speaker while the sticky window holds.
    /// A fresh recognition updates the recognition tracker.
    pub fn resolve_identity(
        &self,
        state: &mut RouterState,
        utterance: &Utterance,
        now: Instant,
    ) -> Option<Recognition> {
        if let Some(rec) = self.identify(utterance) {
            state.note_recognition(&rec.name, now);
            return Some(rec);
        }
        if utterance.duration_secs < self.config.sticky_short_secs {
            if let Some(name) = state.recognized_within(self.config.sticky_ttl_secs, now) {
                debug!(
                    duration = utterance.duration_secs,
                    name, "Short clip; sticking to last recognized speaker"
                );
                return Some(Recognition { name, score: None });
            }
        }
        None
    }

    /// Reuse the last recognized speaker for an unidentified follow-up
    /// question, within the extended sticky window.
    pub fn followup_rescue(
        &self,
        state: &RouterState,
        text: &str,
        now: Instant,
    ) -> Option<Recognition> {
        if !is_followup_shaped(text) {
            return None;
        }
        let name = state.recognized_within(self.config.long_sticky_ttl_secs, now)?;
        debug!(name, "Follow-up rescue; sticking to last recognized speaker");
        Some(Recognition { name, score: None })
    }

    /// Switch the active session to the recognized speaker when a switch
    /// rule is met: confident score, long enough speech, or a
    /// whole-utterance self-introduction naming them. Never switches to the
    /// default session or to the already-active one.
    pub fn maybe_switch(
        &self,
        state: &mut RouterState,
        recognition: &Recognition,
        duration_secs: f32,
        text: &str,
    ) -> bool {
        let name = &recognition.name;
        if name.eq_ignore_ascii_case(DEFAULT_SESSION) || *name == state.active_session {
            return false;
        }
        let by_score = recognition
            .score
            .is_some_and(|s| s >= self.config.switch_min_score);
        let by_duration = duration_secs >= self.config.switch_min_secs;
        let by_hint = self_announced_name(text)
            .is_some_and(|hint| name.to_lowercase().contains(&hint.to_lowercase()));

        if by_score || by_duration || by_hint {
            info!(
                from = %state.active_session,
                to = %name,
                by_score,
                by_duration,
                by_hint,
                "Switching active session"
            );
            state.active_session = name.clone();
            state.note_recognition(name, Instant::now());
            true
        } else {
            debug!(
                candidate = %name,
                "Not switching; need longer speech, a higher score, or a self-introduction"
            );
            false
        }
    }
}
