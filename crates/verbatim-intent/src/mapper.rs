//! Probabilistic intent fallback.
//!
//! Consulted only for utterances no deterministic rule claimed, and only
//! when they contain a command-like keyword and have a plausible length.
//! The model must return compact JSON; anything malformed degrades to a
//! plain query at low confidence, never an error.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use verbatim_core::json::{first_json_object, str_field};
use verbatim_core::providers::LanguageModel;

use crate::rules::Command;

/// Keywords suggesting the utterance is a command rather than a quote query.
static COMMAND_HINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:reset|clear|start over|register|enroll|my name is|set|change|switch|voice|rate|speed|pace|tempo|volume|louder|quieter|softer|test my voice|list voices|new quote|another quote)\b",
    )
    .expect("valid regex")
});

const INTENT_PROMPT: &str = concat!(
    "You are an intent mapper. Return ONLY compact JSON with this schema: ",
    "{\"intent\":\"<one of: reset, register, provide_name, set_voice, list_voices, test_voice, ",
    "set_rate, bump_rate, set_volume, bump_volume, new_quote, query, smalltalk>\", ",
    "\"slots\":{}, \"confidence\":\"low|medium|high\"}\n",
    "Rules:\n",
    "- Never include explanations, code fences, or extra text.\n",
    "- \"my name is X\" => provide_name, slots={\"name\": X}.\n",
    "- Voice change => set_voice, slots={\"voice\": <name>} (normalize \"jira\"->\"Zira\").\n",
    "- Speed/rate/pace/tempo => set_rate; accept words (slow/fast/very fast) or numbers 80-300.\n",
    "- faster/slower => bump_rate {\"direction\":\"faster|slower\"}.\n",
    "- louder/quieter/softer => bump_volume {\"direction\":\"louder|quieter|softer\"}.\n",
    "- \"new quote\", \"another quote\" => new_quote.\n",
    "- \"reset\", \"clear context\", \"start over\" => reset.\n",
    "- Otherwise use query unless it is pure smalltalk.\n",
    "Respond with JSON only.",
);

const MAX_UTTERANCE_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    fn parse(s: &str) -> Self {
        match s {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

/// A classified intent with its slot values.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentDecision {
    pub intent: String,
    pub slots: Map<String, Value>,
    pub confidence: Confidence,
}

impl IntentDecision {
    /// The degraded default: treat the utterance as a quote query.
    pub fn query() -> Self {
        Self {
            intent: "query".to_string(),
            slots: Map::new(),
            confidence: Confidence::Low,
        }
    }

    pub fn slot(&self, key: &str) -> Option<&str> {
        self.slots.get(key).and_then(Value::as_str).map(str::trim)
    }
}

/// Maps fuzzy command phrasings to intents through the language model.
pub struct IntentMapper {
    llm: Arc<dyn LanguageModel>,
}

impl IntentMapper {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Gate before consulting the model: a command-like keyword, at least
    /// two words, and a bounded length.
    pub fn should_consult(&self, normalized: &str) -> bool {
        COMMAND_HINT_RE.is_match(normalized)
            && normalized.split_whitespace().count() >= 2
            && normalized.len() <= MAX_UTTERANCE_CHARS
    }

    /// Classify an utterance. Model failure or malformed output degrades
    /// to a plain query at low confidence.
    pub fn map(&self, raw: &str) -> IntentDecision {
        let user = format!("User: \"{raw}\"");
        let output = match self.llm.complete(INTENT_PROMPT, &user, 96, 0.2) {
            Ok(o) => o,
            Err(e) => {
                warn!(error = %e, "Intent model call failed; treating as query");
                return IntentDecision::query();
            }
        };
        let Some(obj) = first_json_object(&output) else {
            debug!(output = %output, "Intent model returned no JSON object");
            return IntentDecision::query();
        };

        let intent = {
            let i = str_field(&obj, "intent");
            if i.is_empty() {
                "query".to_string()
            } else {
                i
            }
        };
        let slots = obj
            .get("slots")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let confidence = Confidence::parse(&str_field(&obj, "confidence"));
        debug!(intent = %intent, ?confidence, "Mapped intent");
        IntentDecision {
            intent,
            slots,
            confidence,
        }
    }
}

/// Translate a fallback decision into a dispatchable command. Preference
/// commands are deliberately absent: the deterministic rules already cover
/// them, and acting on fuzzy slot values would be guesswork.
pub fn to_command(decision: &IntentDecision) -> Option<Command> {
    match decision.intent.as_str() {
        "reset" => Some(Command::Reset),
        "register" => Some(Command::Register),
        "provide_name" => Some(Command::ProvideName(
            decision
                .slot("name")
                .filter(|n| !n.is_empty())
                .map(String::from),
        )),
        "new_quote" => Some(Command::NewQuote),
        _ => None,
    }
}
