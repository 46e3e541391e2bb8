//! The quote-answering flow for one session turn.
//!
//! A turn either acknowledges smalltalk, finds a new quote from an
//! extracted fragment, answers a follow-up from session memory, or asks
//! the user for a few words of the quote. Retrieval is grounded: replies
//! come from the matched fact's fields, with the model used only for
//! fragment extraction and the rare constrained rephrase.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use verbatim_core::json::{first_json_object, str_field};
use verbatim_core::providers::LanguageModel;
use verbatim_retrieval::RetrievalEngine;

use crate::facts::{answer_from_fact, FactAnswer};
use crate::session::SessionStore;

static ACK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:thanks|thank you|ok|okay|hmm|huh|great|nice)\.?$").expect("valid regex")
});
static NEW_QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:new|another|different)\s+quote\b|\bfind\s+me\s+(?:a|another)\s+quote\b")
        .expect("valid regex")
});
/// Command and filler words stripped from an extracted fragment before the
/// minimum-length check.
static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:new|another|different)\s+quote\b|\b(?:find|search|look up|complete|finish|continue|tell me|who said|source)\b[: ]?",
    )
    .expect("valid regex")
});
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

/// Follow-up phrasings that must never be treated as fragment text.
const FOLLOWUP_SKIP: [&str; 4] = [
    "who said this",
    "who said that",
    "who said it",
    "who wrote this",
];

const SYSTEM_EXTRACT: &str = concat!(
    "You are a precise span extractor. Return ONLY JSON: {\"fragment\": string}.\n",
    "Goal: extract ONLY the quote fragment to search for (not commands or author names).\n",
    "Remove command words: new quote, another quote, different quote, find, search, look up, ",
    "complete, finish, continue, tell me, who said, source.\n",
    "Do NOT include author names or sources. Do NOT include trailing punctuation.\n",
    "If you cannot find at least 3 meaningful words of the quote, return {\"fragment\": \"\"}.\n",
    "\nExamples:\n",
    "Q: Find the quote: Albert Einstein was almost considered as a superhuman.\n",
    "A: {\"fragment\": \"Albert Einstein was almost considered as a superhuman\"}\n",
    "Q: Complete this new quote as an eminent pioneer in the realm of high.\n",
    "A: {\"fragment\": \"as an eminent pioneer in the realm of high\"}\n",
    "Q: Who said this? \"Two things are infinite...\"\n",
    "A: {\"fragment\": \"Two things are infinite\"}\n",
    "No extra text.",
);

const SYSTEM_REPHRASE: &str = concat!(
    "You are a quotes assistant.\n",
    "Answer ONLY from the facts provided below.\n",
    "Be concise but do NOT invent missing text.\n",
    "If there is a quote text, prefer outputting the quote verbatim.",
);

const NOT_FOUND_REPLY: &str = "I couldn't find that exact quote.";
const CLARIFY_REPLY: &str = "Give me a few words from the quote you have in mind.";
const ACK_REPLY: &str = "Thank You";

/// Strip quote marks and edge punctuation around a fragment.
fn trim_fragment(s: &str) -> &str {
    s.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '\u{201c}' | '\u{201d}' | '"' | '\'' | '.' | ',' | ':' | ';' | '!' | '?' | '-')
    })
}

/// Per-session quote dialogue over the retrieval engine.
pub struct DialogueManager {
    sessions: SessionStore,
    retrieval: RetrievalEngine,
    llm: Arc<dyn LanguageModel>,
}

impl DialogueManager {
    pub fn new(retrieval: RetrievalEngine, llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            sessions: SessionStore::new(),
            retrieval,
            llm,
        }
    }

    /// Clear one session's context.
    pub fn clear(&mut self, session_id: &str) {
        self.sessions.clear(session_id);
    }

    pub fn has_context(&self, session_id: &str) -> bool {
        self.sessions.last_fact(session_id).is_some()
    }

    /// Answer one user turn for the given session.
    pub fn handle_turn(&mut self, session_id: &str, transcript: &str) -> String {
        let text = transcript.trim();
        if text.is_empty() {
            return CLARIFY_REPLY.to_string();
        }

        if ACK_RE.is_match(text) {
            return ACK_REPLY.to_string();
        }

        if NEW_QUOTE_RE.is_match(text) {
            debug!(session = session_id, "New quote requested; clearing context");
            self.sessions.clear(session_id);
        }

        let fragment = self.extract_fragment(text);
        if !fragment.is_empty() {
            return match self.retrieval.search_best(&fragment) {
                Some(candidate) => {
                    let fact = candidate.hit.into_fact();
                    let reply = match answer_from_fact(text, &fact) {
                        FactAnswer::Direct(s) => s,
                        FactAnswer::NeedsRephrase => self.rephrase(text, &fact),
                    };
                    self.sessions.get_mut(session_id).last_fact = Some(fact);
                    reply
                }
                None => NOT_FOUND_REPLY.to_string(),
            };
        }

        if let Some(fact) = self.sessions.last_fact(session_id).cloned() {
            return match answer_from_fact(text, &fact) {
                FactAnswer::Direct(s) => s,
                FactAnswer::NeedsRephrase => self.rephrase(text, &fact),
            };
        }

        CLARIFY_REPLY.to_string()
    }

    /// Pull a searchable quote fragment out of the utterance.
    ///
    /// Pure follow-ups are skipped outright. The model's extraction is
    /// cleaned of command words and quote marks and must keep at least
    /// three word tokens; anything less means "no fragment". Model failure
    /// also means "no fragment", which falls back to session memory.
    fn extract_fragment(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        if FOLLOWUP_SKIP.iter().any(|p| lower.contains(p)) {
            debug!("Fragment extraction skipped for follow-up");
            return String::new();
        }

        let output = match self.llm.complete(SYSTEM_EXTRACT, text, 64, 0.0) {
            Ok(o) => o,
            Err(e) => {
                warn!(error = %e, "Fragment extraction failed; falling back to session memory");
                return String::new();
            }
        };
        let fragment = first_json_object(&output)
            .map(|v| str_field(&v, "fragment"))
            .unwrap_or_default();
        let fragment = trim_fragment(&fragment);
        let fragment = NOISE_RE.replace_all(fragment, "");
        let fragment = trim_fragment(&fragment).to_string();

        if WORD_RE.find_iter(&fragment).count() >= 3 {
            debug!(fragment = %fragment, "Extracted fragment");
            fragment
        } else {
            String::new()
        }
    }

    /// Constrained free-form answer for a fact with no quote text.
    fn rephrase(&self, question: &str, fact: &verbatim_core::types::QuoteFact) -> String {
        let relations = fact
            .people
            .iter()
            .filter(|p| !p.name.is_empty())
            .map(|p| format!("- {}: {}", p.relation.as_str(), p.name))
            .collect::<Vec<_>>()
            .join("\n");
        let user = format!(
            "Quote: {}\nSource: {}\nConnections:\n{}\n\nUser question: {}\nYour answer:",
            fact.quote,
            fact.source,
            if relations.is_empty() { "(none)" } else { &relations },
            question
        );
        match self.llm.complete(SYSTEM_REPHRASE, &user, 128, 0.2) {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            Ok(_) | Err(_) => {
                if fact.source.trim().is_empty() {
                    "I don't have more detail on that quote.".to_string()
                } else {
                    fact.source.trim().to_string()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use verbatim_core::config::RetrievalConfig;
    use verbatim_core::error::Result;
    use verbatim_retrieval::{MemoryIndex, QuoteDoc};

    use verbatim_core::types::{PersonRef, Relation};

    /// Extractor stub: returns the text between "echo<" and ">" as the
    /// fragment, or empty JSON otherwise.
    struct EchoExtractor;

    impl LanguageModel for EchoExtractor {
        fn complete(&self, system: &str, user: &str, _m: usize, _t: f32) -> Result<String> {
            if system.contains("span extractor") {
                let fragment = user
                    .split_once("echo<")
                    .and_then(|(_, rest)| rest.split_once('>'))
                    .map(|(frag, _)| frag)
                    .unwrap_or("");
                return Ok(format!("{{\"fragment\": \"{fragment}\"}}"));
            }
            Ok("rephrased answer".to_string())
        }
    }

    fn corpus() -> MemoryIndex {
        let index = MemoryIndex::new();
        index.add(QuoteDoc {
            id: "q1".to_string(),
            quote: "Two things are infinite: the universe and human stupidity.".to_string(),
            source: "Gestalt Therapy (1951)".to_string(),
            heading_context: String::new(),
            status: String::new(),
            people: vec![PersonRef::new(Relation::SaidBy, "Albert Einstein")],
        });
        index
    }

    fn manager() -> DialogueManager {
        let engine = RetrievalEngine::new(Arc::new(corpus()), RetrievalConfig::default());
        DialogueManager::new(engine, Arc::new(EchoExtractor))
    }

    #[test]
    fn test_acknowledgement_short_circuits() {
        let mut m = manager();
        assert_eq!(m.handle_turn("default", "thanks"), "Thank You");
        assert_eq!(m.handle_turn("default", "Okay."), "Thank You");
    }

    #[test]
    fn test_fragment_search_stores_fact_and_answers() {
        let mut m = manager();
        let reply = m.handle_turn("alice", "finish the quote echo<two things are infinite>");
        assert_eq!(
            reply,
            "Two things are infinite: the universe and human stupidity."
        );
        assert!(m.has_context("alice"));
    }

    #[test]
    fn test_followup_answers_from_memory() {
        let mut m = manager();
        m.handle_turn("alice", "find the quote echo<two things are infinite>");
        // No fragment in the follow-up; answer comes from the stored fact.
        let reply = m.handle_turn("alice", "who said this?");
        assert_eq!(reply, "Albert Einstein");
    }

    #[test]
    fn test_memory_is_per_session() {
        let mut m = manager();
        m.handle_turn("alice", "find the quote echo<two things are infinite>");
        let reply = m.handle_turn("bob", "who said this?");
        assert_eq!(reply, CLARIFY_REPLY);
    }

    #[test]
    fn test_unmatched_fragment_reports_not_found() {
        let mut m = manager();
        let reply = m.handle_turn("alice", "find echo<zebra quantum marmalade sandwich>");
        assert_eq!(reply, NOT_FOUND_REPLY);
        assert!(!m.has_context("alice"));
    }

    #[test]
    fn test_new_quote_clears_context() {
        let mut m = manager();
        m.handle_turn("alice", "find the quote echo<two things are infinite>");
        assert!(m.has_context("alice"));
        let reply = m.handle_turn("alice", "another quote please");
        assert!(!m.has_context("alice"));
        assert_eq!(reply, CLARIFY_REPLY);
    }

    #[test]
    fn test_short_fragment_is_discarded() {
        let mut m = manager();
        // Two tokens only; the minimum is three.
        let reply = m.handle_turn("alice", "find echo<two things>");
        assert_eq!(reply, CLARIFY_REPLY);
    }

    #[test]
    fn test_empty_transcript_asks_for_words() {
        let mut m = manager();
        assert_eq!(m.handle_turn("alice", "   "), CLARIFY_REPLY);
    }
}
