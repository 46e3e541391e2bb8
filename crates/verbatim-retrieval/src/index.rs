//! In-memory full-text index over quote documents.
//!
//! Understands the same query shapes the engine emits: quoted phrases with
//! optional `~n` slop, `AND` conjunctions, trailing-`*` prefix terms, and a
//! plain term list treated as OR. Scoring is transparent on purpose: a
//! fixed amount per matched term plus a bonus when the phrase appears
//! contiguously, so ranking stays explainable end to end.

use std::fs;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::info;

use verbatim_core::error::{Result, VerbatimError};
use verbatim_core::providers::SearchIndex;
use verbatim_core::types::{IndexHit, PersonRef};

use crate::tokens::tokenize_raw;

/// Score contributed by each matched term.
const TERM_SCORE: f64 = 2.5;
/// Extra score when the full phrase appears contiguously.
const PHRASE_BONUS: f64 = 4.0;

/// One indexed quote record, as stored in the corpus file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteDoc {
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
}

/// Thread-safe in-memory index; documents are tokenized once at insert.
pub struct MemoryIndex {
    docs: RwLock<Vec<IndexedDoc>>,
}

struct IndexedDoc {
    doc: QuoteDoc,
    tokens: Vec<String>,
    joined: String,
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
        }
    }

    /// Load a JSON array of [`QuoteDoc`] records from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let docs: Vec<QuoteDoc> = serde_json::from_str(&raw)
            .map_err(|e| VerbatimError::Index(format!("corpus parse failed: {e}")))?;
        info!(count = docs.len(), path = %path.as_ref().display(), "Loaded quote corpus");
        let index = Self::new();
        for doc in docs {
            index.add(doc);
        }
        Ok(index)
    }

    pub fn add(&self, doc: QuoteDoc) {
        let tokens = tokenize_raw(&doc.quote);
        let joined = tokens.join(" ");
        if let Ok(mut docs) = self.docs.write() {
            docs.push(IndexedDoc { doc, tokens, joined });
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SearchIndex for MemoryIndex {
    fn query(&self, _index_name: &str, query: &str, limit: usize) -> Result<Vec<IndexHit>> {
        let parsed = parse_query(query);
        let docs = self
            .docs
            .read()
            .map_err(|_| VerbatimError::Index("index lock poisoned".to_string()))?;

        let mut hits: Vec<IndexHit> = docs
            .iter()
            .filter_map(|d| score_doc(&parsed, d).map(|score| to_hit(&d.doc, score)))
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
        hits.truncate(limit);
        Ok(hits)
    }
}

fn to_hit(doc: &QuoteDoc, score: f64) -> IndexHit {
    IndexHit {
        id: doc.id.clone(),
        quote: doc.quote.clone(),
        source: doc.source.clone(),
        heading_context: doc.heading_context.clone(),
        status: doc.status.clone(),
        people: doc.people.clone(),
        score,
    }
}

enum ParsedQuery {
    /// `"a b c"` with optional `~n`: slop > 0 only requires all tokens
    /// to be present, slop 0 requires them contiguous.
    Phrase { tokens: Vec<String>, slop: u32 },
    /// `a AND b AND c`: every term must match.
    Conjunction(Vec<Term>),
    /// Plain term list: any term may match.
    Any(Vec<Term>),
}

enum Term {
    Exact(String),
    Prefix(String),
}

impl Term {
    fn parse(raw: &str) -> Self {
        match raw.strip_suffix('*') {
            Some(stem) => Term::Prefix(stem.to_lowercase()),
            None => Term::Exact(raw.to_lowercase()),
        }
    }

    fn matches(&self, token: &str) -> bool {
        match self {
            Term::Exact(t) => token == t,
            Term::Prefix(p) => token.starts_with(p.as_str()),
        }
    }
}

fn parse_query(query: &str) -> ParsedQuery {
    let query = query.trim();
    if let Some(rest) = query.strip_prefix('"') {
        if let Some(end) = rest.find('"') {
            let phrase = &rest[..end];
            let tail = rest[end + 1..].trim();
            let slop = tail
                .strip_prefix('~')
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
            return ParsedQuery::Phrase {
                tokens: tokenize_raw(phrase),
                slop,
            };
        }
    }
    if query.contains(" AND ") {
        return ParsedQuery::Conjunction(query.split(" AND ").map(Term::parse).collect());
    }
    ParsedQuery::Any(query.split_whitespace().map(Term::parse).collect())
}

fn score_doc(query: &ParsedQuery, doc: &IndexedDoc) -> Option<f64> {
    match query {
        ParsedQuery::Phrase { tokens, slop } => {
            if tokens.is_empty() {
                return None;
            }
            let all_present = tokens
                .iter()
                .all(|t| doc.tokens.iter().any(|dt| dt == t));
            if !all_present {
                return None;
            }
            let contiguous = doc.joined.contains(&tokens.join(" "));
            if *slop == 0 && !contiguous {
                return None;
            }
            let mut score = tokens.len() as f64 * TERM_SCORE;
            if contiguous {
                score += PHRASE_BONUS;
            }
            Some(score)
        }
        ParsedQuery::Conjunction(terms) => {
            if terms.is_empty()
                || !terms
                    .iter()
                    .all(|term| doc.tokens.iter().any(|t| term.matches(t)))
            {
                return None;
            }
            Some(terms.len() as f64 * TERM_SCORE)
        }
        ParsedQuery::Any(terms) => {
            let matched = terms
                .iter()
                .filter(|term| doc.tokens.iter().any(|t| term.matches(t)))
                .count();
            if matched == 0 {
                None
            } else {
                Some(matched as f64 * TERM_SCORE)
            }
        }
    }
}
