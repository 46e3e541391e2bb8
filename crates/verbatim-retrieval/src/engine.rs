//! Fragment retrieval with pooled dedup and composite re-ranking.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use verbatim_core::config::RetrievalConfig;
use verbatim_core::providers::SearchIndex;
use verbatim_core::types::Candidate;

use crate::tokens::{build_variants, clean_tokens, joined};

/// Re-rank weight on fragment-token coverage.
const W_COVERAGE: f64 = 0.55;
/// Re-rank weight on the normalized raw index score.
const W_RAW: f64 = 0.35;
/// Re-rank weight on the phrase-containment bonus.
const W_PHRASE: f64 = 0.10;
/// Raw index scores are unbounded; normalize against this cap.
const RAW_SCORE_CAP: f64 = 10.0;

/// Expands a quote fragment into query variants, pools the hits, and
/// re-ranks the pooled candidates.
pub struct RetrievalEngine {
    index: Arc<dyn SearchIndex>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(index: Arc<dyn SearchIndex>, config: RetrievalConfig) -> Self {
        Self { index, config }
    }

    /// Top-`k` candidates for a fragment, ordered by descending
    /// `(rerank_score, raw_score)`.
    ///
    /// Query variants are issued in order; hits below `min_score` are
    /// discarded; surviving hits are pooled by id keeping the maximum raw
    /// score; querying stops early once the pool holds `3 * k` distinct
    /// ids. A variant that fails counts as zero hits for that variant and
    /// never aborts the remaining variants.
    pub fn search_topk(&self, fragment: &str, k: usize, min_score: f64) -> Vec<Candidate> {
        let per_variant_limit = k.max(5);
        let mut pool: HashMap<String, Candidate> = HashMap::new();

        for variant in build_variants(fragment) {
            let hits = match self
                .index
                .query(&self.config.index_name, &variant, per_variant_limit)
            {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(variant = %variant, error = %e, "Index query variant failed; treating as zero hits");
                    Vec::new()
                }
            };
            debug!(variant = %variant, hits = hits.len(), "Variant queried");

            for hit in hits {
                if hit.score < min_score {
                    continue;
                }
                let raw = hit.score;
                pool.entry(hit.id.clone())
                    .and_modify(|c| {
                        if raw > c.raw_score {
                            c.raw_score = raw;
                            c.hit = hit.clone();
                        }
                    })
                    .or_insert(Candidate {
                        hit,
                        raw_score: raw,
                        rerank_score: 0.0,
                    });
            }

            if pool.len() >= 3 * k {
                break;
            }
        }

        let mut candidates: Vec<Candidate> = pool.into_values().collect();
        for c in &mut candidates {
            c.rerank_score = rerank_score(fragment, &c.hit.quote, c.raw_score);
        }
        candidates.sort_by(|a, b| {
            b.rerank_score
                .total_cmp(&a.rerank_score)
                .then(b.raw_score.total_cmp(&a.raw_score))
                // Stable tie-break so ordering is deterministic across runs.
                .then(a.hit.id.cmp(&b.hit.id))
        });
        candidates.truncate(k);
        candidates
    }

    /// The single best candidate for a fragment, or none.
    pub fn search_best(&self, fragment: &str) -> Option<Candidate> {
        self.search_topk(fragment, self.config.k, self.config.min_score)
            .into_iter()
            .next()
    }
}

/// Composite re-rank score for a candidate quote against the fragment.
///
/// `coverage` is the fraction of fragment tokens present in the candidate's
/// tokenized text; the phrase bonus fires iff the joined fragment tokens
/// appear as a substring of the joined candidate tokens.
pub fn rerank_score(fragment: &str, quote: &str, raw_score: f64) -> f64 {
    let frag_tokens = clean_tokens(fragment);
    let quote_tokens = clean_tokens(quote);
    let quote_set: std::collections::HashSet<&String> = quote_tokens.iter().collect();

    let coverage = if frag_tokens.is_empty() {
        0.0
    } else {
        let present = frag_tokens.iter().filter(|t| quote_set.contains(t)).count();
        present as f64 / frag_tokens.len() as f64
    };

    let phrase_bonus = if !frag_tokens.is_empty() && joined(&quote_tokens).contains(&joined(&frag_tokens))
    {
        1.0
    } else {
        0.0
    };

    let raw_norm = (raw_score / RAW_SCORE_CAP).min(1.0);

    W_COVERAGE * coverage + W_RAW * raw_norm + W_PHRASE * phrase_bonus
}
