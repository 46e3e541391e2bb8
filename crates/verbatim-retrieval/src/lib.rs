//! Fragment-based quote retrieval: query-variant expansion, pooled
//! candidate collection, and composite re-ranking over a search index.

pub mod engine;
pub mod index;
pub mod tokens;

pub use engine::{rerank_score, RetrievalEngine};
pub use index::{MemoryIndex, QuoteDoc};
pub use tokens::{build_variants, clean_tokens, tokenize_raw};
