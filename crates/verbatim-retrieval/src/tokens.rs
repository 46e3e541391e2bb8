//! Fragment tokenization and query-variant expansion.
//!
//! Tokenization is deliberately light: lowercase, strip quotation marks and
//! punctuation except apostrophes, and drop a small closed stopword set so
//! that "the" and "of" don't dominate coverage scoring while the meaning of
//! the fragment survives.

/// Closed stopword set; kept minimal to preserve meaning.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "i",
    "in", "is", "it", "its", "of", "on", "or", "that", "the", "to", "was", "were", "will", "with",
    "you", "your", "we", "our", "this", "those", "these", "they", "them", "he", "she", "his",
    "her",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Lowercase and split on anything that is not a letter, digit, or
/// apostrophe. No stopword filtering; used for raw term matching.
pub fn tokenize_raw(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '\'' {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Tokenize and drop stopwords: the canonical fragment token list.
pub fn clean_tokens(text: &str) -> Vec<String> {
    tokenize_raw(text)
        .into_iter()
        .filter(|t| !is_stop_word(t))
        .collect()
}

/// Join tokens into a single space-separated string.
pub fn joined(tokens: &[String]) -> String {
    tokens.join(" ")
}

/// Build the ordered query variants for a fragment, skipping any that
/// degenerate to empty and deduplicating while preserving order.
///
/// Variant order matters: exact phrase first, then phrase with positional
/// slop, then the conjunction of all tokens, then prefix wildcards. The
/// engine issues them in this order and stops early once its pool is full.
pub fn build_variants(fragment: &str) -> Vec<String> {
    let tokens = clean_tokens(fragment);
    let phrase = joined(&tokens);

    let mut variants: Vec<String> = Vec::new();
    if tokens.len() >= 2 {
        variants.push(format!("\"{}\"", phrase));
        variants.push(format!("\"{}\"~3", phrase));
    }
    if !tokens.is_empty() {
        variants.push(tokens.join(" AND "));
        variants.push(
            tokens
                .iter()
                .map(|t| format!("{}*", t))
                .collect::<Vec<_>>()
                .join(" "),
        );
    }

    let mut seen = std::collections::HashSet::new();
    variants
        .into_iter()
        .filter(|v| !v.trim().is_empty() && seen.insert(v.clone()))
        .collect()
}
