//! Grounded answering over a stored quote fact.
//!
//! Follow-up questions are answered by keyword family, checked in a fixed
//! order, directly from the fact's fields. Nothing here consults a model;
//! only the final free-form case (no family matched and no quote text to
//! fall back on) asks for a rephrase, and that lives in the manager.

use std::sync::LazyLock;

use regex::Regex;

use verbatim_core::types::{QuoteFact, Relation};

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(1[6-9]\d{2}|20\d{2})\b").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static DOUBLE_STOP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\.\s*\.\s*").expect("valid regex"));

/// How to answer a question against the stored fact.
#[derive(Debug, Clone, PartialEq)]
pub enum FactAnswer {
    /// Answer assembled verbatim from the fact's fields.
    Direct(String),
    /// No keyword family matched and the fact has no quote text; the
    /// caller should produce a constrained rephrase from the fact.
    NeedsRephrase,
}

/// Join names as "A", "A and B", or "A, B and C".
pub fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    }
}

/// First plausible year (1600-2099) in the fact's heading context or
/// source, used to answer "when" questions.
pub fn first_year(fact: &QuoteFact) -> Option<String> {
    let text = format!("{} {}", fact.heading_context, fact.source);
    YEAR_RE.find(&text).map(|m| m.as_str().to_string())
}

fn clean_quote_text(s: &str) -> String {
    let s = WHITESPACE_RE.replace_all(s.trim(), " ");
    DOUBLE_STOP_RE.replace_all(&s, ". ").into_owned()
}

fn contains_any(q: &str, keys: &[&str]) -> bool {
    keys.iter().any(|k| q.contains(k))
}

/// Answer a question from a stored fact.
pub fn answer_from_fact(question: &str, fact: &QuoteFact) -> FactAnswer {
    let q = question.trim().to_lowercase();

    let said_by = fact.names(Relation::SaidBy);
    let about = fact.names(Relation::About);
    let misattributed = fact.names(Relation::MisattributedTo);
    let disputed = fact.names(Relation::DisputedWith);

    if contains_any(&q, &["who said", "who wrote", "author"]) {
        if !said_by.is_empty() {
            return FactAnswer::Direct(join_names(&said_by));
        }
        if !misattributed.is_empty() {
            return FactAnswer::Direct(format!(
                "Unknown; often misattributed to {}.",
                join_names(&misattributed)
            ));
        }
        return FactAnswer::Direct("Unknown.".to_string());
    }

    if contains_any(
        &q,
        &["who is it about", "about whom", "about who", "who is this about"],
    ) {
        return FactAnswer::Direct(if about.is_empty() {
            "Unknown.".to_string()
        } else {
            join_names(&about)
        });
    }

    if contains_any(&q, &["disputed", "dispute", "contested", "is it true", "misattributed"]) {
        let answer = match (disputed.is_empty(), misattributed.is_empty()) {
            (false, false) => format!(
                "Yes, disputed with {} and often misattributed to {}.",
                join_names(&disputed),
                join_names(&misattributed)
            ),
            (false, true) => format!("Yes, disputed with {}.", join_names(&disputed)),
            (true, false) => format!(
                "Yes, often misattributed to {}.",
                join_names(&misattributed)
            ),
            (true, true) => "No disputes recorded.".to_string(),
        };
        return FactAnswer::Direct(answer);
    }

    if contains_any(
        &q,
        &["source", "citation", "reference", "where is this from", "origin"],
    ) {
        return FactAnswer::Direct(if fact.source.trim().is_empty() {
            "Unknown source.".to_string()
        } else {
            fact.source.trim().to_string()
        });
    }

    if contains_any(
        &q,
        &[
            "finish the quote",
            "complete the quote",
            "finish quote",
            "complete this quote",
            "continue the quote",
        ],
    ) {
        return FactAnswer::Direct(clean_quote_text(&fact.quote));
    }

    if q.contains("when") {
        return FactAnswer::Direct(first_year(fact).unwrap_or_else(|| "Unknown date.".to_string()));
    }

    // No family matched: quote the fact verbatim with attribution.
    let full = clean_quote_text(&fact.quote);
    if full.is_empty() {
        return FactAnswer::NeedsRephrase;
    }
    let author = join_names(&said_by);
    let source = fact.source.trim();
    let formatted = match (author.is_empty(), source.is_empty()) {
        (false, false) => format!("\"{full}\" - {author}. {source}"),
        (false, true) => format!("\"{full}\" - {author}."),
        (true, false) => format!("\"{full}\" {source}"),
        (true, true) => format!("\"{full}\""),
    };
    FactAnswer::Direct(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    use verbatim_core::types::PersonRef;

    fn fact() -> QuoteFact {
        QuoteFact {
            quote: "Two things are infinite: the universe and human stupidity.".to_string(),
            source: "Attributed in Gestalt Therapy (1951)".to_string(),
            heading_context: "Einstein collection".to_string(),
            people: vec![
                PersonRef::new(Relation::SaidBy, "Albert Einstein"),
                PersonRef::new(Relation::About, "Humanity"),
                PersonRef::new(Relation::MisattributedTo, "Mark Twain"),
            ],
            score: 7.5,
        }
    }

    fn direct(question: &str, fact: &QuoteFact) -> String {
        match answer_from_fact(question, fact) {
            FactAnswer::Direct(s) => s,
            FactAnswer::NeedsRephrase => panic!("expected a direct answer"),
        }
    }

    #[test]
    fn test_join_names() {
        assert_eq!(join_names(&[]), "");
        assert_eq!(join_names(&["A"]), "A");
        assert_eq!(join_names(&["A", "B"]), "A and B");
        assert_eq!(join_names(&["A", "B", "C"]), "A, B and C");
    }

    #[test]
    fn test_who_said() {
        assert_eq!(direct("who said this?", &fact()), "Albert Einstein");
        assert_eq!(direct("Who wrote that quote", &fact()), "Albert Einstein");
    }

    #[test]
    fn test_who_said_with_only_misattribution() {
        let mut f = fact();
        f.people.retain(|p| p.relation != Relation::SaidBy);
        assert_eq!(
            direct("who said it", &f),
            "Unknown; often misattributed to Mark Twain."
        );
    }

    #[test]
    fn test_about_whom() {
        assert_eq!(direct("about whom is this", &fact()), "Humanity");
        let mut f = fact();
        f.people.retain(|p| p.relation != Relation::About);
        assert_eq!(direct("who is it about?", &f), "Unknown.");
    }

    #[test]
    fn test_disputed() {
        assert_eq!(
            direct("is it disputed?", &fact()),
            "Yes, often misattributed to Mark Twain."
        );
        let mut f = fact();
        f.people
            .push(PersonRef::new(Relation::DisputedWith, "Kurt Vonnegut"));
        assert_eq!(
            direct("is this contested", &f),
            "Yes, disputed with Kurt Vonnegut and often misattributed to Mark Twain."
        );
        f.people.retain(|p| p.relation == Relation::SaidBy);
        assert_eq!(direct("any dispute?", &f), "No disputes recorded.");
    }

    #[test]
    fn test_source() {
        assert_eq!(
            direct("what's the source", &fact()),
            "Attributed in Gestalt Therapy (1951)"
        );
        let mut f = fact();
        f.source.clear();
        assert_eq!(direct("citation please", &f), "Unknown source.");
    }

    #[test]
    fn test_finish_quote_returns_text_only() {
        assert_eq!(
            direct("finish the quote for me", &fact()),
            "Two things are infinite: the universe and human stupidity."
        );
    }

    #[test]
    fn test_when_uses_first_year() {
        assert_eq!(direct("when was this said", &fact()), "1951");
        let mut f = fact();
        f.source = "Collected sayings".to_string();
        f.heading_context = "Notes".to_string();
        assert_eq!(direct("when did he say it", &f), "Unknown date.");
    }

    #[test]
    fn test_default_formats_quote_with_attribution() {
        assert_eq!(
            direct("tell me more", &fact()),
            "\"Two things are infinite: the universe and human stupidity.\" - Albert Einstein. Attributed in Gestalt Therapy (1951)"
        );
    }

    #[test]
    fn test_empty_quote_needs_rephrase() {
        let mut f = fact();
        f.quote.clear();
        assert_eq!(answer_from_fact("tell me more", &f), FactAnswer::NeedsRephrase);
    }

    #[test]
    fn test_keyword_priority_order() {
        // "who said" wins over "source" when both appear.
        assert_eq!(
            direct("who said this and what's the source", &fact()),
            "Albert Einstein"
        );
    }
}
