//! Per-identity conversation context.
//!
//! A session remembers exactly one thing: the last quote fact answered for
//! that identity. Clearing a session empties it but never deletes it, so a
//! cleared identity keeps its entry (and its voice preferences elsewhere).

use std::collections::HashMap;

use verbatim_core::types::QuoteFact;

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub last_fact: Option<QuoteFact>,
}

/// All live sessions, keyed by identity name.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_mut(&mut self, id: &str) -> &mut Session {
        self.sessions.entry(id.to_string()).or_default()
    }

    pub fn last_fact(&self, id: &str) -> Option<&QuoteFact> {
        self.sessions.get(id).and_then(|s| s.last_fact.as_ref())
    }

    /// Empty a session's context without removing the session.
    pub fn clear(&mut self, id: &str) {
        if let Some(session) = self.sessions.get_mut(id) {
            session.last_fact = None;
        }
    }

    pub fn clear_all(&mut self) {
        self.sessions.clear();
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact() -> QuoteFact {
        QuoteFact {
            quote: "q".to_string(),
            source: "s".to_string(),
            heading_context: String::new(),
            people: Vec::new(),
            score: 1.0,
        }
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut store = SessionStore::new();
        store.get_mut("alice").last_fact = Some(fact());
        assert!(store.last_fact("alice").is_some());
        assert!(store.last_fact("bob").is_none());
    }

    #[test]
    fn test_clear_keeps_the_session() {
        let mut store = SessionStore::new();
        store.get_mut("alice").last_fact = Some(fact());
        store.clear("alice");
        assert!(store.last_fact("alice").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_unknown_is_a_noop() {
        let mut store = SessionStore::new();
        store.clear("nobody");
        assert!(store.is_empty());
    }
}
