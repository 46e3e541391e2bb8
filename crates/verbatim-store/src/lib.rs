//! Durable state for Verbatim: speaker embeddings and voice preferences.
//!
//! Both stores are whole-file JSON documents with read-everything /
//! rewrite-everything semantics and atomic replacement via temp file +
//! rename. Corrupt documents fail fast at load instead of being discarded.

pub mod document;
pub mod prefs;
pub mod speakers;

pub use document::{load_document, write_document};
pub use prefs::{PrefsRecords, PrefsStore};
pub use speakers::{SpeakerRecords, SpeakerStore};
