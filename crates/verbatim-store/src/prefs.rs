//! Durable record set mapping identity name to voice preferences.

use std::collections::BTreeMap;
use std::path::PathBuf;

use verbatim_core::error::Result;
use verbatim_core::types::VoicePrefs;

use crate::document::{load_document, write_document};

/// On-disk shape: identity name -> preference record.
pub type PrefsRecords = BTreeMap<String, VoicePrefs>;

/// Store of per-identity TTS preferences, one JSON document, full
/// read-modify-write on every mutation.
pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Preferences for an identity; defaults when none are saved.
    pub fn get(&self, name: &str) -> Result<VoicePrefs> {
        let records: PrefsRecords = load_document(&self.path)?;
        Ok(records.get(name).cloned().unwrap_or_default())
    }

    /// Saved preferences for an identity, or `None` when no record exists.
    /// Callers that carry their own configured defaults use this.
    pub fn lookup(&self, name: &str) -> Result<Option<VoicePrefs>> {
        let records: PrefsRecords = load_document(&self.path)?;
        Ok(records.get(name).cloned())
    }

    /// Update selected fields for an identity, leaving the rest as stored
    /// (or default for a new record). Returns the resulting record.
    pub fn update(
        &self,
        name: &str,
        voice: Option<&str>,
        rate: Option<u32>,
        volume: Option<f32>,
    ) -> Result<VoicePrefs> {
        let mut records: PrefsRecords = load_document(&self.path)?;
        let entry = records.entry(name.to_string()).or_default();
        if let Some(v) = voice {
            entry.voice = v.to_string();
        }
        if let Some(r) = rate {
            entry.rate = r;
        }
        if let Some(v) = volume {
            entry.volume = v;
        }
        let result = entry.clone();
        write_document(&self.path, &records)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, PrefsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefsStore::new(dir.path().join("voice_prefs.json"));
        (dir, store)
    }

    #[test]
    fn test_unknown_identity_gets_defaults() {
        let (_dir, store) = store();
        let prefs = store.get("nobody").unwrap();
        assert_eq!(prefs, VoicePrefs::default());
    }

    #[test]
    fn test_update_single_field_keeps_others() {
        let (_dir, store) = store();
        let prefs = store.update("Alice", None, None, Some(0.6)).unwrap();
        assert_eq!(prefs.volume, 0.6);
        assert_eq!(prefs.rate, 185);
        assert_eq!(prefs.voice, "");

        let prefs = store.update("Alice", None, Some(210), None).unwrap();
        assert_eq!(prefs.rate, 210);
        assert_eq!(prefs.volume, 0.6);
    }

    #[test]
    fn test_update_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice_prefs.json");
        PrefsStore::new(&path)
            .update("Bob", Some("tts.david"), None, None)
            .unwrap();
        let prefs = PrefsStore::new(&path).get("Bob").unwrap();
        assert_eq!(prefs.voice, "tts.david");
    }

    #[test]
    fn test_identities_are_independent() {
        let (_dir, store) = store();
        store.update("Alice", None, Some(240), None).unwrap();
        assert_eq!(store.get("Bob").unwrap().rate, 185);
    }
}
