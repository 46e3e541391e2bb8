//! Durable record set mapping identity name to enrollment embeddings.

use std::collections::BTreeMap;
use std::path::PathBuf;

use verbatim_core::error::Result;

use crate::document::{load_document, write_document};

/// On-disk shape: identity name -> ordered list of embedding vectors.
pub type SpeakerRecords = BTreeMap<String, Vec<Vec<f32>>>;

/// Store of per-identity enrollment embeddings, one JSON document.
///
/// Every accessor reads the full document from disk and every mutation
/// writes it back in full; nothing is cached across turns.
pub struct SpeakerStore {
    path: PathBuf,
}

impl SpeakerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load every record. Fails fast on a corrupt document.
    pub fn load(&self) -> Result<SpeakerRecords> {
        load_document(&self.path)
    }

    /// Append one embedding to an identity, creating the record if absent.
    /// Full read-modify-write against the document.
    pub fn append_embedding(&self, name: &str, embedding: Vec<f32>) -> Result<()> {
        let mut records = self.load()?;
        records
            .entry(name.trim().to_string())
            .or_default()
            .push(embedding);
        write_document(&self.path, &records)
    }

    /// Whether an identity already has at least one enrollment sample.
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self
            .load()?
            .get(name.trim())
            .is_some_and(|v| !v.is_empty()))
    }

    /// Enrolled identity names, sorted.
    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SpeakerStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SpeakerStore::new(dir.path().join("speakers.json"));
        (dir, store)
    }

    #[test]
    fn test_empty_store() {
        let (_dir, store) = store();
        assert!(store.load().unwrap().is_empty());
        assert!(!store.contains("Alice").unwrap());
        assert!(store.names().unwrap().is_empty());
    }

    #[test]
    fn test_append_creates_and_extends() {
        let (_dir, store) = store();
        store.append_embedding("Alice", vec![1.0, 0.0]).unwrap();
        store.append_embedding("Alice", vec![0.0, 1.0]).unwrap();
        store.append_embedding("Bob", vec![0.5, 0.5]).unwrap();

        let records = store.load().unwrap();
        assert_eq!(records["Alice"].len(), 2);
        assert_eq!(records["Bob"].len(), 1);
        assert!(store.contains("Alice").unwrap());
        assert_eq!(store.names().unwrap(), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_append_trims_name() {
        let (_dir, store) = store();
        store.append_embedding("  Alice ", vec![1.0]).unwrap();
        assert!(store.contains("Alice").unwrap());
    }

    #[test]
    fn test_embedding_order_preserved() {
        let (_dir, store) = store();
        store.append_embedding("A", vec![1.0]).unwrap();
        store.append_embedding("A", vec![2.0]).unwrap();
        store.append_embedding("A", vec![3.0]).unwrap();
        let records = store.load().unwrap();
        assert_eq!(records["A"], vec![vec![1.0], vec![2.0], vec![3.0]]);
    }

    #[test]
    fn test_reopen_sees_previous_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speakers.json");
        SpeakerStore::new(&path)
            .append_embedding("Alice", vec![1.0])
            .unwrap();
        // A fresh handle reads the same document.
        assert!(SpeakerStore::new(&path).contains("Alice").unwrap());
    }
}
