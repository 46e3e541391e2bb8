//! Whole-file JSON document persistence.
//!
//! Both durable record sets (speaker embeddings and voice preferences) are
//! single JSON documents: loaded completely on every read, rewritten
//! completely on every mutation. Writes go to a sibling temp file followed
//! by an atomic rename, so a crash mid-write leaves the previous document
//! intact and concurrent readers never observe a torn file.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use verbatim_core::error::{Result, VerbatimError};

/// Read a JSON document from disk.
///
/// A missing file yields `T::default()` (first run). An unreadable or
/// unparseable file is a hard error naming the path: silently discarding a
/// store would lose enrolled speakers or preferences.
pub fn load_document<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        debug!(path = %path.display(), "Store file absent; starting empty");
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| VerbatimError::StoreCorrupt {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| VerbatimError::StoreCorrupt {
        path: path.display().to_string(),
        detail: e.to_string(),
    })
}

/// Write a JSON document in full, atomically.
///
/// Serializes to `<file>.tmp` in the same directory and renames over the
/// target. Rename within one directory is atomic on the platforms we care
/// about, which is what makes whole-file replacement safe without locking.
pub fn write_document<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    let content =
        serde_json::to_string_pretty(value).map_err(|e| VerbatimError::Store(e.to_string()))?;
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "Store written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    type Doc = BTreeMap<String, Vec<u32>>;

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let doc: Doc = load_document(&dir.path().join("absent.json")).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_write_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let mut doc = Doc::new();
        doc.insert("alice".to_string(), vec![1, 2, 3]);
        write_document(&path, &doc).unwrap();

        let loaded: Doc = load_document(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/doc.json");
        write_document(&path, &Doc::new()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_fails_fast_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result: Result<Doc> = load_document(&path);
        match result {
            Err(VerbatimError::StoreCorrupt { path: p, .. }) => {
                assert!(p.contains("doc.json"));
            }
            other => panic!("expected StoreCorrupt, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_rewrite_replaces_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let mut doc = Doc::new();
        doc.insert("a".to_string(), vec![1]);
        doc.insert("b".to_string(), vec![2]);
        write_document(&path, &doc).unwrap();

        doc.remove("a");
        write_document(&path, &doc).unwrap();

        let loaded: Doc = load_document(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!loaded.contains_key("a"));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_document(&path, &Doc::new()).unwrap();
        assert!(!path.with_extension("tmp").exists());
    }
}
