//! Item collection backed by a JSON array on disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// The items document could not be served.
///
/// Missing file, permission problems and malformed content all collapse
/// into this one error; the source is kept for logging only.
#[derive(Debug, Error)]
#[error("could not read {}: {reason}", .path.display())]
pub struct ReadError {
    path: PathBuf,
    reason: String,
}

/// Read-only view of the items document.
#[derive(Debug, Clone)]
pub struct ItemStore {
    path: PathBuf,
}

impl ItemStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole document. Order is preserved as written.
    pub fn fetch_items(&self) -> Result<Vec<Value>, ReadError> {
        let raw = fs::read(&self.path).map_err(|e| self.read_error(e))?;
        let items: Vec<Value> = serde_json::from_slice(&raw).map_err(|e| self.read_error(e))?;
        debug!(path = %self.path.display(), count = items.len(), "items loaded");
        Ok(items)
    }

    fn read_error(&self, reason: impl std::fmt::Display) -> ReadError {
        ReadError {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_with(content: &str) -> (TempDir, ItemStore) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("items.json");
        fs::write(&path, content).unwrap();
        (tmp, ItemStore::new(path))
    }

    #[test]
    fn returns_array_in_order() {
        let (_tmp, store) = store_with(r#"[{"id": 2}, "two", 3, null, {"id": 1}]"#);
        let items = store.fetch_items().unwrap();
        assert_eq!(items, vec![json!({"id": 2}), json!("two"), json!(3), json!(null), json!({"id": 1})]);
    }

    #[test]
    fn empty_array_is_ok() {
        let (_tmp, store) = store_with("[]");
        assert!(store.fetch_items().unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let store = ItemStore::new(tmp.path().join("absent.json"));
        let err = store.fetch_items().unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn invalid_json_is_read_error() {
        let (_tmp, store) = store_with(r#"[{"id": 1}, "#);
        assert!(store.fetch_items().is_err());
    }

    #[test]
    fn non_array_document_is_read_error() {
        let (_tmp, store) = store_with(r#"{"items": []}"#);
        assert!(store.fetch_items().is_err());
    }

    #[test]
    fn every_call_rereads_the_file() {
        let (_tmp, store) = store_with(r#"["a"]"#);
        assert_eq!(store.fetch_items().unwrap(), vec![json!("a")]);

        fs::write(store.path(), r#"["a", "b"]"#).unwrap();
        assert_eq!(store.fetch_items().unwrap(), vec![json!("a"), json!("b")]);

        fs::remove_file(store.path()).unwrap();
        assert!(store.fetch_items().is_err());
    }
}
