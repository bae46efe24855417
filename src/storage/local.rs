//! Local persistence adapter.
//!
//! A SQLite-backed key-value store holding full JSON-serialized collections,
//! the favorite pointer, and the one-time migration flags. Every collection
//! save is a full replacement of the stored value, never an incremental
//! diff; callers always pass the complete desired collection.

use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::Result;
use crate::models::{Document, WireDocument, from_wire, to_wire};

const KEY_DOCUMENTS: &str = "documents";
const KEY_TEMPLATES: &str = "templates";
const KEY_FAVORITE: &str = "favorite_doc_id";

/// Local key-value store for a single installation.
pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    /// Open (creating if necessary) the store under the given data directory.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let conn = Connection::open(data_dir.join("store.db"))?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Read a stored collection. Malformed or unreadable blobs are not
    /// fatal: the collection reads as empty and a warning is logged.
    fn collection(&self, key: &str) -> Vec<Document> {
        let raw = match self.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key, error = %e, "failed to read local collection");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<WireDocument>>(&raw) {
            Ok(wire) => from_wire(wire),
            Err(e) => {
                warn!(key, error = %e, "malformed local collection, treating as empty");
                Vec::new()
            }
        }
    }

    fn save_collection(&self, key: &str, docs: &[Document]) -> Result<()> {
        let raw = serde_json::to_string(&to_wire(docs))?;
        self.set(key, &raw)
    }

    pub fn documents(&self) -> Vec<Document> {
        self.collection(KEY_DOCUMENTS)
    }

    /// Replace the stored document collection wholesale.
    pub fn save_documents(&self, docs: &[Document]) -> Result<()> {
        self.save_collection(KEY_DOCUMENTS, docs)
    }

    pub fn templates(&self) -> Vec<Document> {
        self.collection(KEY_TEMPLATES)
    }

    pub fn save_templates(&self, templates: &[Document]) -> Result<()> {
        self.save_collection(KEY_TEMPLATES, templates)
    }

    pub fn favorite_doc_id(&self) -> Option<String> {
        match self.get(KEY_FAVORITE) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "failed to read favorite document id");
                None
            }
        }
    }

    pub fn set_favorite_doc_id(&self, id: &str) -> Result<()> {
        self.set(KEY_FAVORITE, id)
    }

    pub fn clear_favorite_doc_id(&self) -> Result<()> {
        self.remove(KEY_FAVORITE)
    }

    /// Installation-scoped boolean flag, stored as the string `"true"`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(v)) if v == "true")
    }

    pub fn set_flag(&self, key: &str) -> Result<()> {
        self.set(key, "true")
    }

    /// Store a raw value. Used by tests to simulate corrupt blobs.
    #[cfg(test)]
    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, value)
    }

    /// Destructively replace both collections from a backup.
    pub fn import_collections(
        &self,
        documents: &[Document],
        templates: &[Document],
    ) -> Result<()> {
        self.save_documents(documents)?;
        self.save_templates(templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChecklistItem, Kind};
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> LocalStore {
        LocalStore::open(dir.path()).unwrap()
    }

    #[test]
    fn test_empty_store_reads_empty_collections() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert!(store.documents().is_empty());
        assert!(store.templates().is_empty());
        assert!(store.favorite_doc_id().is_none());
    }

    #[test]
    fn test_save_is_full_replacement() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let a = Document::blank(Kind::Task);
        let b = Document::blank(Kind::Contract);
        store.save_documents(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(store.documents().len(), 2);

        // Saving a collection with one entity omitted deletes it.
        store.save_documents(&[a.clone()]).unwrap();
        let docs = store.documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, a.id);
    }

    #[test]
    fn test_collections_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let mut doc = Document::blank(Kind::DailyNote);
        doc.title = "Morning".to_string();
        doc.checklist.push(ChecklistItem::new("coffee"));
        {
            let store = open_store(&dir);
            store.save_documents(&[doc.clone()]).unwrap();
        }
        let store = open_store(&dir);
        let docs = store.documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Morning");
        assert_eq!(docs[0].kind(), Some(Kind::DailyNote));
        assert_eq!(docs[0].checklist[0].text, "coffee");
    }

    #[test]
    fn test_corrupt_blob_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.set_raw("documents", "{not json").unwrap();
        assert!(store.documents().is_empty());
    }

    #[test]
    fn test_favorite_pointer_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.set_favorite_doc_id("abc-123").unwrap();
        assert_eq!(store.favorite_doc_id().as_deref(), Some("abc-123"));
        store.clear_favorite_doc_id().unwrap();
        assert!(store.favorite_doc_id().is_none());
    }

    #[test]
    fn test_flags_default_unset() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert!(!store.flag("legacy_import_done"));
        store.set_flag("legacy_import_done").unwrap();
        assert!(store.flag("legacy_import_done"));
    }
}
