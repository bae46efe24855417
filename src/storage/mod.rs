//! Storage layer for Logbook data.
//!
//! Two adapters sit behind one facade:
//!
//! - **Local store** (`local`): SQLite key-value store in the data
//!   directory, holding full JSON collections, the favorite pointer, and
//!   migration flags. Always present.
//! - **Remote store** (`remote`): per-entity HTTP document store, present
//!   only when a `remote` block is configured.
//!
//! The [`Store`] facade is the single point every other component goes
//! through. Policy: writes attempt the remote first and mirror to local on
//! success; on remote failure the write lands locally only and the
//! degradation is logged. Reads prefer the remote and fall back to local.
//! Deletes are remote-only; the local collection drops an entity implicitly
//! on the next full-collection save.

pub mod local;
pub mod remote;

pub use local::LocalStore;
pub use remote::{HttpRemote, RemoteStore};

use std::env;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{Document, WireDocument, from_wire, to_wire};
use crate::{Error, Result};

/// Environment variable overriding the data directory (used by tests).
pub const DATA_DIR_ENV: &str = "LB_DATA_DIR";

/// Version tag written into backup files.
pub const BACKUP_VERSION: &str = "1.0";

/// Resolve the data directory: `LB_DATA_DIR` override, else the platform
/// data dir (`~/.local/share/logbook` on Linux).
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("logbook")
}

/// Backup file contents: `{version, exportDate, documents, templates}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backup {
    pub version: String,
    #[serde(rename = "exportDate")]
    pub export_date: String,
    pub documents: Vec<WireDocument>,
    pub templates: Vec<WireDocument>,
}

impl Backup {
    /// Parse and validate a backup blob. Rejects blobs missing `version` or
    /// whose collections are not sequences, without partially applying
    /// anything.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidBackup(format!("not valid JSON: {}", e)))?;
        let has_version = value.get("version").and_then(|v| v.as_str()).is_some();
        let docs_ok = value.get("documents").map(|v| v.is_array()).unwrap_or(false);
        let tpls_ok = value.get("templates").map(|v| v.is_array()).unwrap_or(false);
        if !has_version || !docs_ok || !tpls_ok {
            return Err(Error::InvalidBackup("invalid backup file format".to_string()));
        }
        serde_json::from_value(value)
            .map_err(|e| Error::InvalidBackup(format!("invalid backup file format: {}", e)))
    }
}

/// Unified persistence facade over the local and remote adapters.
pub struct Store {
    local: LocalStore,
    remote: Option<Box<dyn RemoteStore>>,
}

impl Store {
    pub fn new(local: LocalStore, remote: Option<Box<dyn RemoteStore>>) -> Self {
        Self { local, remote }
    }

    /// All live documents. Remote ordering (updated-at descending) is
    /// authoritative when the remote serves the read; local reads preserve
    /// the saved user order.
    pub fn documents(&self) -> Vec<Document> {
        if let Some(remote) = &self.remote {
            match remote.documents() {
                Ok(docs) => return docs,
                Err(e) => warn!(error = %e, "remote read failed, serving documents from local"),
            }
        }
        self.local.documents()
    }

    pub fn templates(&self) -> Vec<Document> {
        if let Some(remote) = &self.remote {
            match remote.templates() {
                Ok(tpls) => return tpls,
                Err(e) => warn!(error = %e, "remote read failed, serving templates from local"),
            }
        }
        self.local.templates()
    }

    /// Persist the full document collection: per-entity upserts to the
    /// remote, then a best-effort local mirror. On remote failure the
    /// collection is saved locally only.
    pub fn save_documents(&self, docs: &[Document]) -> Result<()> {
        if let Some(remote) = &self.remote {
            match docs.iter().try_for_each(|doc| remote.save_document(doc)) {
                Ok(()) => {
                    if let Err(e) = self.local.save_documents(docs) {
                        warn!(error = %e, "local mirror of documents failed");
                    }
                    return Ok(());
                }
                Err(e) => warn!(error = %e, "remote save failed, writing documents to local only"),
            }
        }
        self.local.save_documents(docs)
    }

    pub fn save_templates(&self, templates: &[Document]) -> Result<()> {
        if let Some(remote) = &self.remote {
            match templates.iter().try_for_each(|tpl| remote.save_template(tpl)) {
                Ok(()) => {
                    if let Err(e) = self.local.save_templates(templates) {
                        warn!(error = %e, "local mirror of templates failed");
                    }
                    return Ok(());
                }
                Err(e) => warn!(error = %e, "remote save failed, writing templates to local only"),
            }
        }
        self.local.save_templates(templates)
    }

    /// Remove one document from the remote store. The local collection
    /// drops it on the next full save.
    pub fn delete_document(&self, id: &str) -> Result<()> {
        match &self.remote {
            Some(remote) => Ok(remote.delete_document(id)?),
            None => Ok(()),
        }
    }

    pub fn delete_template(&self, id: &str) -> Result<()> {
        match &self.remote {
            Some(remote) => Ok(remote.delete_template(id)?),
            None => Ok(()),
        }
    }

    pub fn favorite_doc_id(&self) -> Option<String> {
        self.local.favorite_doc_id()
    }

    pub fn set_favorite_doc_id(&self, id: &str) -> Result<()> {
        self.local.set_favorite_doc_id(id)
    }

    pub fn clear_favorite_doc_id(&self) -> Result<()> {
        self.local.clear_favorite_doc_id()
    }

    pub fn flag(&self, key: &str) -> bool {
        self.local.flag(key)
    }

    pub fn set_flag(&self, key: &str) -> Result<()> {
        self.local.set_flag(key)
    }

    /// Upsert every locally stored document and template into the remote.
    /// Returns `Ok(false)` without touching anything when no remote is
    /// configured. Used by the legacy-import migration; safe to re-run
    /// since upserts are idempotent by id.
    pub fn push_local_to_remote(&self) -> Result<bool> {
        let Some(remote) = &self.remote else {
            return Ok(false);
        };
        for doc in self.local.documents() {
            remote.save_document(&doc)?;
        }
        for tpl in self.local.templates() {
            remote.save_template(&tpl)?;
        }
        Ok(true)
    }

    /// Snapshot both collections into a backup.
    pub fn export_all(&self) -> Backup {
        Backup {
            version: BACKUP_VERSION.to_string(),
            export_date: Utc::now().to_rfc3339(),
            documents: to_wire(&self.documents()),
            templates: to_wire(&self.templates()),
        }
    }

    /// Apply a validated backup. Remote application is upsert-only:
    /// entities absent from the blob are never deleted, so restoring a
    /// stale backup cannot destroy documents created after it was taken.
    /// The local store takes its usual full replacement.
    pub fn import_all(&self, backup: &Backup) -> Result<()> {
        let documents = from_wire(backup.documents.clone());
        let templates = from_wire(backup.templates.clone());
        if let Some(remote) = &self.remote {
            for doc in &documents {
                remote.save_document(doc)?;
            }
            for tpl in &templates {
                remote.save_template(tpl)?;
            }
            if let Err(e) = self.local.import_collections(&documents, &templates) {
                warn!(error = %e, "local mirror of restored backup failed");
            }
            return Ok(());
        }
        self.local.import_collections(&documents, &templates)
    }
}
