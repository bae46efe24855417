//! Application state controller.
//!
//! A [`Session`] owns the in-memory collections, the favorite pointer, and
//! the active editing target, and routes every mutation through the storage
//! facade. The in-memory state is a cache of backend truth: it is reloaded
//! wholesale after migration and after a restore, never trusted past that.
//!
//! The active entity moves between two modes:
//!
//! ```text
//! EDITOR  <-- save / cancel --  TEMPLATE_PREVIEW
//!   |                                 ^
//!   +------- preview template --------+
//! ```
//!
//! `EDITOR` is the initial mode and the mode after every save or cancel.
//! Saving from `TEMPLATE_PREVIEW` always creates a brand-new document and
//! never touches the source template.

pub mod autosave;

use tracing::warn;

use crate::models::{Document, Kind, UNTITLED_DOCUMENT, UNTITLED_TEMPLATE};
use crate::storage::{Backup, Store};
use crate::{Error, Result};

/// Editing mode of the active entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Editor,
    TemplatePreview { source_template_id: String },
}

/// A pending delete recorded by the two-step delete flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Document(String),
    Template(String),
}

/// Result of a save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The entity was persisted and is now the active editing target.
    Saved,
    /// Another template already occupies the category. Nothing was changed;
    /// saving again with replacement confirmed deletes the listed template
    /// first. Declining is simply not retrying.
    CategoryConflict {
        existing_id: String,
        existing_title: String,
    },
}

pub struct Session {
    store: Store,
    documents: Vec<Document>,
    templates: Vec<Document>,
    favorite_id: Option<String>,
    active: Document,
    mode: Mode,
    pending_delete: Option<DeleteTarget>,
}

impl Session {
    /// Create a session with empty collections and a blank task document as
    /// the active target. Call [`Session::load`] to populate from the
    /// backend.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            documents: Vec::new(),
            templates: Vec::new(),
            favorite_id: None,
            active: Document::blank(Kind::Task),
            mode: Mode::Editor,
            pending_delete: None,
        }
    }

    /// Load collections and the favorite pointer from the backend. The
    /// favorite document, when it still exists, becomes the active target.
    pub fn load(&mut self) {
        self.reload_collections();
        if let Some(favorite) = self
            .favorite_id
            .as_ref()
            .and_then(|id| self.documents.iter().find(|d| &d.id == id))
        {
            self.active = favorite.clone();
            self.mode = Mode::Editor;
        }
    }

    fn reload_collections(&mut self) {
        self.documents = self.store.documents();
        self.templates = self.store.templates();
        self.favorite_id = self.store.favorite_doc_id();
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn templates(&self) -> &[Document] {
        &self.templates
    }

    pub fn favorite_id(&self) -> Option<&str> {
        self.favorite_id.as_deref()
    }

    pub fn active(&self) -> &Document {
        &self.active
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn find_document(&self, id: &str) -> Result<&Document> {
        self.documents
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| Error::NotFound(format!("document {}", id)))
    }

    fn find_template(&self, id: &str) -> Result<&Document> {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("template {}", id)))
    }

    /// Open an existing document for editing.
    pub fn open_document(&mut self, id: &str) -> Result<&Document> {
        self.active = self.find_document(id)?.clone();
        self.mode = Mode::Editor;
        Ok(&self.active)
    }

    /// Replace the active target with a fresh blank document.
    pub fn new_blank(&mut self) -> &Document {
        self.active = Document::blank(Kind::Task);
        self.mode = Mode::Editor;
        &self.active
    }

    /// Create a document of the given kind: instantiated from the
    /// category's template when one exists, blank otherwise. The new
    /// document is appended to the collection, persisted immediately, and
    /// becomes the active target.
    pub fn create_document(&mut self, kind: Kind) -> Result<&Document> {
        let doc = match self.templates.iter().find(|t| t.category() == Some(kind)) {
            Some(template) => Document::instantiate(template),
            None => Document::blank(kind),
        };
        self.documents.push(doc.clone());
        self.store.save_documents(&self.documents)?;
        self.active = doc;
        self.mode = Mode::Editor;
        Ok(&self.active)
    }

    /// Materialize a non-persisted instance from a template. Saving from
    /// this mode always creates a new document; cancelling discards the
    /// instance.
    pub fn preview_template(&mut self, id: &str) -> Result<&Document> {
        let template = self.find_template(id)?;
        self.active = Document::instantiate(template);
        self.mode = Mode::TemplatePreview {
            source_template_id: id.to_string(),
        };
        Ok(&self.active)
    }

    /// Open the template entity itself for direct editing.
    pub fn edit_template(&mut self, id: &str) -> Result<&Document> {
        self.active = self.find_template(id)?.clone();
        self.mode = Mode::Editor;
        Ok(&self.active)
    }

    /// Start a blank template for the given category.
    pub fn create_template(&mut self, category: Kind) -> &Document {
        self.active = Document::blank_template(category);
        self.mode = Mode::Editor;
        &self.active
    }

    /// Leave the current edit, discarding unsaved state. Exits preview mode.
    pub fn cancel(&mut self) -> &Document {
        self.new_blank()
    }

    /// Persist an entity. Branches on what is being saved:
    /// - a template (with category-exclusivity enforcement),
    /// - a preview instance (always a brand-new document),
    /// - a normal document (update in place or prepend).
    pub fn save(&mut self, entity: Document, replace_confirmed: bool) -> Result<SaveOutcome> {
        if entity.is_template() {
            self.save_template(entity, replace_confirmed)
        } else if matches!(self.mode, Mode::TemplatePreview { .. }) {
            self.save_from_preview(entity)
        } else {
            self.save_document(entity)
        }
    }

    fn save_template(
        &mut self,
        mut template: Document,
        replace_confirmed: bool,
    ) -> Result<SaveOutcome> {
        if template.title.trim().is_empty() {
            template.title = UNTITLED_TEMPLATE.to_string();
        }
        let category = template.category().unwrap_or_default();

        // Category exclusivity: a different template occupying this
        // category must be explicitly replaced, or the save aborts with no
        // state change at all.
        if let Some(existing) = self
            .templates
            .iter()
            .find(|t| t.category() == Some(category) && t.id != template.id)
        {
            if !replace_confirmed {
                return Ok(SaveOutcome::CategoryConflict {
                    existing_id: existing.id.clone(),
                    existing_title: existing.title.clone(),
                });
            }
            let existing_id = existing.id.clone();
            if let Err(e) = self.store.delete_template(&existing_id) {
                warn!(error = %e, "failed to delete replaced template from backend");
            }
            self.templates.retain(|t| t.id != existing_id);
        }

        template.touch();
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(slot) => *slot = template.clone(),
            None => self.templates.insert(0, template.clone()),
        }
        self.store.save_templates(&self.templates)?;
        self.active = template;
        self.mode = Mode::Editor;
        Ok(SaveOutcome::Saved)
    }

    fn save_from_preview(&mut self, entity: Document) -> Result<SaveOutcome> {
        let source_id = match &self.mode {
            Mode::TemplatePreview { source_template_id } => source_template_id.clone(),
            Mode::Editor => unreachable!("checked by save"),
        };

        // Always a brand-new document; the source template is never touched.
        let mut doc = Document {
            id: crate::models::generate_id(),
            ..entity
        };
        doc.touch();
        if doc.title.trim().is_empty() {
            doc.title = match self.templates.iter().find(|t| t.id == source_id) {
                Some(source) => format!("{} (copy)", source.title),
                None => UNTITLED_DOCUMENT.to_string(),
            };
        }

        self.documents.insert(0, doc.clone());
        self.store.save_documents(&self.documents)?;
        self.active = doc;
        self.mode = Mode::Editor;
        Ok(SaveOutcome::Saved)
    }

    fn save_document(&mut self, mut doc: Document) -> Result<SaveOutcome> {
        doc.touch();
        match self.documents.iter_mut().find(|d| d.id == doc.id) {
            Some(slot) => *slot = doc.clone(),
            None => {
                if doc.title.trim().is_empty() {
                    doc.title = UNTITLED_DOCUMENT.to_string();
                }
                self.documents.insert(0, doc.clone());
            }
        }
        self.store.save_documents(&self.documents)?;
        self.active = doc;
        self.mode = Mode::Editor;
        Ok(SaveOutcome::Saved)
    }

    /// Record a delete target. The delete happens in
    /// [`Session::execute_delete`].
    pub fn request_delete(&mut self, target: DeleteTarget) -> Result<()> {
        match &target {
            DeleteTarget::Document(id) => {
                self.find_document(id)?;
            }
            DeleteTarget::Template(id) => {
                self.find_template(id)?;
            }
        }
        self.pending_delete = Some(target);
        Ok(())
    }

    pub fn pending_delete(&self) -> Option<&DeleteTarget> {
        self.pending_delete.as_ref()
    }

    /// Drop the pending delete without executing it.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Execute the recorded delete. Deleting the active entity resets the
    /// active target to a blank document; deleting the favorited document
    /// clears the favorite pointer.
    pub fn execute_delete(&mut self) -> Result<DeleteTarget> {
        let target = self
            .pending_delete
            .take()
            .ok_or_else(|| Error::InvalidInput("no delete pending".to_string()))?;

        match &target {
            DeleteTarget::Document(id) => {
                self.documents.retain(|d| &d.id != id);
                if let Err(e) = self.store.delete_document(id) {
                    warn!(error = %e, "failed to delete document from backend");
                }
                self.store.save_documents(&self.documents)?;
                if self.favorite_id.as_deref() == Some(id.as_str()) {
                    self.favorite_id = None;
                    self.store.clear_favorite_doc_id()?;
                }
                if self.active.id == *id {
                    self.new_blank();
                }
            }
            DeleteTarget::Template(id) => {
                self.templates.retain(|t| &t.id != id);
                if let Err(e) = self.store.delete_template(id) {
                    warn!(error = %e, "failed to delete template from backend");
                }
                self.store.save_templates(&self.templates)?;
                if self.active.id == *id {
                    self.new_blank();
                }
            }
        }
        Ok(target)
    }

    /// Point the favorite at an existing document. Persisted separately
    /// from the collections.
    pub fn set_favorite(&mut self, id: &str) -> Result<()> {
        self.find_document(id)?;
        self.store.set_favorite_doc_id(id)?;
        self.favorite_id = Some(id.to_string());
        Ok(())
    }

    pub fn clear_favorite(&mut self) -> Result<()> {
        self.store.clear_favorite_doc_id()?;
        self.favorite_id = None;
        Ok(())
    }

    /// Reorder one kind's partition of the document list. `ids` must be a
    /// permutation of that partition; every other partition keeps both its
    /// relative order and its interleaved positions.
    pub fn reorder_documents(&mut self, kind: Kind, ids: &[String]) -> Result<()> {
        let mut partition: Vec<Document> = Vec::new();
        for doc in &self.documents {
            if doc.kind() == Some(kind) {
                partition.push(doc.clone());
            }
        }
        if ids.len() != partition.len()
            || !partition.iter().all(|d| ids.contains(&d.id))
        {
            return Err(Error::InvalidInput(format!(
                "reorder requires a permutation of all {} {} document ids",
                partition.len(),
                kind
            )));
        }

        let mut reordered = ids
            .iter()
            .map(|id| partition.iter().find(|d| &d.id == id).cloned())
            .collect::<Option<Vec<_>>>()
            .expect("ids validated above")
            .into_iter();
        for slot in self.documents.iter_mut() {
            if slot.kind() == Some(kind) {
                *slot = reordered.next().expect("partition sizes match");
            }
        }
        self.store.save_documents(&self.documents)
    }

    /// Reorder the template list. `ids` must be a permutation of all
    /// template ids.
    pub fn reorder_templates(&mut self, ids: &[String]) -> Result<()> {
        if ids.len() != self.templates.len()
            || !self.templates.iter().all(|t| ids.contains(&t.id))
        {
            return Err(Error::InvalidInput(format!(
                "reorder requires a permutation of all {} template ids",
                self.templates.len()
            )));
        }
        self.templates = ids
            .iter()
            .map(|id| self.templates.iter().find(|t| &t.id == id).cloned())
            .collect::<Option<Vec<_>>>()
            .expect("ids validated above");
        self.store.save_templates(&self.templates)
    }

    /// Snapshot both collections into a backup.
    pub fn export(&self) -> Backup {
        self.store.export_all()
    }

    /// Apply a validated backup through the facade's import contract, then
    /// reload state from the backend - never from the blob - so memory
    /// reflects backend truth.
    pub fn restore(&mut self, backup: &Backup) -> Result<()> {
        self.store.import_all(backup)?;
        self.reload_collections();
        Ok(())
    }
}
