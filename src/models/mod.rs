//! Data models for Logbook entities.
//!
//! This module defines the core data structures:
//! - `Document` - One record type shared by live documents and templates
//! - `ChecklistItem` - An ordered checklist entry with an optional memo
//! - `Kind` - The closed set of document kinds / template categories
//! - `WireDocument` - The persistence representation (legacy flag encoding)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default title applied to a document saved with an empty title.
pub const UNTITLED_DOCUMENT: &str = "Untitled";

/// Default title applied to a template saved with an empty title.
pub const UNTITLED_TEMPLATE: &str = "Untitled Template";

/// Document kind for live documents, doubling as the template category.
///
/// Each template declares the kind of document it seeds; at most one
/// template exists per kind at any settled state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Kind {
    #[default]
    Task,
    Contract,
    Deposit,
    DailyNote,
}

impl Kind {
    pub const ALL: [Kind; 4] = [Kind::Task, Kind::Contract, Kind::Deposit, Kind::DailyNote];

    /// Parse a kind from its CLI spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "task" => Some(Kind::Task),
            "contract" => Some(Kind::Contract),
            "deposit" => Some(Kind::Deposit),
            "daily-note" | "daily_note" | "daily" => Some(Kind::DailyNote),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Task => "task",
            Kind::Contract => "contract",
            Kind::Deposit => "deposit",
            Kind::DailyNote => "daily-note",
        }
    }

    /// The category string used by the wire format. The stored spelling for
    /// deposits is the legacy `jangeuum`.
    fn wire_category(&self) -> &'static str {
        match self {
            Kind::Task => "task",
            Kind::Contract => "contract",
            Kind::Deposit => "jangeuum",
            Kind::DailyNote => "dailyNote",
        }
    }

    fn from_wire_category(s: &str) -> Option<Self> {
        match s {
            "task" => Some(Kind::Task),
            "contract" => Some(Kind::Contract),
            "jangeuum" => Some(Kind::Deposit),
            "dailyNote" => Some(Kind::DailyNote),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a record is a live document or a template, with its kind.
///
/// A template never carries a live-document kind and a live document never
/// carries a template category; the tagged representation makes the
/// mutually-exclusive flag triple of the stored format unrepresentable in
/// memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Document(Kind),
    Template(Kind),
}

/// An ordered checklist entry. Item ids are unique within their parent
/// document only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub checked: bool,
    pub memo: Option<String>,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            text: text.into(),
            checked: false,
            memo: None,
        }
    }
}

/// A document or template tracked by Logbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Opaque unique identifier, assigned at creation time, immutable.
    pub id: String,

    /// Display title; may be empty while editing, defaulted at save time.
    pub title: String,

    /// Free-form text body.
    pub content: String,

    /// Ordered checklist; order represents user-chosen priority.
    pub checklist: Vec<ChecklistItem>,

    /// Refreshed on every persisted mutation. Never encodes creation time.
    pub updated_at: DateTime<Utc>,

    pub role: Role,
}

impl Document {
    /// Create a blank live document of the given kind.
    pub fn blank(kind: Kind) -> Self {
        Self {
            id: generate_id(),
            title: String::new(),
            content: String::new(),
            checklist: Vec::new(),
            updated_at: Utc::now(),
            role: Role::Document(kind),
        }
    }

    /// Create a blank template seeding the given category.
    pub fn blank_template(category: Kind) -> Self {
        Self {
            id: generate_id(),
            title: String::new(),
            content: String::new(),
            checklist: Vec::new(),
            updated_at: Utc::now(),
            role: Role::Template(category),
        }
    }

    /// Materialize a live document from a template: fresh entity id, deep
    /// copy of the checklist with fresh item ids and every item unchecked,
    /// kind taken from the template's category.
    pub fn instantiate(template: &Document) -> Self {
        Self {
            id: generate_id(),
            title: template.title.clone(),
            content: template.content.clone(),
            checklist: template
                .checklist
                .iter()
                .map(|item| ChecklistItem {
                    id: generate_id(),
                    text: item.text.clone(),
                    checked: false,
                    memo: item.memo.clone(),
                })
                .collect(),
            updated_at: Utc::now(),
            role: Role::Document(template.category().unwrap_or_default()),
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self.role, Role::Template(_))
    }

    /// The live-document kind, `None` for templates.
    pub fn kind(&self) -> Option<Kind> {
        match self.role {
            Role::Document(kind) => Some(kind),
            Role::Template(_) => None,
        }
    }

    /// The template category, `None` for live documents.
    pub fn category(&self) -> Option<Kind> {
        match self.role {
            Role::Template(category) => Some(category),
            Role::Document(_) => None,
        }
    }

    /// Refresh `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Generate an identifier combining the current milliseconds with a random
/// suffix. Unique within the process's practical lifetime; collisions across
/// processes are astronomically unlikely but not impossible.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{:x}-{}", millis, &suffix[..8])
}

/// Persistence representation of a checklist item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireChecklistItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// Persistence representation of a document.
///
/// This is the exact shape stored by the original system: camelCase field
/// names, `updatedAt` in milliseconds since epoch, and the mutually-exclusive
/// kind flag triple. Records and backup files written by it decode unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDocument {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub checklist: Vec<WireChecklistItem>,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_daily_note: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_contract: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_jangeuum: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_category: Option<String>,
}

impl From<&Document> for WireDocument {
    fn from(doc: &Document) -> Self {
        let flag = |set: bool| if set { Some(true) } else { None };
        let (is_template, kind, category) = match doc.role {
            Role::Document(kind) => (false, Some(kind), None),
            Role::Template(category) => (true, None, Some(category)),
        };
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            content: doc.content.clone(),
            checklist: doc
                .checklist
                .iter()
                .map(|item| WireChecklistItem {
                    id: item.id.clone(),
                    text: item.text.clone(),
                    is_checked: item.checked,
                    memo: item.memo.clone(),
                })
                .collect(),
            updated_at: doc.updated_at.timestamp_millis(),
            is_template,
            is_daily_note: flag(kind == Some(Kind::DailyNote)),
            is_contract: flag(kind == Some(Kind::Contract)),
            is_jangeuum: flag(kind == Some(Kind::Deposit)),
            template_category: category.map(|c| c.wire_category().to_string()),
        }
    }
}

impl From<WireDocument> for Document {
    fn from(wire: WireDocument) -> Self {
        let role = if wire.is_template {
            // A template without a category predates the category migration;
            // it defaults to seeding tasks.
            let category = wire
                .template_category
                .as_deref()
                .and_then(Kind::from_wire_category)
                .unwrap_or_default();
            Role::Template(category)
        } else if wire.is_daily_note == Some(true) {
            Role::Document(Kind::DailyNote)
        } else if wire.is_contract == Some(true) {
            Role::Document(Kind::Contract)
        } else if wire.is_jangeuum == Some(true) {
            Role::Document(Kind::Deposit)
        } else {
            Role::Document(Kind::Task)
        };
        Self {
            id: wire.id,
            title: wire.title,
            content: wire.content,
            checklist: wire
                .checklist
                .into_iter()
                .map(|item| ChecklistItem {
                    id: item.id,
                    text: item.text,
                    checked: item.is_checked,
                    memo: item.memo,
                })
                .collect(),
            updated_at: DateTime::from_timestamp_millis(wire.updated_at)
                .unwrap_or_else(Utc::now),
            role,
        }
    }
}

/// Encode a collection for persistence.
pub fn to_wire(docs: &[Document]) -> Vec<WireDocument> {
    docs.iter().map(WireDocument::from).collect()
}

/// Decode a persisted collection.
pub fn from_wire(wire: Vec<WireDocument>) -> Vec<Document> {
    wire.into_iter().map(Document::from).collect()
}
