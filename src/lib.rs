//! Logbook - a personal document and checklist manager.
//!
//! This library provides the core functionality for the `lb` CLI tool:
//! documents paired with ordered checklists, category-exclusive templates,
//! and persistence to a remote document store with a local fallback.

pub mod cli;
pub mod config;
pub mod migrate;
pub mod models;
pub mod session;
pub mod storage;


/// Library-level error type for Logbook operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Remote store error: {0}")]
    Remote(#[from] storage::remote::RemoteError),

    #[error("Invalid backup file: {0}")]
    InvalidBackup(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Logbook operations.
pub type Result<T> = std::result::Result<T, Error>;
