//! Remote persistence adapter.
//!
//! The remote document store keeps one record per entity, keyed by id.
//! Unlike the local adapter's full-collection replacement, remote writes are
//! per-entity upserts, and reads come back ordered by `updated_at`
//! descending (store-side ordering, authoritative).
//!
//! Every failure is caught at this boundary and surfaced as a typed
//! [`RemoteError`]; nothing from the HTTP client leaks to callers.

use std::time::Duration;

use chrono::Utc;

use crate::models::{Document, WireDocument, from_wire};

/// Errors surfaced by a remote store operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    /// The store answered with a non-success status.
    #[error("remote returned HTTP {0}: {1}")]
    Status(u16, String),

    /// Network or other transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered with a body we could not decode.
    #[error("failed to parse remote response: {0}")]
    Parse(String),
}

/// Per-entity remote store operations.
///
/// Implementations stamp `updated_at` at write time; the caller-provided
/// timestamp is never trusted. Deleting a nonexistent id is a no-op.
pub trait RemoteStore: Send + Sync {
    /// All live documents, newest `updated_at` first.
    fn documents(&self) -> Result<Vec<Document>, RemoteError>;

    /// All templates, newest `updated_at` first.
    fn templates(&self) -> Result<Vec<Document>, RemoteError>;

    /// Upsert one document by id.
    fn save_document(&self, doc: &Document) -> Result<(), RemoteError>;

    /// Upsert one template by id.
    fn save_template(&self, tpl: &Document) -> Result<(), RemoteError>;

    fn delete_document(&self, id: &str) -> Result<(), RemoteError>;

    fn delete_template(&self, id: &str) -> Result<(), RemoteError>;
}

/// HTTP implementation of [`RemoteStore`].
///
/// Talks to a REST document store:
/// - `GET    {base}/{collection}?order=updated_at.desc`
/// - `PUT    {base}/{collection}/{id}` with a JSON body
/// - `DELETE {base}/{collection}/{id}` (404 tolerated)
pub struct HttpRemote {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

impl HttpRemote {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}?order=updated_at.desc", self.base_url, collection)
    }

    fn entity_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, id)
    }

    fn authorize(&self, req: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => req.set("Authorization", &format!("Bearer {}", token)),
            None => req,
        }
    }

    fn fetch(&self, collection: &str) -> Result<Vec<Document>, RemoteError> {
        let req = self.authorize(self.agent.get(&self.collection_url(collection)));
        let resp = req.call().map_err(map_err)?;
        let wire: Vec<WireDocument> = resp
            .into_json()
            .map_err(|e| RemoteError::Parse(e.to_string()))?;
        // The store orders by updated_at descending; trust it.
        Ok(from_wire(wire))
    }

    fn upsert(&self, collection: &str, entity: &Document) -> Result<(), RemoteError> {
        let mut stamped = entity.clone();
        stamped.updated_at = Utc::now();
        let req = self.authorize(
            self.agent
                .request("PUT", &self.entity_url(collection, &stamped.id)),
        );
        req.send_json(WireDocument::from(&stamped)).map_err(map_err)?;
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        let req = self.authorize(self.agent.delete(&self.entity_url(collection, id)));
        match req.call() {
            Ok(_) => Ok(()),
            // Already gone: a delete of a nonexistent id is a no-op.
            Err(ureq::Error::Status(404, _)) => Ok(()),
            Err(e) => Err(map_err(e)),
        }
    }
}

impl RemoteStore for HttpRemote {
    fn documents(&self) -> Result<Vec<Document>, RemoteError> {
        self.fetch("documents")
    }

    fn templates(&self) -> Result<Vec<Document>, RemoteError> {
        self.fetch("templates")
    }

    fn save_document(&self, doc: &Document) -> Result<(), RemoteError> {
        self.upsert("documents", doc)
    }

    fn save_template(&self, tpl: &Document) -> Result<(), RemoteError> {
        self.upsert("templates", tpl)
    }

    fn delete_document(&self, id: &str) -> Result<(), RemoteError> {
        self.delete("documents", id)
    }

    fn delete_template(&self, id: &str) -> Result<(), RemoteError> {
        self.delete("templates", id)
    }
}

fn map_err(err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            RemoteError::Status(code, body)
        }
        ureq::Error::Transport(t) => RemoteError::Transport(t.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let remote = HttpRemote::new("https://store.example.com/u/alice/", None);
        assert_eq!(
            remote.entity_url("documents", "abc"),
            "https://store.example.com/u/alice/documents/abc"
        );
        assert_eq!(
            remote.collection_url("templates"),
            "https://store.example.com/u/alice/templates?order=updated_at.desc"
        );
    }
}
