//! Configuration for Logbook.
//!
//! One KDL file, `config.kdl`, in the data directory:
//!
//! ```kdl
//! output-format "human"  // or "json"
//! remote {
//!     url "https://store.example.com/u/alice"
//!     token "..."
//! }
//! ```
//!
//! The `remote` block is what switches the storage facade from local-only
//! to remote-first operation; without it the tool is fully offline.

use std::fs;
use std::path::{Path, PathBuf};

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use tracing::warn;

use crate::Result;

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Remote document store endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    pub token: Option<String>,
}

impl RemoteConfig {
    /// Mask the token for display purposes.
    pub fn masked_token(&self) -> Option<String> {
        self.token.as_ref().map(|token| {
            if token.len() <= 8 {
                "...".to_string()
            } else {
                format!("{}...{}", &token[..4], &token[token.len() - 4..])
            }
        })
    }
}

/// User preferences and remote endpoint stored in config.kdl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogbookConfig {
    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Remote document store endpoint; absent means local-only operation
    pub remote: Option<RemoteConfig>,
}

impl LogbookConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the config file under the given data directory.
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join("config.kdl")
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(remote) = &self.remote {
            if remote.url.trim().is_empty() {
                return Err("remote url must not be empty".to_string());
            }
            if !remote.url.starts_with("http://") && !remote.url.starts_with("https://") {
                return Err(format!("remote url must be http(s): {}", remote.url));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        if let Some(node) = doc.get("output-format") {
            if let Some(entry) = node.entries().first() {
                if let Some(s) = entry.value().as_string() {
                    config.output_format = OutputFormat::parse(s);
                }
            }
        }

        if let Some(node) = doc.get("remote") {
            if let Some(children) = node.children() {
                let string_of = |name: &str| -> Option<String> {
                    children
                        .get(name)
                        .and_then(|n| n.entries().first())
                        .and_then(|e| e.value().as_string())
                        .map(|s| s.to_string())
                };
                if let Some(url) = string_of("url") {
                    config.remote = Some(RemoteConfig {
                        url,
                        token: string_of("token"),
                    });
                }
            }
        }

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref format) = self.output_format {
            let mut node = KdlNode::new("output-format");
            node.push(KdlEntry::new(KdlValue::String(format.as_str().to_string())));
            doc.nodes_mut().push(node);
        }

        if let Some(ref remote) = self.remote {
            let mut node = KdlNode::new("remote");
            let mut children = KdlDocument::new();

            let mut url = KdlNode::new("url");
            url.push(KdlEntry::new(KdlValue::String(remote.url.clone())));
            children.nodes_mut().push(url);

            if let Some(ref token) = remote.token {
                let mut token_node = KdlNode::new("token");
                token_node.push(KdlEntry::new(KdlValue::String(token.clone())));
                children.nodes_mut().push(token_node);
            }

            node.set_children(children);
            doc.nodes_mut().push(node);
        }

        doc
    }

    /// Load the config file. A missing file is an empty config; an
    /// unreadable or unparsable one is reported once and treated as empty.
    pub fn load(data_dir: &Path) -> Self {
        let path = Self::path(data_dir);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read config");
                return Self::new();
            }
        };
        match raw.parse::<KdlDocument>() {
            Ok(doc) => Self::from_kdl(&doc),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed config, ignoring");
                Self::new()
            }
        }
    }

    /// Write the config file.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        fs::create_dir_all(data_dir)?;
        fs::write(Self::path(data_dir), self.to_kdl().to_string())?;
        Ok(())
    }
}
