//! CLI argument definitions for Logbook.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Logbook - a personal document and checklist manager.
///
/// Documents come in four kinds (task, contract, deposit, daily-note), each
/// optionally seeded from that kind's template.
#[derive(Parser, Debug)]
#[command(name = "lb")]
#[command(author, version, about = "A CLI document and checklist manager", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Data directory override. Defaults to the platform data dir
    /// (e.g. ~/.local/share/logbook).
    #[arg(long = "data-dir", global = true, env = "LB_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Document commands
    Doc {
        #[command(subcommand)]
        command: DocCommands,
    },

    /// Template commands
    Tpl {
        #[command(subcommand)]
        command: TplCommands,
    },

    /// Favorite document commands
    Favorite {
        #[command(subcommand)]
        command: FavoriteCommands,
    },

    /// Backup and restore commands
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },

    /// Installation-level commands (info, migrations, config)
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocCommands {
    /// Create a document, seeded from the kind's template when one exists
    New {
        /// Title (defaults to the template's title, or empty)
        title: Option<String>,

        /// Document kind: task, contract, deposit, daily-note
        #[arg(long, default_value = "task")]
        kind: String,

        /// Body text
        #[arg(long)]
        content: Option<String>,
    },

    /// List documents
    List {
        /// Only documents of this kind
        #[arg(long)]
        kind: Option<String>,
    },

    /// Show one document with its checklist
    Show {
        id: String,
    },

    /// Update fields of a document and save it
    Set {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        /// Append a checklist item (repeatable)
        #[arg(long = "add-item", value_name = "TEXT")]
        add_items: Vec<String>,

        /// Check the checklist item at this position (repeatable, 0-based)
        #[arg(long, value_name = "INDEX")]
        check: Vec<usize>,

        /// Uncheck the checklist item at this position (repeatable, 0-based)
        #[arg(long, value_name = "INDEX")]
        uncheck: Vec<usize>,

        /// Attach a memo to the checklist item at INDEX
        #[arg(long, num_args = 2, value_names = ["INDEX", "TEXT"])]
        memo: Vec<String>,
    },

    /// Edit a document interactively with debounced autosave
    Edit {
        id: String,
    },

    /// Delete a document. Without -y only reports what would be deleted.
    Delete {
        id: String,

        /// Confirm the deletion
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },

    /// Reorder the documents of one kind. IDS must list every document of
    /// that kind; other kinds keep their positions.
    Reorder {
        #[arg(long, default_value = "task")]
        kind: String,

        ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TplCommands {
    /// Create and save a template for a category
    New {
        /// Title (defaults to "Untitled Template")
        title: Option<String>,

        /// Template category: task, contract, deposit, daily-note
        #[arg(long, default_value = "task")]
        category: String,

        /// Body text
        #[arg(long)]
        content: Option<String>,

        /// Append a checklist item (repeatable)
        #[arg(long = "add-item", value_name = "TEXT")]
        add_items: Vec<String>,

        /// Replace an existing template occupying the same category
        #[arg(long)]
        replace: bool,
    },

    /// List templates
    List,

    /// Show one template with its checklist
    Show {
        id: String,
    },

    /// Update fields of a template and save it
    Set {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        /// Move the template to another category
        #[arg(long)]
        category: Option<String>,

        /// Append a checklist item (repeatable)
        #[arg(long = "add-item", value_name = "TEXT")]
        add_items: Vec<String>,

        /// Replace an existing template occupying the target category
        #[arg(long)]
        replace: bool,
    },

    /// Delete a template. Without -y only reports what would be deleted.
    Delete {
        id: String,

        /// Confirm the deletion
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },

    /// Materialize a template instance without saving it. With --save the
    /// instance becomes a new document; the template is never modified.
    Preview {
        id: String,

        /// Save the previewed instance as a new document
        #[arg(long)]
        save: bool,

        /// Title for the saved document (defaults to "<template> (copy)")
        #[arg(long)]
        title: Option<String>,
    },

    /// Reorder the template list. IDS must list every template id.
    Reorder {
        ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum FavoriteCommands {
    /// Point the favorite at a document
    Set {
        id: String,
    },

    /// Clear the favorite pointer
    Clear,

    /// Show the favorite document
    Show,
}

#[derive(Subcommand, Debug)]
pub enum BackupCommands {
    /// Export all documents and templates to a JSON backup file
    Export {
        /// Output path (defaults to logbook-backup-<date>.json)
        file: Option<PathBuf>,
    },

    /// Restore a JSON backup file. Entities are upserted by id; nothing
    /// absent from the backup is deleted.
    Import {
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum SystemCommands {
    /// Show paths, remote status, migration flags, and build info
    Info,

    /// Run any pending one-time migrations
    Migrate,

    /// Read or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the current configuration
    Get,

    /// Change configuration values
    Set {
        /// Default output format: json or human
        #[arg(long = "output-format")]
        output_format: Option<String>,

        /// Remote document store URL
        #[arg(long = "remote-url")]
        remote_url: Option<String>,

        /// Remote bearer token
        #[arg(long = "remote-token")]
        remote_token: Option<String>,

        /// Remove the remote configuration (go local-only)
        #[arg(long = "clear-remote")]
        clear_remote: bool,
    },
}
