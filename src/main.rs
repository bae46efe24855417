//! Logbook CLI - a personal document and checklist manager.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use serde_json::json;

use logbook::cli::{
    BackupCommands, Cli, Commands, ConfigCommands, DocCommands, FavoriteCommands, SystemCommands,
    TplCommands,
};
use logbook::config::{LogbookConfig, OutputFormat};
use logbook::migrate;
use logbook::models::{ChecklistItem, Document, Kind, Role};
use logbook::session::autosave::{DEFAULT_WINDOW, Debouncer};
use logbook::session::{DeleteTarget, Session};
use logbook::storage::{self, Backup, HttpRemote, LocalStore, RemoteStore, Store};
use logbook::{Error, Result};

fn main() {
    init_logging();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(storage::data_dir);
    let config = LogbookConfig::load(&data_dir);
    let human = cli.human_readable || config.output_format == Some(OutputFormat::Human);

    if let Err(e) = run_command(cli.command, &data_dir, &config, human) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("LB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Construct the storage facade: the local store is always present, the
/// remote only when configured.
fn build_store(data_dir: &Path, config: &LogbookConfig) -> Result<Store> {
    let local = LocalStore::open(data_dir)?;
    let remote = config.remote.as_ref().map(|r| {
        Box::new(HttpRemote::new(&r.url, r.token.clone())) as Box<dyn RemoteStore>
    });
    Ok(Store::new(local, remote))
}

/// Open a loaded session: build the facade, run pending migrations, load
/// collections and the favorite pointer.
fn open_session(data_dir: &Path, config: &LogbookConfig) -> Result<Session> {
    let store = build_store(data_dir, config)?;
    migrate::run(&store);
    let mut session = Session::new(store);
    session.load();
    Ok(session)
}

fn run_command(
    command: Commands,
    data_dir: &Path,
    config: &LogbookConfig,
    human: bool,
) -> Result<()> {
    match command {
        Commands::Doc { command } => doc_command(command, data_dir, config, human),
        Commands::Tpl { command } => tpl_command(command, data_dir, config, human),
        Commands::Favorite { command } => favorite_command(command, data_dir, config, human),
        Commands::Backup { command } => backup_command(command, data_dir, config, human),
        Commands::System { command } => system_command(command, data_dir, config, human),
    }
}

fn parse_kind(s: &str) -> Result<Kind> {
    Kind::parse(s).ok_or_else(|| {
        Error::InvalidInput(format!(
            "unknown kind '{}' (expected task, contract, deposit, daily-note)",
            s
        ))
    })
}

// ---------------------------------------------------------------------------
// Output helpers

fn emit(human: bool, value: serde_json::Value, text: String) {
    if human {
        println!("{}", text);
    } else {
        println!("{}", value);
    }
}

fn checked_count(doc: &Document) -> usize {
    doc.checklist.iter().filter(|i| i.checked).count()
}

fn doc_summary(doc: &Document) -> serde_json::Value {
    json!({
        "id": doc.id,
        "title": doc.title,
        "kind": doc.kind().map(|k| k.as_str().to_string()),
        "category": doc.category().map(|k| k.as_str().to_string()),
        "is_template": doc.is_template(),
        "updated_at": doc.updated_at.to_rfc3339(),
        "checklist": { "checked": checked_count(doc), "total": doc.checklist.len() },
    })
}

fn doc_detail(doc: &Document) -> serde_json::Value {
    let mut value = doc_summary(doc);
    value["content"] = json!(doc.content);
    value["items"] = json!(
        doc.checklist
            .iter()
            .map(|item| {
                json!({
                    "id": item.id,
                    "text": item.text,
                    "checked": item.checked,
                    "memo": item.memo,
                })
            })
            .collect::<Vec<_>>()
    );
    value
}

fn doc_line(doc: &Document) -> String {
    let label = doc
        .kind()
        .or(doc.category())
        .map(|k| k.as_str())
        .unwrap_or("task");
    let title = if doc.title.is_empty() {
        "(untitled)"
    } else {
        doc.title.as_str()
    };
    format!(
        "{}  [{}] {} ({}/{})",
        doc.id,
        label,
        title,
        checked_count(doc),
        doc.checklist.len()
    )
}

fn doc_text(doc: &Document) -> String {
    let mut out = doc_line(doc);
    if !doc.content.is_empty() {
        out.push('\n');
        out.push_str(&doc.content);
    }
    for item in &doc.checklist {
        out.push_str(&format!(
            "\n  [{}] {}",
            if item.checked { "x" } else { " " },
            item.text
        ));
        if let Some(memo) = &item.memo {
            out.push_str(&format!("\n      memo: {}", memo));
        }
    }
    out
}

fn list_text(docs: &[&Document]) -> String {
    if docs.is_empty() {
        "(none)".to_string()
    } else {
        docs.iter().map(|d| doc_line(d)).collect::<Vec<_>>().join("\n")
    }
}

// ---------------------------------------------------------------------------
// Document commands

fn doc_command(
    command: DocCommands,
    data_dir: &Path,
    config: &LogbookConfig,
    human: bool,
) -> Result<()> {
    match command {
        DocCommands::New {
            title,
            kind,
            content,
        } => {
            let kind = parse_kind(&kind)?;
            let mut session = open_session(data_dir, config)?;
            let mut doc = session.create_document(kind)?.clone();
            if title.is_some() || content.is_some() {
                if let Some(title) = title {
                    doc.title = title;
                }
                if let Some(content) = content {
                    doc.content = content;
                }
                session.save(doc, false)?;
                doc = session.active().clone();
            }
            emit(human, doc_detail(&doc), format!("created {}", doc_line(&doc)));
            Ok(())
        }

        DocCommands::List { kind } => {
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let session = open_session(data_dir, config)?;
            let docs: Vec<&Document> = session
                .documents()
                .iter()
                .filter(|d| kind.is_none() || d.kind() == kind)
                .collect();
            let value = json!(docs.iter().map(|d| doc_summary(d)).collect::<Vec<_>>());
            emit(human, value, list_text(&docs));
            Ok(())
        }

        DocCommands::Show { id } => {
            let mut session = open_session(data_dir, config)?;
            let doc = session.open_document(&id)?.clone();
            emit(human, doc_detail(&doc), doc_text(&doc));
            Ok(())
        }

        DocCommands::Set {
            id,
            title,
            content,
            add_items,
            check,
            uncheck,
            memo,
        } => {
            let mut session = open_session(data_dir, config)?;
            let mut doc = session.open_document(&id)?.clone();
            apply_edits(&mut doc, title, content, add_items);
            for index in check {
                set_checked(&mut doc, index, true)?;
            }
            for index in uncheck {
                set_checked(&mut doc, index, false)?;
            }
            if !memo.is_empty() {
                let index: usize = memo[0]
                    .parse()
                    .map_err(|_| Error::InvalidInput(format!("bad item index '{}'", memo[0])))?;
                item_at(&mut doc, index)?.memo = Some(memo[1].clone());
            }
            session.save(doc, false)?;
            let doc = session.active().clone();
            emit(human, doc_detail(&doc), format!("saved {}", doc_line(&doc)));
            Ok(())
        }

        DocCommands::Edit { id } => interactive_edit(data_dir, config, &id, human),

        DocCommands::Delete { id, yes } => {
            let mut session = open_session(data_dir, config)?;
            session.request_delete(DeleteTarget::Document(id.clone()))?;
            let doc = session.documents().iter().find(|d| d.id == id).cloned();
            let title = doc.map(|d| d.title).unwrap_or_default();
            if !yes {
                session.cancel_delete();
                emit(
                    human,
                    json!({ "pending": { "id": id, "title": title }, "deleted": false }),
                    format!("would delete '{}' ({}); re-run with -y to confirm", title, id),
                );
                return Ok(());
            }
            session.execute_delete()?;
            emit(
                human,
                json!({ "deleted": true, "id": id }),
                format!("deleted '{}' ({})", title, id),
            );
            Ok(())
        }

        DocCommands::Reorder { kind, ids } => {
            let kind = parse_kind(&kind)?;
            let mut session = open_session(data_dir, config)?;
            session.reorder_documents(kind, &ids)?;
            let docs: Vec<&Document> = session
                .documents()
                .iter()
                .filter(|d| d.kind() == Some(kind))
                .collect();
            let value = json!(docs.iter().map(|d| doc_summary(d)).collect::<Vec<_>>());
            emit(human, value, list_text(&docs));
            Ok(())
        }
    }
}

fn apply_edits(
    doc: &mut Document,
    title: Option<String>,
    content: Option<String>,
    add_items: Vec<String>,
) {
    if let Some(title) = title {
        doc.title = title;
    }
    if let Some(content) = content {
        doc.content = content;
    }
    for text in add_items {
        doc.checklist.push(ChecklistItem::new(text));
    }
}

fn item_at(doc: &mut Document, index: usize) -> Result<&mut ChecklistItem> {
    let len = doc.checklist.len();
    doc.checklist.get_mut(index).ok_or_else(|| {
        Error::InvalidInput(format!("item index {} out of range (0..{})", index, len))
    })
}

fn set_checked(doc: &mut Document, index: usize, checked: bool) -> Result<()> {
    item_at(doc, index)?.checked = checked;
    Ok(())
}

/// Interactive edit loop. Lines append to the body; `:t`, `:a`, `:x` edit
/// the title and checklist; `:q` (or EOF / Ctrl-C) leaves the editor with a
/// final explicit save. Intermediate states persist through the debounced
/// autosave.
fn interactive_edit(data_dir: &Path, config: &LogbookConfig, id: &str, human: bool) -> Result<()> {
    let mut session = open_session(data_dir, config)?;
    let mut doc = session.open_document(id)?.clone();

    // The flush runs on the debouncer's worker thread with its own facade.
    let flush_store = build_store(data_dir, config)?;
    let debouncer = Debouncer::new(DEFAULT_WINDOW, move |doc: Document| {
        let mut docs = flush_store.documents();
        match docs.iter_mut().find(|d| d.id == doc.id) {
            Some(slot) => *slot = doc,
            None => docs.insert(0, doc),
        }
        if let Err(e) = flush_store.save_documents(&docs) {
            tracing::warn!(error = %e, "debounced autosave failed");
        }
    });

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        let _ = ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst));
    }

    if human {
        eprintln!("editing '{}' - text appends to the body", doc.title);
        eprintln!("  :t <title>   set the title");
        eprintln!("  :a <text>    add a checklist item");
        eprintln!("  :x <index>   toggle a checklist item");
        eprintln!("  :q           save and quit");
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if interrupted.load(Ordering::SeqCst) {
            break;
        }
        let line = line?;
        if line == ":q" {
            break;
        }
        if let Some(title) = line.strip_prefix(":t ") {
            doc.title = title.to_string();
        } else if let Some(text) = line.strip_prefix(":a ") {
            doc.checklist.push(ChecklistItem::new(text));
        } else if let Some(index) = line.strip_prefix(":x ") {
            match index.trim().parse::<usize>() {
                Ok(i) if i < doc.checklist.len() => {
                    doc.checklist[i].checked = !doc.checklist[i].checked;
                }
                _ => eprintln!("no checklist item at index '{}'", index.trim()),
            }
        } else {
            if !doc.content.is_empty() {
                doc.content.push('\n');
            }
            doc.content.push_str(&line);
        }
        debouncer.arm(doc.clone());
    }

    // Leaving the editor is an explicit save; the pending debounced write
    // is superseded, not flushed.
    debouncer.cancel();
    session.save(doc, false)?;
    let doc = session.active().clone();
    emit(human, doc_detail(&doc), format!("saved {}", doc_line(&doc)));
    Ok(())
}

// ---------------------------------------------------------------------------
// Template commands

fn tpl_command(
    command: TplCommands,
    data_dir: &Path,
    config: &LogbookConfig,
    human: bool,
) -> Result<()> {
    match command {
        TplCommands::New {
            title,
            category,
            content,
            add_items,
            replace,
        } => {
            let category = parse_kind(&category)?;
            let mut session = open_session(data_dir, config)?;
            let mut tpl = session.create_template(category).clone();
            apply_edits(&mut tpl, title, content, add_items);
            save_template(&mut session, tpl, replace, human)
        }

        TplCommands::List => {
            let session = open_session(data_dir, config)?;
            let tpls: Vec<&Document> = session.templates().iter().collect();
            let value = json!(tpls.iter().map(|t| doc_summary(t)).collect::<Vec<_>>());
            emit(human, value, list_text(&tpls));
            Ok(())
        }

        TplCommands::Show { id } => {
            let mut session = open_session(data_dir, config)?;
            let tpl = session.edit_template(&id)?.clone();
            emit(human, doc_detail(&tpl), doc_text(&tpl));
            Ok(())
        }

        TplCommands::Set {
            id,
            title,
            content,
            category,
            add_items,
            replace,
        } => {
            let mut session = open_session(data_dir, config)?;
            let mut tpl = session.edit_template(&id)?.clone();
            apply_edits(&mut tpl, title, content, add_items);
            if let Some(category) = category {
                tpl.role = Role::Template(parse_kind(&category)?);
            }
            save_template(&mut session, tpl, replace, human)
        }

        TplCommands::Delete { id, yes } => {
            let mut session = open_session(data_dir, config)?;
            session.request_delete(DeleteTarget::Template(id.clone()))?;
            let title = session
                .templates()
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.title.clone())
                .unwrap_or_default();
            if !yes {
                session.cancel_delete();
                emit(
                    human,
                    json!({ "pending": { "id": id, "title": title }, "deleted": false }),
                    format!("would delete template '{}' ({}); re-run with -y to confirm", title, id),
                );
                return Ok(());
            }
            session.execute_delete()?;
            emit(
                human,
                json!({ "deleted": true, "id": id }),
                format!("deleted template '{}' ({})", title, id),
            );
            Ok(())
        }

        TplCommands::Preview { id, save, title } => {
            let mut session = open_session(data_dir, config)?;
            let preview = session.preview_template(&id)?.clone();
            if !save {
                let mut value = doc_detail(&preview);
                value["saved"] = json!(false);
                emit(
                    human,
                    value,
                    format!("preview (not saved): {}", doc_text(&preview)),
                );
                return Ok(());
            }
            let mut doc = preview;
            if let Some(title) = title {
                doc.title = title;
            }
            session.save(doc, false)?;
            let doc = session.active().clone();
            emit(human, doc_detail(&doc), format!("created {}", doc_line(&doc)));
            Ok(())
        }

        TplCommands::Reorder { ids } => {
            let mut session = open_session(data_dir, config)?;
            session.reorder_templates(&ids)?;
            let tpls: Vec<&Document> = session.templates().iter().collect();
            let value = json!(tpls.iter().map(|t| doc_summary(t)).collect::<Vec<_>>());
            emit(human, value, list_text(&tpls));
            Ok(())
        }
    }
}

/// Save a template, reporting a category conflict as a decision point
/// rather than an error: without `--replace` the save aborts with no state
/// change.
fn save_template(
    session: &mut Session,
    template: Document,
    replace: bool,
    human: bool,
) -> Result<()> {
    use logbook::session::SaveOutcome;
    match session.save(template, replace)? {
        SaveOutcome::Saved => {
            let tpl = session.active().clone();
            emit(
                human,
                doc_detail(&tpl),
                format!("saved template {}", doc_line(&tpl)),
            );
            Ok(())
        }
        SaveOutcome::CategoryConflict {
            existing_id,
            existing_title,
        } => {
            emit(
                human,
                json!({
                    "saved": false,
                    "conflict": { "id": existing_id, "title": existing_title },
                }),
                format!(
                    "category already held by '{}' ({}); re-run with --replace to replace it",
                    existing_title, existing_id
                ),
            );
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Favorite commands

fn favorite_command(
    command: FavoriteCommands,
    data_dir: &Path,
    config: &LogbookConfig,
    human: bool,
) -> Result<()> {
    match command {
        FavoriteCommands::Set { id } => {
            let mut session = open_session(data_dir, config)?;
            session.set_favorite(&id)?;
            emit(
                human,
                json!({ "favorite": id }),
                format!("favorite set to {}", id),
            );
            Ok(())
        }

        FavoriteCommands::Clear => {
            let mut session = open_session(data_dir, config)?;
            session.clear_favorite()?;
            emit(human, json!({ "favorite": null }), "favorite cleared".to_string());
            Ok(())
        }

        FavoriteCommands::Show => {
            let session = open_session(data_dir, config)?;
            match session
                .favorite_id()
                .and_then(|id| session.documents().iter().find(|d| d.id == id))
            {
                Some(doc) => emit(human, doc_detail(doc), doc_text(doc)),
                None => emit(human, json!({ "favorite": null }), "(no favorite)".to_string()),
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Backup commands

fn backup_command(
    command: BackupCommands,
    data_dir: &Path,
    config: &LogbookConfig,
    human: bool,
) -> Result<()> {
    match command {
        BackupCommands::Export { file } => {
            let session = open_session(data_dir, config)?;
            let backup = session.export();
            let path = file.unwrap_or_else(default_backup_path);
            write_backup(&path, &backup)?;
            emit(
                human,
                json!({
                    "file": path.display().to_string(),
                    "documents": backup.documents.len(),
                    "templates": backup.templates.len(),
                }),
                format!(
                    "exported {} documents and {} templates to {}",
                    backup.documents.len(),
                    backup.templates.len(),
                    path.display()
                ),
            );
            Ok(())
        }

        BackupCommands::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .map_err(|e| Error::Other(format!("failed to read {}: {}", file.display(), e)))?;
            let backup = Backup::from_json(&raw)?;
            let mut session = open_session(data_dir, config)?;
            session.restore(&backup)?;
            emit(
                human,
                json!({
                    "restored": true,
                    "documents": session.documents().len(),
                    "templates": session.templates().len(),
                }),
                format!(
                    "data restored: {} documents, {} templates",
                    session.documents().len(),
                    session.templates().len()
                ),
            );
            Ok(())
        }
    }
}

fn default_backup_path() -> PathBuf {
    PathBuf::from(format!(
        "logbook-backup-{}.json",
        chrono::Local::now().format("%Y-%m-%d")
    ))
}

/// Write the backup atomically: a temp file in the target directory, then a
/// rename into place.
fn write_backup(path: &Path, backup: &Backup) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };
    serde_json::to_writer_pretty(&mut tmp, backup)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path)
        .map_err(|e| Error::Other(format!("failed to write {}: {}", path.display(), e)))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// System commands

fn system_command(
    command: SystemCommands,
    data_dir: &Path,
    config: &LogbookConfig,
    human: bool,
) -> Result<()> {
    match command {
        SystemCommands::Info => {
            let session = open_session(data_dir, config)?;
            let store = session.store();
            let remote = config.remote.as_ref().map(|r| {
                json!({ "url": r.url, "token": r.masked_token() })
            });
            let value = json!({
                "data_dir": data_dir.display().to_string(),
                "config_file": LogbookConfig::path(data_dir).display().to_string(),
                "remote": remote,
                "documents": session.documents().len(),
                "templates": session.templates().len(),
                "favorite": session.favorite_id(),
                "migrations": {
                    (migrate::FLAG_LEGACY_IMPORT): store.flag(migrate::FLAG_LEGACY_IMPORT),
                    (migrate::FLAG_TEMPLATE_CATEGORIES): store.flag(migrate::FLAG_TEMPLATE_CATEGORIES),
                },
                "build": {
                    "timestamp": env!("LB_BUILD_TIMESTAMP"),
                    "commit": env!("LB_GIT_COMMIT"),
                },
            });
            let text = format!(
                "data dir:  {}\nremote:    {}\ndocuments: {}\ntemplates: {}\nfavorite:  {}",
                data_dir.display(),
                config
                    .remote
                    .as_ref()
                    .map(|r| r.url.clone())
                    .unwrap_or_else(|| "(local only)".to_string()),
                session.documents().len(),
                session.templates().len(),
                session.favorite_id().unwrap_or("(none)"),
            );
            emit(human, value, text);
            Ok(())
        }

        SystemCommands::Migrate => {
            // open_session already ran pending migrations; report the flags.
            let session = open_session(data_dir, config)?;
            let store = session.store();
            let legacy = store.flag(migrate::FLAG_LEGACY_IMPORT);
            let categories = store.flag(migrate::FLAG_TEMPLATE_CATEGORIES);
            emit(
                human,
                json!({
                    (migrate::FLAG_LEGACY_IMPORT): legacy,
                    (migrate::FLAG_TEMPLATE_CATEGORIES): categories,
                }),
                format!(
                    "legacy import: {}\ntemplate categories: {}",
                    if legacy { "done" } else { "pending" },
                    if categories { "done" } else { "pending" },
                ),
            );
            Ok(())
        }

        SystemCommands::Config { command } => config_command(command, data_dir, config, human),
    }
}

fn config_command(
    command: ConfigCommands,
    data_dir: &Path,
    config: &LogbookConfig,
    human: bool,
) -> Result<()> {
    match command {
        ConfigCommands::Get => {
            let value = json!({
                "output_format": config.output_format.map(|f| f.as_str().to_string()),
                "remote": config.remote.as_ref().map(|r| {
                    json!({ "url": r.url, "token": r.masked_token() })
                }),
            });
            let text = format!(
                "output-format: {}\nremote:        {}",
                config
                    .output_format
                    .map(|f| f.as_str().to_string())
                    .unwrap_or_else(|| "(default)".to_string()),
                config
                    .remote
                    .as_ref()
                    .map(|r| r.url.clone())
                    .unwrap_or_else(|| "(local only)".to_string()),
            );
            emit(human, value, text);
            Ok(())
        }

        ConfigCommands::Set {
            output_format,
            remote_url,
            remote_token,
            clear_remote,
        } => {
            let mut updated = config.clone();
            if let Some(format) = output_format {
                updated.output_format = Some(OutputFormat::parse(&format).ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "unknown output format '{}' (expected json or human)",
                        format
                    ))
                })?);
            }
            if clear_remote {
                updated.remote = None;
            } else if remote_url.is_some() || remote_token.is_some() {
                let mut remote = updated.remote.take().unwrap_or_default();
                if let Some(url) = remote_url {
                    remote.url = url;
                }
                if let Some(token) = remote_token {
                    remote.token = Some(token);
                }
                updated.remote = Some(remote);
            }
            updated
                .validate()
                .map_err(Error::InvalidInput)?;
            updated.save(data_dir)?;
            emit(
                human,
                json!({ "saved": true }),
                "configuration saved".to_string(),
            );
            Ok(())
        }
    }
}
