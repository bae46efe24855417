//! One-time data-shape migrations.
//!
//! Two flag-gated procedures run at startup, in order:
//!
//! 1. **Legacy import** - copy the locally stored collections into the
//!    remote store via per-entity upserts. Runs once a remote is
//!    configured; until then the flag stays unset and the import stays
//!    pending.
//! 2. **Template category backfill + dedup** - default missing template
//!    categories to `task` and reduce each category to its single most
//!    recently updated template.
//!
//! Each procedure is idempotent and safe to re-run: the completion flag is
//! only set after full success, so a failed run retries on the next launch.
//! Failures are logged and never block startup.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::Result;
use crate::models::{Document, Kind};
use crate::storage::Store;

/// Flag set once the legacy local collections have been imported into the
/// remote store.
pub const FLAG_LEGACY_IMPORT: &str = "legacy_import_done";

/// Flag set once template categories have been backfilled and deduplicated.
pub const FLAG_TEMPLATE_CATEGORIES: &str = "template_category_migration_done";

/// Run all pending migrations. Failures are logged and do not propagate.
pub fn run(store: &Store) {
    if let Err(e) = legacy_import(store) {
        warn!(error = %e, "legacy import migration failed, will retry on next launch");
    }
    if let Err(e) = dedup_template_categories(store) {
        warn!(error = %e, "template category migration failed, will retry on next launch");
    }
}

/// Copy every locally stored document and template into the remote store.
///
/// Safe to re-run after a partial failure: each upsert is idempotent by id,
/// and the flag is only set once every entity made it across.
fn legacy_import(store: &Store) -> Result<()> {
    if store.flag(FLAG_LEGACY_IMPORT) {
        return Ok(());
    }
    if store.push_local_to_remote()? {
        store.set_flag(FLAG_LEGACY_IMPORT)?;
        info!("imported legacy local collections into the remote store");
    } else {
        debug!("no remote configured, leaving legacy import pending");
    }
    Ok(())
}

/// Reduce each template category to a single template.
///
/// Older records may lack a category (the wire decoder defaults those to
/// `task`) and several templates may have accumulated in one category. The
/// template with the greatest `updated_at` wins; the rest are deleted from
/// the backend. Runs strictly after the legacy import so it sees the full
/// template population.
fn dedup_template_categories(store: &Store) -> Result<()> {
    if store.flag(FLAG_TEMPLATE_CATEGORIES) {
        return Ok(());
    }

    let templates = store.templates();
    let mut winners: HashMap<Kind, &Document> = HashMap::new();
    for tpl in &templates {
        let category = tpl.category().unwrap_or_default();
        match winners.get(&category) {
            Some(current) if current.updated_at >= tpl.updated_at => {}
            _ => {
                winners.insert(category, tpl);
            }
        }
    }

    let keep_ids: Vec<&str> = winners.values().map(|tpl| tpl.id.as_str()).collect();
    let mut kept = Vec::with_capacity(winners.len());
    let mut dropped = 0usize;
    for tpl in &templates {
        if keep_ids.contains(&tpl.id.as_str()) {
            kept.push(tpl.clone());
        } else {
            store.delete_template(&tpl.id)?;
            dropped += 1;
        }
    }

    store.save_templates(&kept)?;
    store.set_flag(FLAG_TEMPLATE_CATEGORIES)?;
    if dropped > 0 {
        info!(dropped, kept = kept.len(), "deduplicated template categories");
    }
    Ok(())
}
