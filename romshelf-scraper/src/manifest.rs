//! In-memory manifest table, seeded from an existing gamelist and flushed
//! atomically at the end of a run.
//!
//! All mutation happens behind one async mutex so interleaved job
//! completions for the same item always merge into a consistent entry. The
//! lock is never held across an await of anything but itself.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use romshelf_frontend::{AssetKind, GamelistEntry, read_gamelist, relative_media_path, write_gamelist};
use tokio::sync::Mutex;

use crate::audit::asset_path;
use crate::error::ScrapeError;
use crate::scan::CandidateItem;
use crate::types::RemoteRecord;

struct TableInner {
    entries: BTreeMap<String, GamelistEntry>,
    dirty: bool,
}

/// The run's view of the manifest, keyed by ROM file name.
///
/// Merges never clobber: a field an earlier run filled in survives unless
/// this run produced a new non-empty value, and entries for items this run
/// never touched are carried over verbatim (including unknown tags).
pub struct ManifestTable {
    inner: Mutex<TableInner>,
    /// Target gamelist path; `None` disables manifest output entirely.
    path: Option<PathBuf>,
}

impl ManifestTable {
    /// Seed the table from an existing gamelist if one is present. An
    /// unreadable or corrupt manifest degrades to an empty table rather
    /// than aborting the run; the old file stays untouched until a
    /// successful flush replaces it.
    pub fn load(path: Option<PathBuf>) -> Self {
        let mut entries = BTreeMap::new();
        if let Some(ref p) = path {
            if p.exists() {
                match read_gamelist(p) {
                    Ok(parsed) => {
                        for entry in parsed {
                            entries.insert(entry.file_name().to_string(), entry);
                        }
                    }
                    Err(e) => {
                        log::warn!(
                            "Could not parse existing manifest {}; treating as empty: {e}",
                            p.display()
                        );
                    }
                }
            }
        }
        Self {
            inner: Mutex::new(TableInner {
                entries,
                dirty: false,
            }),
            path,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Directory the manifest lives in; media paths are written relative to it.
    pub fn manifest_dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }

    /// Snapshot of the entry for one item, for the audit.
    pub async fn entry_for(&self, file_name: &str) -> Option<GamelistEntry> {
        self.inner.lock().await.entries.get(file_name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }

    /// Fold a lookup result into the item's entry, field by field. A new
    /// non-empty value wins; an existing non-empty value is preserved when
    /// the remote produced nothing for it.
    pub async fn merge_metadata(&self, item: &CandidateItem, record: &RemoteRecord) {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .entries
            .entry(item.file_name.clone())
            .or_insert_with(|| GamelistEntry::new(&item.file_name));

        merge_field(&mut entry.name, &record.name);
        merge_field(&mut entry.description, &record.description);
        merge_field(&mut entry.release_date, &record.release_date);
        merge_field(&mut entry.developer, &record.developer);
        merge_field(&mut entry.publisher, &record.publisher);
        merge_field(&mut entry.genre, &record.genre);
        merge_field(&mut entry.players, &record.players);
        inner.dirty = true;
    }

    /// Record a stub entry for an item the catalog does not know, so the
    /// frontend still lists it by its file stem.
    pub async fn ensure_stub(&self, item: &CandidateItem) {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .entries
            .entry(item.file_name.clone())
            .or_insert_with(|| GamelistEntry::new(&item.file_name));
        if entry.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            entry.name = Some(item.stem.clone());
            inner.dirty = true;
        }
    }

    /// Record a completed asset download.
    pub async fn mark_asset(&self, item: &CandidateItem, kind: AssetKind, media_value: String) {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .entries
            .entry(item.file_name.clone())
            .or_insert_with(|| GamelistEntry::new(&item.file_name));
        entry.media.insert(kind, media_value);
        inner.dirty = true;
    }

    /// Write the table back to disk. Presence flags are recomputed from the
    /// filesystem so the manifest never claims media that is not actually
    /// there. Returns `false` when nothing changed this run (or manifest
    /// output is disabled) and the file was left byte-identical.
    pub async fn flush(&self, media_root: &Path) -> Result<bool, ScrapeError> {
        let Some(ref path) = self.path else {
            return Ok(false);
        };
        let mut inner = self.inner.lock().await;
        if !inner.dirty {
            return Ok(false);
        }

        let gamelist_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for entry in inner.entries.values_mut() {
            let stem = entry.stem();
            for kind in AssetKind::ALL {
                let on_disk = asset_path(media_root, kind, &stem);
                if on_disk.exists() {
                    entry
                        .media
                        .insert(kind, relative_media_path(&gamelist_dir, &on_disk));
                } else {
                    entry.media.remove(&kind);
                }
            }
        }

        let entries: Vec<GamelistEntry> = inner.entries.values().cloned().collect();
        write_gamelist(path, &entries)
            .map_err(|e| ScrapeError::ManifestFlush(format!("{}: {e}", path.display())))?;
        inner.dirty = false;
        Ok(true)
    }
}

fn merge_field(existing: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming {
        if !value.trim().is_empty() {
            *existing = Some(value.clone());
        }
    }
}

#[cfg(test)]
#[path = "tests/manifest_tests.rs"]
mod tests;
