//! Completeness audit: which metadata and asset kinds are still missing for
//! a candidate.
//!
//! Asset presence is always re-verified against the filesystem, never trusted
//! from the manifest, so a run interrupted mid-download heals itself on the
//! next pass. The audit is pure; it issues no network or write operations.

use std::path::{Path, PathBuf};

use romshelf_frontend::{AssetKind, GamelistEntry};

use crate::scan::CandidateItem;

/// Outstanding work for one candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingWork {
    pub needs_metadata: bool,
    pub missing_assets: Vec<AssetKind>,
}

impl MissingWork {
    pub fn is_complete(&self) -> bool {
        !self.needs_metadata && self.missing_assets.is_empty()
    }

    /// Number of jobs this audit will produce.
    pub fn job_count(&self) -> usize {
        usize::from(self.needs_metadata) + self.missing_assets.len()
    }
}

/// Canonical on-disk path for one asset kind under the per-system media root.
pub fn asset_path(media_root: &Path, kind: AssetKind, stem: &str) -> PathBuf {
    media_root
        .join(kind.folder())
        .join(format!("{stem}.{}", kind.default_extension()))
}

/// Audit one candidate against its manifest entry (if any) and the media
/// tree on disk.
///
/// Metadata is needed when no entry exists or any designated field is empty;
/// an empty, whitespace-only or absent value all count as missing, so a
/// partially scraped entry is re-fetched rather than left half-filled.
pub fn audit(
    item: &CandidateItem,
    entry: Option<&GamelistEntry>,
    media_root: &Path,
) -> MissingWork {
    let needs_metadata = match entry {
        None => true,
        Some(entry) => {
            let fields = [
                &entry.name,
                &entry.description,
                &entry.release_date,
                &entry.developer,
                &entry.publisher,
                &entry.genre,
                &entry.players,
            ];
            fields.iter().any(|f| !field_present(f))
        }
    };

    let missing_assets = AssetKind::ALL
        .into_iter()
        .filter(|kind| !asset_path(media_root, *kind, &item.stem).exists())
        .collect();

    MissingWork {
        needs_metadata,
        missing_assets,
    }
}

fn field_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}
