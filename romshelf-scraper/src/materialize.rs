//! Atomic asset writes into the per-system media tree.

use std::fs;
use std::path::{Path, PathBuf};

use romshelf_frontend::AssetKind;

use crate::audit::asset_path;
use crate::error::ScrapeError;

/// Write downloaded asset bytes to `<media_root>/<kind folder>/<stem>.<ext>`.
///
/// The bytes land in a dot-prefixed `.tmp` sibling first and are renamed into
/// place, so a crash mid-write leaves the canonical path untouched and only
/// an orphan temp file behind (which the scanner and presence checks ignore).
/// Returns the canonical path on success.
pub fn write_asset(
    media_root: &Path,
    kind: AssetKind,
    stem: &str,
    bytes: &[u8],
) -> Result<PathBuf, ScrapeError> {
    let target = asset_path(media_root, kind, stem);
    let dir = target
        .parent()
        .ok_or_else(|| ScrapeError::materialize(format!("no parent for {}", target.display())))?;
    fs::create_dir_all(dir)
        .map_err(|e| ScrapeError::materialize(format!("{}: {e}", dir.display())))?;

    let tmp = dir.join(format!(".{stem}.{}.tmp", kind.default_extension()));
    fs::write(&tmp, bytes)
        .map_err(|e| ScrapeError::materialize(format!("{}: {e}", tmp.display())))?;
    fs::rename(&tmp, &target)
        .map_err(|e| ScrapeError::materialize(format!("{}: {e}", target.display())))?;

    Ok(target)
}
