//! Directory scanner for ROM collections.
//!
//! Walks one system folder and produces candidate items sorted by file name,
//! so repeated runs see the collection in the same order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::ScrapeError;

/// ROM extensions recognized when the caller does not override them.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "zip", "sfc", "nes", "md", "bin", "iso", "chd", "smc", "fig", "pce", "pce-cd", "32x", "ngp",
    "ngpc", "pcf", "pcf-cd",
];

/// One locally discovered ROM eligible for metadata/media enrichment.
///
/// `file_name` is the identity key (the manifest's `<path>./name</path>`
/// convention); `stem` names media files; `size` is sent to ScreenScraper as
/// `romtaille` to help disambiguate lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub file_name: String,
    pub stem: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Normalize an extension list into a lowercase lookup set.
pub fn extension_set<S: AsRef<str>>(extensions: &[S]) -> HashSet<String> {
    extensions
        .iter()
        .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
        .collect()
}

/// Scan a system folder and return candidates sorted by file name.
///
/// An unreadable root is fatal; unreadable individual entries are logged and
/// skipped. Subdirectories and non-matching files are ignored, which also
/// keeps orphaned `.tmp` files from interrupted asset writes out of the scan.
pub fn scan_candidates(
    root: &Path,
    extensions: &HashSet<String>,
) -> Result<Vec<CandidateItem>, ScrapeError> {
    let dir = std::fs::read_dir(root)
        .map_err(|e| ScrapeError::scan(format!("{}: {e}", root.display())))?;

    let mut candidates = Vec::new();
    for entry in dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {e}", root.display());
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            log::warn!("Skipping file with non-UTF-8 name: {}", path.display());
            continue;
        };
        let Some(stem) = matching_stem(file_name, extensions) else {
            continue;
        };

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                log::warn!("Skipping {file_name}: could not read metadata: {e}");
                continue;
            }
        };

        candidates.push(CandidateItem {
            file_name: file_name.to_string(),
            stem,
            path,
            size,
        });
    }

    candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(candidates)
}

/// Match a file name against the extension set, returning the stem with the
/// extension stripped. Checked as a `.ext` suffix rather than via
/// `Path::extension` so compound extensions like `pce-cd` work.
fn matching_stem(file_name: &str, extensions: &HashSet<String>) -> Option<String> {
    let lower = file_name.to_ascii_lowercase();
    for ext in extensions {
        let suffix = format!(".{ext}");
        if lower.ends_with(&suffix) && file_name.len() > suffix.len() {
            return Some(file_name[..file_name.len() - suffix.len()].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str, contents: &[u8]) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let exts = extension_set(DEFAULT_EXTENSIONS);
        touch(dir.path(), "Zelda.sfc", b"zz");
        touch(dir.path(), "Aladdin.md", b"aaa");
        touch(dir.path(), "readme.txt", b"not a rom");
        touch(dir.path(), ".Aladdin.png.tmp", b"orphan temp file");
        std::fs::create_dir(dir.path().join("subdir.sfc")).unwrap();

        let candidates = scan_candidates(dir.path(), &exts).unwrap();
        let names: Vec<_> = candidates.iter().map(|c| c.file_name.as_str()).collect();
        assert_eq!(names, vec!["Aladdin.md", "Zelda.sfc"]);
        assert_eq!(candidates[0].stem, "Aladdin");
        assert_eq!(candidates[0].size, 3);
    }

    #[test]
    fn test_compound_extension_stem() {
        let dir = tempfile::tempdir().unwrap();
        let exts = extension_set(&["pce-cd"]);
        touch(dir.path(), "Rondo of Blood.pce-cd", b"x");

        let candidates = scan_candidates(dir.path(), &exts).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].stem, "Rondo of Blood");
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let exts = extension_set(&["SFC"]);
        touch(dir.path(), "Game.sfc", b"x");
        touch(dir.path(), "Other.SFC", b"x");

        let candidates = scan_candidates(dir.path(), &exts).unwrap();
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_unreadable_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let exts = extension_set(DEFAULT_EXTENSIONS);
        let err = scan_candidates(&missing, &exts).unwrap_err();
        assert!(matches!(err, ScrapeError::Scan(_)));
    }

    #[test]
    fn test_empty_directory_yields_no_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let exts = extension_set(DEFAULT_EXTENSIONS);
        assert!(scan_candidates(dir.path(), &exts).unwrap().is_empty());
    }
}
