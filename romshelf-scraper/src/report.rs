//! Per-run text report, written next to the gamelists.
//!
//! The report names every failed job with its reason verbatim, so a
//! follow-up run can be aimed at exactly what went wrong.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::events::RunSummary;

/// Write `scrape-log-<system>-<timestamp>.txt` under `dir` and return its path.
pub fn write_report(
    dir: &Path,
    system: &str,
    summary: &RunSummary,
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "scrape-log-{system}-{}.txt",
        chrono::Local::now().format("%Y%m%d-%H%M%S"),
    ));
    let mut file = std::fs::File::create(&path)?;

    writeln!(file, "=== Scrape Log: {system} ===")?;
    writeln!(
        file,
        "Date: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(file)?;
    writeln!(file, "--- Summary ---")?;
    writeln!(file, "Items found: {}", summary.items_seen)?;
    writeln!(file, "Already complete: {}", summary.items_complete)?;
    writeln!(file, "Metadata fetched: {}", summary.metadata_fetched)?;
    writeln!(file, "Assets fetched: {}", summary.assets_fetched)?;
    writeln!(file, "Skipped: {}", summary.jobs_skipped)?;
    writeln!(file, "Failed: {}", summary.failed_jobs())?;

    if !summary.failures.is_empty() {
        writeln!(file)?;
        writeln!(file, "--- Failures ---")?;
        for failure in &summary.failures {
            writeln!(
                file,
                "[FAILED] {} ({}): {}",
                failure.file, failure.kind, failure.reason
            )?;
        }
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::JobFailure;
    use crate::job::JobKind;
    use romshelf_frontend::AssetKind;

    #[test]
    fn test_report_lists_failures_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let summary = RunSummary {
            items_seen: 3,
            items_complete: 1,
            metadata_fetched: 1,
            assets_fetched: 4,
            jobs_skipped: 1,
            failures: vec![JobFailure {
                file: "Broken.sfc".to_string(),
                kind: JobKind::Asset(AssetKind::Cover),
                reason: "Rate limited by remote (HTTP 430)".to_string(),
            }],
        };

        let path = write_report(dir.path(), "snes", &summary).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("scrape-log-snes-"));
        assert!(text.contains("Metadata fetched: 1"));
        assert!(text.contains("[FAILED] Broken.sfc (covers): Rate limited by remote (HTTP 430)"));
    }
}
