//! Pipeline coordinator: scan → audit → dispatch → finalize.
//!
//! Per-job failures fold into the run summary and never abort the run;
//! only a failed scan or a failed manifest flush is fatal. The transition
//! to finalizing is unconditional once every job settles, so partial
//! success still flushes everything that did complete.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;

use crate::audit::audit;
use crate::error::ScrapeError;
use crate::events::{JobFailure, RunPhase, RunSummary, ScrapeEvent};
use crate::job::{Job, JobKind, JobOutcome};
use crate::manifest::ManifestTable;
use crate::materialize::write_asset;
use crate::resolve::{AssetSource, ResolveCache, Resolver};
use crate::scan::{self, DEFAULT_EXTENSIONS};

/// Everything the coordinator needs to run; supplied by the CLI (or any
/// other front-end) before the run starts. Credentials travel separately,
/// inside the gateway.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Directory holding the system's ROM files.
    pub rom_dir: PathBuf,
    /// Root of the media output tree; assets land under `<scrape_dir>/<system>/`.
    pub scrape_dir: PathBuf,
    /// Root of the gamelist tree, `<manifest_dir>/<system>/gamelist.xml`.
    /// `None` disables manifest output.
    pub manifest_dir: Option<PathBuf>,
    /// System folder name (e.g. "snes").
    pub system: String,
    /// Concurrent workers draining the job queue.
    pub thread_count: usize,
    /// Recognized ROM extensions.
    pub extensions: Vec<String>,
    /// Process at most this many candidates.
    pub limit: Option<usize>,
    /// Audit and report, but dispatch nothing.
    pub dry_run: bool,
}

impl ScrapeConfig {
    pub fn new(rom_dir: PathBuf, scrape_dir: PathBuf, system: impl Into<String>) -> Self {
        Self {
            rom_dir,
            scrape_dir,
            manifest_dir: None,
            system: system.into(),
            thread_count: 1,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            limit: None,
            dry_run: false,
        }
    }

    /// Per-system media root: `<scrape_dir>/<system>`.
    pub fn media_root(&self) -> PathBuf {
        self.scrape_dir.join(&self.system)
    }

    /// Per-system manifest path, when manifest output is enabled.
    pub fn manifest_path(&self) -> Option<PathBuf> {
        self.manifest_dir
            .as_ref()
            .map(|d| d.join(&self.system).join("gamelist.xml"))
    }
}

/// Cooperative stop signal. Workers finish their in-flight call and decline
/// to start new jobs; completed work is flushed normally.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Run one scrape end to end.
///
/// The sender is owned and dropped on return, closing the event channel.
/// Returns the run summary, or an error when the scan or the final manifest
/// flush failed; per-job failures are inside the summary, not here.
pub async fn run_pipeline<R, A>(
    config: &ScrapeConfig,
    resolver: &R,
    assets: &A,
    events: mpsc::UnboundedSender<ScrapeEvent>,
    stop: &StopFlag,
) -> Result<RunSummary, ScrapeError>
where
    R: Resolver,
    A: AssetSource,
{
    let _ = events.send(ScrapeEvent::Phase(RunPhase::Scanning));
    let extensions = scan::extension_set(&config.extensions);
    let mut candidates = match scan::scan_candidates(&config.rom_dir, &extensions) {
        Ok(candidates) => candidates,
        Err(e) => {
            let _ = events.send(ScrapeEvent::Phase(RunPhase::Aborted));
            return Err(e);
        }
    };
    if let Some(limit) = config.limit {
        candidates.truncate(limit);
    }
    let _ = events.send(ScrapeEvent::ScanComplete {
        total_items: candidates.len(),
    });

    let media_root = config.media_root();
    let table = ManifestTable::load(config.manifest_path());

    let _ = events.send(ScrapeEvent::Phase(RunPhase::Auditing));
    let mut summary = RunSummary {
        items_seen: candidates.len(),
        ..RunSummary::default()
    };
    let mut jobs: Vec<Job> = Vec::new();
    for item in candidates {
        let entry = table.entry_for(&item.file_name).await;
        let work = audit(&item, entry.as_ref(), &media_root);
        if work.is_complete() {
            summary.items_complete += 1;
            continue;
        }
        let item = Arc::new(item);
        if work.needs_metadata {
            jobs.push(Job {
                kind: JobKind::Metadata,
                item: item.clone(),
            });
        }
        for kind in work.missing_assets {
            jobs.push(Job {
                kind: JobKind::Asset(kind),
                item: item.clone(),
            });
        }
    }
    let _ = events.send(ScrapeEvent::AuditComplete {
        total_jobs: jobs.len(),
        items_complete: summary.items_complete,
    });

    if config.dry_run {
        for job in &jobs {
            record_outcome(
                &mut summary,
                job,
                JobOutcome::skipped("dry run"),
                &events,
            );
        }
        let _ = events.send(ScrapeEvent::Phase(RunPhase::Done));
        let _ = events.send(ScrapeEvent::Done {
            summary: summary.clone(),
        });
        return Ok(summary);
    }

    let _ = events.send(ScrapeEvent::Phase(RunPhase::Dispatching));
    let cache = ResolveCache::new();
    let gamelist_dir = table.manifest_dir().map(Path::to_path_buf);
    let outcomes: Vec<(Job, JobOutcome)> = stream::iter(jobs)
        .map(|job| {
            let events = events.clone();
            let cache = &cache;
            let table = &table;
            let media_root = &media_root;
            let gamelist_dir = gamelist_dir.as_deref();
            async move {
                if stop.is_stopped() {
                    return (job, JobOutcome::skipped("stopped before start"));
                }
                let _ = events.send(ScrapeEvent::JobStarted {
                    file: job.item.file_name.clone(),
                    kind: job.kind,
                });
                let outcome =
                    execute_job(&job, resolver, assets, cache, table, media_root, gamelist_dir)
                        .await;
                (job, outcome)
            }
        })
        .buffer_unordered(config.thread_count.max(1))
        .collect()
        .await;

    for (job, outcome) in outcomes {
        record_outcome(&mut summary, &job, outcome, &events);
    }

    let _ = events.send(ScrapeEvent::Phase(RunPhase::Finalizing));
    if let Err(e) = table.flush(&media_root).await {
        let _ = events.send(ScrapeEvent::Phase(RunPhase::Aborted));
        return Err(e);
    }

    let _ = events.send(ScrapeEvent::Phase(RunPhase::Done));
    let _ = events.send(ScrapeEvent::Done {
        summary: summary.clone(),
    });
    Ok(summary)
}

/// Execute one job: resolve (shared per candidate through the cache), then
/// merge metadata or fetch-and-materialize one asset.
async fn execute_job<R, A>(
    job: &Job,
    resolver: &R,
    assets: &A,
    cache: &ResolveCache,
    table: &ManifestTable,
    media_root: &Path,
    gamelist_dir: Option<&Path>,
) -> JobOutcome
where
    R: Resolver,
    A: AssetSource,
{
    let record = match cache.resolve_with(resolver, &job.item).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            // Unknown to the catalog: keep a stub entry so the frontend
            // still lists the file, and record the miss.
            if job.kind == JobKind::Metadata {
                table.ensure_stub(&job.item).await;
            }
            return JobOutcome::failed("not found in remote catalog");
        }
        Err(e) => return JobOutcome::failed(e.to_string()),
    };

    match job.kind {
        JobKind::Metadata => {
            table.merge_metadata(&job.item, &record).await;
            JobOutcome::Succeeded
        }
        JobKind::Asset(kind) => {
            let Some(url) = record.assets.get(&kind) else {
                return JobOutcome::skipped(format!("no {} available for this title", kind.folder()));
            };
            let bytes = match assets.fetch(url).await {
                Ok(bytes) => bytes,
                Err(e) => return JobOutcome::failed(e.to_string()),
            };
            match write_asset(media_root, kind, &job.item.stem, &bytes) {
                Ok(path) => {
                    let media_value = match gamelist_dir {
                        Some(dir) => romshelf_frontend::relative_media_path(dir, &path),
                        None => path.display().to_string(),
                    };
                    table.mark_asset(&job.item, kind, media_value).await;
                    JobOutcome::Succeeded
                }
                Err(e) => JobOutcome::failed(e.to_string()),
            }
        }
    }
}

fn record_outcome(
    summary: &mut RunSummary,
    job: &Job,
    outcome: JobOutcome,
    events: &mpsc::UnboundedSender<ScrapeEvent>,
) {
    let file = job.item.file_name.clone();
    match outcome {
        JobOutcome::Succeeded => {
            match job.kind {
                JobKind::Metadata => summary.metadata_fetched += 1,
                JobKind::Asset(_) => summary.assets_fetched += 1,
            }
            let _ = events.send(ScrapeEvent::JobSucceeded {
                file,
                kind: job.kind,
            });
        }
        JobOutcome::Skipped { reason } => {
            summary.jobs_skipped += 1;
            let _ = events.send(ScrapeEvent::JobSkipped {
                file,
                kind: job.kind,
                reason,
            });
        }
        JobOutcome::Failed { reason } => {
            summary.failures.push(JobFailure {
                file: file.clone(),
                kind: job.kind,
                reason: reason.clone(),
            });
            let _ = events.send(ScrapeEvent::JobFailed {
                file,
                kind: job.kind,
                reason,
            });
        }
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
