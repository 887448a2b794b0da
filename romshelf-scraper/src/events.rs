//! Progress events emitted by the pipeline, consumed by the CLI (or any
//! other front-end). The library itself renders nothing.

use std::future::Future;

use tokio::sync::mpsc;

use crate::job::JobKind;

/// Stages of one scrape run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Scanning,
    Auditing,
    Dispatching,
    Finalizing,
    Done,
    Aborted,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Scanning => "scanning",
            RunPhase::Auditing => "auditing",
            RunPhase::Dispatching => "dispatching",
            RunPhase::Finalizing => "finalizing",
            RunPhase::Done => "done",
            RunPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Progress events for one run.
#[derive(Debug, Clone)]
pub enum ScrapeEvent {
    Phase(RunPhase),
    /// Scan finished; how many candidates were found.
    ScanComplete { total_items: usize },
    /// Audit finished; how many jobs will be dispatched.
    AuditComplete {
        total_jobs: usize,
        items_complete: usize,
    },
    JobStarted { file: String, kind: JobKind },
    JobSucceeded { file: String, kind: JobKind },
    JobSkipped {
        file: String,
        kind: JobKind,
        reason: String,
    },
    JobFailed {
        file: String,
        kind: JobKind,
        reason: String,
    },
    /// All jobs settled and the manifest flushed.
    Done { summary: RunSummary },
}

/// One per-job failure, with the reason verbatim so a follow-up run can be
/// targeted at exactly what went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub file: String,
    pub kind: JobKind,
    pub reason: String,
}

/// Aggregate counts for one run. Partial success is the expected common
/// case; failures here never abort the run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Candidates discovered by the scan.
    pub items_seen: usize,
    /// Candidates with nothing missing (no jobs dispatched).
    pub items_complete: usize,
    pub metadata_fetched: usize,
    pub assets_fetched: usize,
    pub jobs_skipped: usize,
    pub failures: Vec<JobFailure>,
}

impl RunSummary {
    pub fn failed_jobs(&self) -> usize {
        self.failures.len()
    }

    pub fn fetched_total(&self) -> usize {
        self.metadata_fetched + self.assets_fetched
    }
}

/// Drive `task` to completion while handling its progress events.
///
/// Events are processed as they arrive; once the task finishes, the channel
/// is drained so late events (from jobs that settled just before the end)
/// are not lost. The pipeline owns its sender and drops it on return, which
/// closes the channel and ends the drain.
pub async fn run_with_events<F, R>(
    task: F,
    mut event_rx: mpsc::UnboundedReceiver<ScrapeEvent>,
    mut on_event: impl FnMut(ScrapeEvent),
) -> R
where
    F: Future<Output = R>,
{
    tokio::pin!(task);
    let mut result = None;

    loop {
        tokio::select! {
            r = &mut task, if result.is_none() => {
                result = Some(r);
                break;
            }
            event = event_rx.recv() => {
                match event {
                    Some(e) => on_event(e),
                    None => break,
                }
            }
        }
    }

    // Drain whatever settled between the last poll and task completion.
    while let Ok(e) = event_rx.try_recv() {
        on_event(e);
    }

    match result {
        Some(r) => r,
        None => task.await,
    }
}
