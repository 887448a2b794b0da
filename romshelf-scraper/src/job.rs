//! Units of dispatched remote work.

use std::sync::Arc;

use romshelf_frontend::AssetKind;

use crate::scan::CandidateItem;

/// What one job fetches for its candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Metadata,
    Asset(AssetKind),
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Metadata => f.write_str("metadata"),
            JobKind::Asset(kind) => f.write_str(kind.folder()),
        }
    }
}

/// One unit of remote work, consumed exactly once by the dispatcher.
///
/// The remote reference is never known at enqueue time; the per-run resolve
/// cache supplies it when the job executes.
#[derive(Debug, Clone)]
pub struct Job {
    pub kind: JobKind,
    pub item: Arc<CandidateItem>,
}

/// Terminal state of a job.
///
/// `Skipped` covers benign non-work: the catalog offers no such asset for
/// this title, a dry run, or a job declined after a stop signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Skipped { reason: String },
    Failed { reason: String },
}

impl JobOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}
