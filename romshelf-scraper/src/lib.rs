pub mod audit;
pub mod budget;
pub mod client;
pub mod credentials;
pub mod error;
pub mod events;
pub mod job;
pub mod manifest;
pub mod materialize;
pub mod pipeline;
pub mod report;
pub mod resolve;
pub mod retry;
pub mod scan;
pub mod types;

pub use audit::{MissingWork, asset_path, audit};
pub use budget::RateBudget;
pub use client::Gateway;
pub use credentials::{
    CredentialSource, CredentialSources, Credentials, config_path, credential_sources,
    save_to_file,
};
pub use error::{FailureKind, ScrapeError};
pub use events::{JobFailure, RunPhase, RunSummary, ScrapeEvent, run_with_events};
pub use job::{Job, JobKind, JobOutcome};
pub use pipeline::{ScrapeConfig, StopFlag, run_pipeline};
pub use report::write_report;
pub use resolve::{AssetSource, ResolveCache, Resolver};
pub use retry::{RetryPolicy, RetryState};
pub use scan::{CandidateItem, DEFAULT_EXTENSIONS, extension_set, scan_candidates};
pub use types::RemoteRecord;
