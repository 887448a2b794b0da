/// Whether a failed remote operation is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeouts, connection resets, rate pressure (429/430), server errors.
    /// Eligible for bounded retry with backoff.
    Transient,
    /// Malformed requests, rejected credentials, anything a retry cannot fix.
    Permanent,
}

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Failed to scan ROM directory: {0}")]
    Scan(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch failed ({kind:?}): {reason}")]
    Fetch { kind: FailureKind, reason: String },

    #[error("Failed to write asset: {0}")]
    Materialize(String),

    #[error("Failed to flush manifest: {0}")]
    ManifestFlush(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    pub fn scan(msg: impl Into<String>) -> Self {
        Self::Scan(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Fetch {
            kind: FailureKind::Transient,
            reason: reason.into(),
        }
    }

    pub fn permanent(reason: impl Into<String>) -> Self {
        Self::Fetch {
            kind: FailureKind::Permanent,
            reason: reason.into(),
        }
    }

    pub fn materialize(msg: impl Into<String>) -> Self {
        Self::Materialize(msg.into())
    }

    /// Classify this error for the retry loop. Network-level failures from
    /// reqwest (timeouts, resets, DNS hiccups) are all treated as transient;
    /// everything not explicitly transient is permanent.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Fetch { kind, .. } => *kind,
            Self::Http(_) => FailureKind::Transient,
            _ => FailureKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.failure_kind() == FailureKind::Transient
    }
}
