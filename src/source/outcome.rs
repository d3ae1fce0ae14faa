//! Classification of fetch collaborator results. Every lookup resolves to
//! exactly one of these outcomes; the worker loop never sees a raw error.

use crate::source::record::StockRecord;

/// HTTP status class the remote uses to signal an unambiguous client block.
const HARD_BLOCK_STATUS: u16 = 503;

/// Result of one remote lookup, classified by the fetch collaborator.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Usable data was extracted.
    Success(StockRecord),
    /// The entity exists but carries no usable data (empty or malformed
    /// remote response). Expected at a background rate, never escalated.
    NotFound,
    /// The remote refused the request with a client-facing status. May be a
    /// one-off miss or the leading edge of a systemic denial; the block guard
    /// decides which.
    RateLimited(RateLimit),
    /// Connection-level failure (reset, timeout, partial response) not
    /// attributable to content.
    Transient(anyhow::Error),
    /// Unexpected condition that invalidates continuing the run.
    Fatal(anyhow::Error),
}

/// Diagnostic context attached to a `RateLimited` outcome.
#[derive(Debug, Clone)]
pub struct RateLimit {
    pub status: u16,
    pub url: String,
    pub reason: String,
}

impl RateLimit {
    pub fn new(status: u16, url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// A service-unavailable status is a hard block: the remote is refusing
    /// this client outright, not reporting a missing entity.
    pub fn is_hard_block(&self) -> bool {
        self.status == HARD_BLOCK_STATUS
    }

    /// Scheme and host of the refusing endpoint, for the one-time denial
    /// diagnostic.
    pub fn origin(&self) -> String {
        self.url
            .splitn(4, '/')
            .take(3)
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl FetchOutcome {
    /// Short tag used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::NotFound => "not_found",
            Self::RateLimited(_) => "rate_limited",
            Self::Transient(_) => "transient",
            Self::Fatal(_) => "fatal",
        }
    }
}
