use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use nini_core::{PageWarning, RunStage};
use url::Url;

/// Response body of one successful GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBody {
    pub final_url: Url,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// One downloaded page of a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// One-based page number.
    pub page: u32,
    pub url: Url,
    pub final_url: Url,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl RawPage {
    pub fn new(page: u32, url: Url, body: FetchedBody) -> Self {
        Self {
            page,
            url,
            final_url: body.final_url,
            content_type: body.content_type,
            bytes: body.bytes,
        }
    }
}

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    StageChanged(RunStage),
    PageFetched { page: u32, url: String, bytes: u64 },
    PageRejected(PageWarning),
    Retrying { url: String, attempt: u32, delay: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Only network-class failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, FailureKind::Network | FailureKind::Timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// Unreachable host, refused connection, gateway errors.
    Network,
    Timeout,
    NotFound,
    HttpStatus(u16),
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    PaginationLimitExceeded { cap: u32 },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::PaginationLimitExceeded { cap } => {
                write!(f, "pagination limit of {cap} pages exceeded")
            }
        }
    }
}
