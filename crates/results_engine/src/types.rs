use std::fmt;

use results_core::{CycleState, ParseReport, ResultRecord, SessionToken};

/// One state change of a fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleUpdate {
    pub from: CycleState,
    pub to: CycleState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResults {
    pub records: Vec<ResultRecord>,
    pub report: ParseReport,
    pub session_token: Option<SessionToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocument {
    pub url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    ContentMismatch { content_type: String },
    ProcessingError,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::ContentMismatch { content_type } => {
                write!(f, "expected a pdf, got {content_type}")
            }
            FailureKind::ProcessingError => write!(f, "processing error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
