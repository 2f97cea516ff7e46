// Fetch outcome domain model
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of rendering one panel in one cycle
#[derive(Debug)]
pub enum FetchOutcome {
    Success(Bytes),
    Failure(FetchFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Status,
    Redirect,
    ContentType,
    Transport,
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Status => "status",
            FailureKind::Redirect => "redirect",
            FailureKind::ContentType => "content_type",
            FailureKind::Transport => "transport",
            FailureKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct FetchFailure {
    pub kind: FailureKind,
    /// Missing when the request never produced a response
    pub status: Option<u16>,
    pub message: String,
    #[source]
    pub cause: Option<BoxError>,
}

impl FetchFailure {
    pub fn new(kind: FailureKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}
