//! Per-turn failure taxonomy.
//!
//! Every failure is local to one turn: prior finalized messages are never
//! touched. The variants mirror where in the pipeline a turn can die, so the
//! UI layer can report the right thing (and so tests can assert on it).

use thiserror::Error;

/// Why a single conversational turn failed.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Submission with no text and no attachments. Rejected before any
    /// network call.
    #[error("nothing to send: empty text and no attachments")]
    EmptyDraft,

    /// A staged file has a media type outside image/* or application/pdf.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Reading a staged attachment failed. The whole submission is aborted
    /// (fail-fast) and the draft is preserved so the user can retry.
    #[error("failed to read attachment '{name}': {source}")]
    AttachmentRead {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A second submission was attempted while one is already in flight.
    #[error("a submission is already in flight")]
    Busy,

    /// The chat endpoint could not be reached or refused the request.
    #[error("chat endpoint error ({status}): {detail}")]
    Endpoint { status: u16, detail: String },

    /// The request's wall-clock budget ran out, before or during streaming.
    #[error("request deadline exceeded")]
    Timeout,

    /// The connection died, or the stream ended without a `finish` frame.
    /// Partial content already applied stays, visibly marked incomplete.
    #[error("response stream interrupted before completion")]
    Interrupted,

    /// The service reported an upstream model failure mid-stream.
    #[error("upstream model failure: {0}")]
    Upstream(String),

    /// A frame arrived that could not be parsed.
    #[error("malformed stream frame: {0}")]
    MalformedFrame(String),

    /// The request could not be sent at all.
    #[error("request failed: {0}")]
    Request(String),
}

impl TurnError {
    /// Short machine-readable label for UI badges and logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EmptyDraft => "empty-draft",
            Self::UnsupportedMediaType(_) => "unsupported-media-type",
            Self::AttachmentRead { .. } => "attachment-read",
            Self::Busy => "busy",
            Self::Endpoint { .. } => "endpoint",
            Self::Timeout => "timeout",
            Self::Interrupted => "interrupted",
            Self::Upstream(_) => "upstream",
            Self::MalformedFrame(_) => "malformed-frame",
            Self::Request(_) => "request",
        }
    }
}
