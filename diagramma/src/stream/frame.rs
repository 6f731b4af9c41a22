//! NDJSON stream framing.
//!
//! The composition service delivers its response as newline-delimited JSON,
//! one frame per line. A well-formed stream is `start`, any number of
//! `text-delta` / `file` frames, then exactly one terminal `finish` or
//! `error`. A stream that ends without a terminal frame was interrupted.

use serde::{Deserialize, Serialize};

/// Well-known `error` frame message for a spent wall-clock budget. Shared
/// between the service and the client so a timeout stays distinguishable
/// from other upstream failures.
pub const DEADLINE_EXCEEDED: &str = "request deadline exceeded";

/// One frame of the response stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Frame {
    /// Opens the assistant turn.
    Start { message_id: String },
    /// One incremental text fragment.
    TextDelta { delta: String },
    /// A complete file part.
    File { media_type: String, url: String },
    /// Clean end of the response.
    Finish,
    /// The turn failed server-side. Terminal.
    Error { message: String },
}

impl Frame {
    /// Parse one NDJSON line into a frame. Empty lines yield `None`.
    pub fn parse(line: &str) -> Option<Result<Self, serde_json::Error>> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        Some(serde_json::from_str(line))
    }

    /// Serialize to one newline-terminated NDJSON line.
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).expect("frame serialization cannot fail");
        line.push('\n');
        line
    }

    /// Whether this frame ends the stream.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finish | Self::Error { .. })
    }
}
