//! File to data-URI encoding.
//!
//! All attachments in one submission are encoded concurrently. The policy is
//! fail-fast: one unreadable file aborts the whole submission, so a turn is
//! never sent silently missing content the user believes was attached.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::try_join_all;

use crate::error::TurnError;
use crate::models::Part;

/// A staged attachment ready for encoding.
#[derive(Debug, Clone)]
pub struct AttachmentSource {
    /// Display name, used in error reporting.
    pub name: String,
    /// Declared media type (`type/subtype`).
    pub media_type: String,
    /// Where the bytes live until submission.
    pub path: PathBuf,
}

/// Encode one file into a self-contained data URI file part.
pub async fn encode_file(
    name: &str,
    media_type: &str,
    path: &Path,
) -> Result<Part, TurnError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| TurnError::AttachmentRead {
            name: name.to_string(),
            source,
        })?;
    let url = format!("data:{media_type};base64,{}", STANDARD.encode(&bytes));
    Ok(Part::file(media_type, url))
}

/// Encode every staged attachment concurrently, preserving staging order.
/// Resolves only once every file has encoded; the first failure aborts all.
pub async fn encode_all(sources: &[AttachmentSource]) -> Result<Vec<Part>, TurnError> {
    try_join_all(
        sources
            .iter()
            .map(|s| encode_file(&s.name, &s.media_type, &s.path)),
    )
    .await
}

/// Decode a data URI back into its media type and raw bytes.
pub fn decode_data_uri(url: &str) -> Result<(String, Vec<u8>), TurnError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| TurnError::MalformedFrame(format!("not a data URI: {url}")))?;
    let (media_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| TurnError::MalformedFrame("data URI missing base64 payload".to_string()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| TurnError::MalformedFrame(format!("invalid base64 payload: {e}")))?;
    Ok((media_type.to_string(), bytes))
}
