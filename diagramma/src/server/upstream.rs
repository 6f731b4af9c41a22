//! Upstream model client.
//!
//! Speaks the chat-completions SSE protocol: one POST with `stream: true`,
//! then `data:` lines carrying delta chunks until `data: [DONE]`. Retries
//! cover stream establishment only - once a response stream exists, a
//! failure is reported downstream rather than retried, since a retry after
//! partial delivery would duplicate content.

use std::pin::Pin;
use std::time::Duration;

use axum::body::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::time::{sleep, timeout_at, Instant};

use crate::config::ServiceConfig;
use crate::models::{Message, Part};

/// Failure talking to the upstream model.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection-level failure (DNS, refused, reset).
    #[error("upstream request failed: {0}")]
    Transport(String),

    /// Upstream returned a non-2xx status.
    #[error("upstream returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The wall-clock budget ran out.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// The SSE stream was unparseable or ended without `[DONE]`.
    #[error("malformed upstream stream: {0}")]
    Malformed(String),
}

impl UpstreamError {
    /// Whether a fresh attempt could plausibly succeed.
    pub const fn transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::DeadlineExceeded | Self::Malformed(_) => false,
        }
    }
}

/// Client for the remote model, bound to one service configuration.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl UpstreamClient {
    /// Create a client from the service configuration.
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Open the model's response stream, retrying transient failures up to
    /// the configured count, all within the request deadline.
    pub async fn open_stream(
        &self,
        messages: &[Message],
        deadline: Instant,
    ) -> Result<UpstreamStream, UpstreamError> {
        let payload = build_payload(&self.config, messages);
        let mut attempt: u32 = 0;

        loop {
            match self.connect(&payload, deadline).await {
                Ok(stream) => return Ok(stream),
                Err(err) if err.transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let backoff = Duration::from_millis(100 * u64::from(attempt));
                    if timeout_at(deadline, sleep(backoff)).await.is_err() {
                        return Err(UpstreamError::DeadlineExceeded);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One connection attempt: send the request and check the status line.
    async fn connect(
        &self,
        payload: &Value,
        deadline: Instant,
    ) -> Result<UpstreamStream, UpstreamError> {
        let send = self
            .client
            .post(&self.config.upstream_url)
            .bearer_auth(&self.config.api_key)
            .json(payload)
            .send();

        let response = timeout_at(deadline, send)
            .await
            .map_err(|_| UpstreamError::DeadlineExceeded)?
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = timeout_at(deadline, response.text())
                .await
                .map_err(|_| UpstreamError::DeadlineExceeded)?
                .unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(UpstreamStream::new(Box::pin(
            response
                .bytes_stream()
                .map_err(|e| UpstreamError::Transport(e.to_string())),
        )))
    }
}

/// Request body in the chat-completions shape, system directive first.
fn build_payload(config: &ServiceConfig, messages: &[Message]) -> Value {
    let mut upstream_messages = vec![json!({
        "role": "system",
        "content": config.system_directive,
    })];

    for message in messages {
        let blocks: Vec<Value> = message
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(json!({"type": "text", "text": text})),
                Part::File { media_type, url } if media_type.starts_with("image/") => {
                    Some(json!({"type": "image_url", "image_url": {"url": url}}))
                }
                Part::File { url, .. } => Some(json!({
                    "type": "file",
                    "file": {"filename": "attachment.pdf", "file_data": url},
                })),
                Part::Other => None,
            })
            .collect();
        upstream_messages.push(json!({
            "role": message.role.as_str(),
            "content": blocks,
        }));
    }

    json!({
        "model": config.model,
        "messages": upstream_messages,
        "max_tokens": config.max_output_tokens,
        "temperature": config.temperature,
        "stream": true,
    })
}

pub(crate) type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

/// A live model response stream, decoded one text delta at a time.
pub struct UpstreamStream {
    body: ByteStream,
    buffer: Vec<u8>,
    done: bool,
}

impl UpstreamStream {
    pub(crate) fn new(body: ByteStream) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            done: false,
        }
    }

    /// Next text delta, `Ok(None)` on clean `[DONE]` termination.
    ///
    /// Bytes are buffered until a newline so a multi-byte character split
    /// across chunk boundaries decodes intact.
    pub async fn next_delta(&mut self) -> Result<Option<String>, UpstreamError> {
        loop {
            while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=newline).collect();
                let line = std::str::from_utf8(&line)
                    .map_err(|e| UpstreamError::Malformed(format!("invalid utf-8: {e}")))?;
                if let Some(delta) = parse_sse_line(line.trim(), &mut self.done)? {
                    return Ok(Some(delta));
                }
                if self.done {
                    return Ok(None);
                }
            }

            match self.body.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(err)) => return Err(err),
                None => {
                    return Err(UpstreamError::Malformed(
                        "stream ended before [DONE]".to_string(),
                    ))
                }
            }
        }
    }
}

/// Decode one SSE line. Returns a delta if the line carries content; flips
/// `done` on the `[DONE]` sentinel. Comments, blanks, and non-content
/// chunks (role preludes, finish reasons) yield nothing.
fn parse_sse_line(line: &str, done: &mut bool) -> Result<Option<String>, UpstreamError> {
    if line.is_empty() || line.starts_with(':') {
        return Ok(None);
    }
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload == "[DONE]" {
        *done = true;
        return Ok(None);
    }

    let value: Value = serde_json::from_str(payload)
        .map_err(|e| UpstreamError::Malformed(format!("bad data line: {e}")))?;
    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown upstream error");
        return Err(UpstreamError::Malformed(message.to_string()));
    }

    Ok(value["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn test_config() -> ServiceConfig {
        ServiceConfig {
            api_key: "test-key".to_string(),
            ..ServiceConfig::default()
        }
    }

    fn stream_of_bytes(chunks: Vec<Vec<u8>>) -> UpstreamStream {
        let items: Vec<Result<Bytes, UpstreamError>> =
            chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
        UpstreamStream::new(Box::pin(stream::iter(items)))
    }

    fn stream_of(chunks: Vec<&str>) -> UpstreamStream {
        stream_of_bytes(chunks.into_iter().map(|c| c.as_bytes().to_vec()).collect())
    }

    #[test]
    fn payload_prepends_system_directive() {
        let messages = vec![Message::user(vec![Part::text("explain this")])];
        let payload = build_payload(&test_config(), &messages);

        assert_eq!(payload["model"], "gpt-4o");
        assert_eq!(payload["max_tokens"], 1024);
        assert_eq!(payload["stream"], true);
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(
            payload["messages"][0]["content"],
            crate::config::SYSTEM_DIRECTIVE
        );
        assert_eq!(payload["messages"][1]["role"], "user");
        assert_eq!(payload["messages"][1]["content"][0]["text"], "explain this");
    }

    #[test]
    fn payload_maps_images_and_pdfs() {
        let messages = vec![Message::user(vec![
            Part::text("compare"),
            Part::file("image/png", "data:image/png;base64,AAAA"),
            Part::file("application/pdf", "data:application/pdf;base64,BBBB"),
        ])];
        let payload = build_payload(&test_config(), &messages);

        let blocks = &payload["messages"][1]["content"];
        assert_eq!(blocks[1]["type"], "image_url");
        assert_eq!(blocks[1]["image_url"]["url"], "data:image/png;base64,AAAA");
        assert_eq!(blocks[2]["type"], "file");
        assert_eq!(
            blocks[2]["file"]["file_data"],
            "data:application/pdf;base64,BBBB"
        );
    }

    #[tokio::test]
    async fn decodes_deltas_across_chunk_boundaries() {
        let mut stream = stream_of(vec![
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"cont",
            "ent\":\"lo\"}}]}\n\ndata: [DONE]\n\n",
        ]);

        assert_eq!(stream.next_delta().await.unwrap().as_deref(), Some("Hel"));
        assert_eq!(stream.next_delta().await.unwrap().as_deref(), Some("lo"));
        assert_eq!(stream.next_delta().await.unwrap(), None);
    }

    #[tokio::test]
    async fn multibyte_characters_survive_chunk_boundaries() {
        // Split the body mid-way through the two-byte 'é'.
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"café\"}}]}\n\ndata: [DONE]\n\n"
            .as_bytes()
            .to_vec();
        let split = body.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut stream = stream_of_bytes(vec![body[..split].to_vec(), body[split..].to_vec()]);

        assert_eq!(stream.next_delta().await.unwrap().as_deref(), Some("café"));
        assert_eq!(stream.next_delta().await.unwrap(), None);
    }

    #[tokio::test]
    async fn eof_without_done_is_malformed() {
        let mut stream =
            stream_of(vec!["data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n"]);
        assert_eq!(stream.next_delta().await.unwrap().as_deref(), Some("x"));
        assert!(matches!(
            stream.next_delta().await,
            Err(UpstreamError::Malformed(_))
        ));
    }

    #[test]
    fn transient_classification() {
        assert!(UpstreamError::Transport("reset".to_string()).transient());
        assert!(UpstreamError::Status {
            status: 503,
            detail: String::new()
        }
        .transient());
        assert!(UpstreamError::Status {
            status: 429,
            detail: String::new()
        }
        .transient());
        assert!(!UpstreamError::Status {
            status: 401,
            detail: String::new()
        }
        .transient());
        assert!(!UpstreamError::DeadlineExceeded.transient());
    }
}
