//! Client transport for the streaming chat endpoint.
//!
//! One `send` issues one request carrying the full message history and hands
//! back a channel of stream events. A spawned reader task splits the response
//! body into NDJSON lines and forwards each frame the moment it arrives, so
//! fragments reach the UI in server order with no extra buffering. Dropping
//! the receiver cancels the turn: the reader's next send fails, the task
//! returns, and the underlying connection is released.

use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

use crate::error::TurnError;
use crate::models::Message;
use crate::stream::{Frame, StreamEvent, DEADLINE_EXCEEDED};

/// Channel capacity between the reader task and the consumer.
const EVENT_BUFFER: usize = 64;

/// HTTP transport to a composition service endpoint.
#[derive(Debug, Clone)]
pub struct ChatTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl ChatTransport {
    /// Create a transport targeting the given chat endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Submit the full conversation and stream back the assistant's turn.
    ///
    /// Exactly one terminal event (`Done` or `Failed`) ends every stream.
    pub fn send(&self, messages: &[Message]) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let payload = json!({ "messages": messages });

        tokio::spawn(async move {
            let outcome = run_stream(&client, &endpoint, &payload, &tx).await;
            if let Err(err) = outcome {
                let _ = tx.send(StreamEvent::Failed(err)).await;
            }
        });

        rx
    }
}

/// Drive one request to its terminal event. Returns `Err` for failures that
/// still need surfacing; `Ok` means a terminal event was already sent or the
/// consumer went away.
async fn run_stream(
    client: &reqwest::Client,
    endpoint: &str,
    payload: &serde_json::Value,
    tx: &mpsc::Sender<StreamEvent>,
) -> Result<(), TurnError> {
    let response = client
        .post(endpoint)
        .json(payload)
        .send()
        .await
        .map_err(|e| TurnError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        if status == reqwest::StatusCode::GATEWAY_TIMEOUT {
            return Err(TurnError::Timeout);
        }
        let body = response.text().await.unwrap_or_default();
        return Err(TurnError::Endpoint {
            status: status.as_u16(),
            detail: extract_error_detail(&body),
        });
    }

    // Chunk boundaries are arbitrary and can split a multi-byte character,
    // so buffer raw bytes and decode only complete lines.
    let mut body = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|_| TurnError::Interrupted)?;
        buffer.extend_from_slice(&chunk);

        while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline).collect();
            let line = std::str::from_utf8(&line)
                .map_err(|e| TurnError::MalformedFrame(e.to_string()))?;
            let Some(parsed) = Frame::parse(line) else {
                continue;
            };
            let frame = parsed.map_err(|e| TurnError::MalformedFrame(e.to_string()))?;
            let terminal = frame.is_terminal();
            let event = match frame {
                Frame::Start { message_id } => StreamEvent::Started { message_id },
                Frame::TextDelta { delta } => StreamEvent::Delta(delta),
                Frame::File { media_type, url } => StreamEvent::File { media_type, url },
                Frame::Finish => StreamEvent::Done,
                Frame::Error { message } if message == DEADLINE_EXCEEDED => {
                    StreamEvent::Failed(TurnError::Timeout)
                }
                Frame::Error { message } => StreamEvent::Failed(TurnError::Upstream(message)),
            };
            if tx.send(event).await.is_err() {
                // Consumer dropped the receiver; abandon the connection.
                return Ok(());
            }
            if terminal {
                return Ok(());
            }
        }
    }

    // End of body without a terminal frame.
    Err(TurnError::Interrupted)
}

/// Pull the `error` field out of a structured error body, if present.
fn extract_error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}
