//! Composition service - the server side of the chat protocol.
//!
//! One endpoint: `POST /api/chat` takes the full message history, prepends
//! the fixed system directive, calls the remote model, and re-frames its
//! streamed output as NDJSON frames. No content transformation beyond the
//! re-framing; no persistence. Each request is independent and bound to its
//! own upstream call.

mod upstream;

pub use upstream::{UpstreamClient, UpstreamError, UpstreamStream};

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::models::{Message, Role};
use crate::stream::{Frame, DEADLINE_EXCEEDED};

/// Frame-line channel capacity between the pump task and the response body.
const FRAME_BUFFER: usize = 64;

/// Shared per-service state.
struct ServerState {
    config: ServiceConfig,
    upstream: UpstreamClient,
}

/// Request body for the chat endpoint.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<Message>,
}

/// Structured error response: non-2xx with a JSON `error` body.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// Build the service router.
pub fn router(config: ServiceConfig) -> Router {
    let state = Arc::new(ServerState {
        upstream: UpstreamClient::new(config.clone()),
        config,
    });

    Router::new()
        .route("/api/chat", post(chat))
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}

/// Start the service on the given port and serve until shutdown.
pub async fn start_server(port: u16, config: ServiceConfig) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("diagramma service listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, router(config))
        .await
        .context("Server error")?;

    Ok(())
}

/// `POST /api/chat` - stream the assistant's turn as NDJSON frames.
async fn chat(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("malformed request: {e}")))?;

    let Some(last) = request.messages.last() else {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "conversation is empty",
        ));
    };
    if last.role != Role::User {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "conversation must end with a user message",
        ));
    }

    // One deadline covers establishment and the full streamed exchange.
    let deadline = Instant::now() + state.config.request_timeout;

    // Establish the upstream stream before committing to a 2xx. Retries for
    // transient failures happen inside; nothing has streamed yet.
    let upstream = match state.upstream.open_stream(&request.messages, deadline).await {
        Ok(stream) => stream,
        Err(UpstreamError::DeadlineExceeded) => {
            return Err(ApiError::new(StatusCode::GATEWAY_TIMEOUT, DEADLINE_EXCEEDED))
        }
        Err(err) => {
            return Err(ApiError::new(
                StatusCode::BAD_GATEWAY,
                format!("upstream model unavailable: {err}"),
            ))
        }
    };

    let (tx, rx) = mpsc::channel::<String>(FRAME_BUFFER);
    tokio::spawn(pump(upstream, deadline, tx));

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        body,
    )
        .into_response())
}

/// Forward upstream deltas as frames until a terminal frame. Exactly one of
/// `finish` or `error` ends every stream; a mid-stream failure or a spent
/// deadline becomes an `error` frame rather than a silent truncation.
async fn pump(mut upstream: UpstreamStream, deadline: Instant, tx: mpsc::Sender<String>) {
    let start = Frame::Start {
        message_id: Uuid::now_v7().to_string(),
    };
    if tx.send(start.to_line()).await.is_err() {
        return;
    }

    loop {
        let frame = match timeout_at(deadline, upstream.next_delta()).await {
            Err(_) => Frame::Error {
                message: DEADLINE_EXCEEDED.to_string(),
            },
            Ok(Ok(Some(delta))) => Frame::TextDelta { delta },
            Ok(Ok(None)) => Frame::Finish,
            Ok(Err(err)) => Frame::Error {
                message: err.to_string(),
            },
        };
        let terminal = frame.is_terminal();
        // A send failure means the client went away; drop the stream.
        if tx.send(frame.to_line()).await.is_err() || terminal {
            return;
        }
    }
}
