//! Diagramma - streaming chat client and service for diagram analysis.
//!
//! Architecture:
//! - The client side owns the conversation: a composition state machine
//!   stages text and attachments, encodes attachments to data URIs, and
//!   submits full message histories over HTTP.
//! - The server side is a thin composition service: it prepends a fixed
//!   system directive, calls the remote model, and re-frames the model's
//!   streamed output as NDJSON frames for the client.
//! - Frames flow back through a channel-based transport so the assistant
//!   turn grows in arrival order until a terminal frame lands.

pub mod attachment;
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod stream;
