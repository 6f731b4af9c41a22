//! Streaming protocol: wire frames and the client transport.

mod frame;
mod transport;

pub use frame::{Frame, DEADLINE_EXCEEDED};
pub use transport::ChatTransport;

use crate::error::TurnError;

/// One event yielded by the transport to the UI layer, in arrival order.
#[derive(Debug)]
pub enum StreamEvent {
    /// The service opened an assistant turn with this id.
    Started { message_id: String },
    /// A text fragment to append to the turn's text content.
    Delta(String),
    /// A file part emitted by the model, if any.
    File { media_type: String, url: String },
    /// Clean end of stream; the turn is final.
    Done,
    /// The turn failed. Terminal; no further events follow.
    Failed(TurnError),
}
