//! Data models for messages, parts, and conversations.

mod conversation;
mod message;
mod part;

pub use conversation::{Conversation, TurnProgress};
pub use message::{Message, MessageStatus, Role};
pub use part::Part;
