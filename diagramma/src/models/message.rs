//! Message model representing one conversational turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Part;

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user.
    User,
    /// Message from the assistant.
    Assistant,
}

impl Role {
    /// Convert role to its wire string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery status of a message.
///
/// User messages and fully received assistant messages are `Complete` and
/// immutable. An in-flight assistant message is `Streaming` and mutable only
/// by extending its last part. A message whose stream died is `Failed`; its
/// partial parts are retained but it is never presented as complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Complete,
    Streaming,
    Failed,
}

impl MessageStatus {
    /// Whether this is the default (complete) status.
    pub fn is_complete(&self) -> bool {
        *self == Self::Complete
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier, assigned when the turn is created.
    pub id: String,
    /// Role of the sender.
    pub role: Role,
    /// Ordered content parts.
    pub parts: Vec<Part>,
    /// Delivery status. Omitted on the wire when complete.
    #[serde(default, skip_serializing_if = "MessageStatus::is_complete")]
    pub status: MessageStatus,
    /// When the turn was created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Generate a UUIDv7 (time-ordered, globally unique) message id.
    fn generate_id() -> String {
        Uuid::now_v7().to_string()
    }

    /// Create a complete user message from assembled parts.
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            id: Self::generate_id(),
            role: Role::User,
            parts,
            status: MessageStatus::Complete,
            created_at: Utc::now(),
        }
    }

    /// Create an empty assistant message awaiting streamed content.
    pub fn assistant_pending() -> Self {
        Self {
            id: Self::generate_id(),
            role: Role::Assistant,
            parts: Vec::new(),
            status: MessageStatus::Streaming,
            created_at: Utc::now(),
        }
    }

    /// Concatenated text of all text parts, in part order.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_wire_shape() {
        let message = Message::user(vec![
            Part::text("Summarize this diagram"),
            Part::file("image/png", "data:image/png;base64,iVBOR"),
        ]);
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["parts"][0]["type"], "text");
        assert_eq!(json["parts"][0]["text"], "Summarize this diagram");
        assert_eq!(json["parts"][1]["type"], "file");
        assert_eq!(json["parts"][1]["mediaType"], "image/png");
        // Complete status stays off the wire.
        assert!(json.get("status").is_none());
    }

    #[test]
    fn deserialize_without_status_or_timestamp() {
        let message: Message = serde_json::from_str(
            r#"{"id":"m1","role":"assistant","parts":[{"type":"text","text":"hi"}]}"#,
        )
        .unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.status, MessageStatus::Complete);
        assert_eq!(message.text(), "hi");
    }

    #[test]
    fn ids_are_unique() {
        let a = Message::user(vec![Part::text("a")]);
        let b = Message::user(vec![Part::text("b")]);
        assert_ne!(a.id, b.id);
    }
}
