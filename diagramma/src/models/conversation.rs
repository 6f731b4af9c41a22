//! Conversation - the ordered, append-only message history.

use crate::error::TurnError;
use crate::stream::StreamEvent;

use super::{Message, MessageStatus, Part, Role};

/// Outcome of applying one stream event to the open assistant turn.
#[derive(Debug)]
pub enum TurnProgress {
    /// The turn is still streaming.
    Streaming,
    /// The turn finalized cleanly and is now immutable.
    Finished,
    /// The turn failed; partial content is retained but marked failed.
    Failed(TurnError),
}

/// An ordered sequence of messages, append-only from the client's
/// perspective. Owned by one session; no cross-session persistence.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages, in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a finalized message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Open a new in-flight assistant turn and return its id.
    pub fn begin_assistant(&mut self) -> String {
        let message = Message::assistant_pending();
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// The in-flight assistant turn, if one is open.
    fn open_turn(&mut self) -> Option<&mut Message> {
        self.messages
            .last_mut()
            .filter(|m| m.role == Role::Assistant && m.status == MessageStatus::Streaming)
    }

    /// Apply one stream event to the open assistant turn, in arrival order.
    ///
    /// Events for a finalized turn are ignored (the turn is immutable once
    /// complete). A failure never touches any prior message.
    pub fn apply(&mut self, event: StreamEvent) -> TurnProgress {
        let Some(turn) = self.open_turn() else {
            // No open turn: a late Failed still deserves reporting.
            return match event {
                StreamEvent::Failed(err) => TurnProgress::Failed(err),
                _ => TurnProgress::Streaming,
            };
        };

        match event {
            StreamEvent::Started { message_id } => {
                turn.id = message_id;
                TurnProgress::Streaming
            }
            StreamEvent::Delta(delta) => {
                match turn.parts.last_mut() {
                    Some(Part::Text { text }) => text.push_str(&delta),
                    _ => turn.parts.push(Part::text(delta)),
                }
                TurnProgress::Streaming
            }
            StreamEvent::File { media_type, url } => {
                turn.parts.push(Part::file(media_type, url));
                TurnProgress::Streaming
            }
            StreamEvent::Done => {
                // A finalized message never has an empty parts sequence.
                if turn.parts.is_empty() {
                    turn.parts.push(Part::text(""));
                }
                turn.status = MessageStatus::Complete;
                TurnProgress::Finished
            }
            StreamEvent::Failed(err) => {
                turn.status = MessageStatus::Failed;
                TurnProgress::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_apply_in_order() {
        let mut conversation = Conversation::new();
        conversation.begin_assistant();
        conversation.apply(StreamEvent::Delta("Hel".to_string()));
        conversation.apply(StreamEvent::Delta("lo".to_string()));
        let progress = conversation.apply(StreamEvent::Done);

        assert!(matches!(progress, TurnProgress::Finished));
        let turn = conversation.messages().last().unwrap();
        assert_eq!(turn.text(), "Hello");
        assert_eq!(turn.status, MessageStatus::Complete);
    }

    #[test]
    fn interrupted_turn_marked_failed_not_complete() {
        let mut conversation = Conversation::new();
        conversation.begin_assistant();
        conversation.apply(StreamEvent::Delta("The architecture sh".to_string()));
        let progress = conversation.apply(StreamEvent::Failed(TurnError::Interrupted));

        assert!(matches!(progress, TurnProgress::Failed(TurnError::Interrupted)));
        let turn = conversation.messages().last().unwrap();
        assert_eq!(turn.status, MessageStatus::Failed);
        // Partial content is retained.
        assert_eq!(turn.text(), "The architecture sh");
    }

    #[test]
    fn failure_never_touches_prior_messages() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user(vec![Part::text("first question")]));
        conversation.begin_assistant();
        conversation.apply(StreamEvent::Delta("answer".to_string()));
        conversation.apply(StreamEvent::Done);

        conversation.push(Message::user(vec![Part::text("second question")]));
        conversation.begin_assistant();
        conversation.apply(StreamEvent::Failed(TurnError::Interrupted));

        let messages = conversation.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].status, MessageStatus::Complete);
        assert_eq!(messages[1].text(), "answer");
        assert_eq!(messages[3].status, MessageStatus::Failed);
    }

    #[test]
    fn finalized_turn_ignores_late_deltas() {
        let mut conversation = Conversation::new();
        conversation.begin_assistant();
        conversation.apply(StreamEvent::Delta("done".to_string()));
        conversation.apply(StreamEvent::Done);
        conversation.apply(StreamEvent::Delta("stray".to_string()));

        assert_eq!(conversation.messages().last().unwrap().text(), "done");
    }

    #[test]
    fn empty_finalized_turn_gets_empty_text_part() {
        let mut conversation = Conversation::new();
        conversation.begin_assistant();
        conversation.apply(StreamEvent::Done);

        let turn = conversation.messages().last().unwrap();
        assert!(!turn.parts.is_empty());
        assert_eq!(turn.text(), "");
    }

    #[test]
    fn file_parts_append_after_text() {
        let mut conversation = Conversation::new();
        conversation.begin_assistant();
        conversation.apply(StreamEvent::Delta("see attached".to_string()));
        conversation.apply(StreamEvent::File {
            media_type: "image/png".to_string(),
            url: "https://example.test/render.png".to_string(),
        });
        conversation.apply(StreamEvent::Done);

        let turn = conversation.messages().last().unwrap();
        assert_eq!(turn.parts.len(), 2);
        assert!(matches!(turn.parts[1], Part::File { .. }));
    }
}
