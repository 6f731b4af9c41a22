//! Typed content parts within a message.

use serde::{Deserialize, Serialize};

/// One typed unit of content in a message. Part order is significant - it
/// defines render and concatenation order. The wire shape matches the UI
/// message format: `{"type":"text","text":...}` and
/// `{"type":"file","mediaType":...,"url":...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Part {
    /// Plain text. The accumulation target for streamed text deltas.
    Text { text: String },
    /// A file reference. `url` is a data URI for user attachments, or a
    /// service-origin URI for model-returned files.
    File { media_type: String, url: String },
    /// Unrecognized part type. Renders as nothing; must never crash a
    /// consumer.
    #[serde(other)]
    Other,
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a file part.
    pub fn file(media_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self::File {
            media_type: media_type.into(),
            url: url.into(),
        }
    }

    /// Text content, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_part_wire_shape() {
        let part = Part::text("hello");
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json, serde_json::json!({"type": "text", "text": "hello"}));
    }

    #[test]
    fn file_part_wire_shape() {
        let part = Part::file("image/png", "data:image/png;base64,AAAA");
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "file",
                "mediaType": "image/png",
                "url": "data:image/png;base64,AAAA"
            })
        );
    }

    #[test]
    fn unknown_part_type_tolerated() {
        let part: Part =
            serde_json::from_str(r#"{"type":"reasoning","text":"hmm"}"#).unwrap();
        assert_eq!(part, Part::Other);
    }
}
