//! Composition draft - the not-yet-sent turn under construction.

use std::path::PathBuf;

use crate::attachment::{encode_all, AttachmentSource, PreviewHandle};
use crate::error::TurnError;
use crate::models::Part;

/// One staged attachment: a file handle plus its live preview resource.
/// Dropping it (removal, supersede, teardown) revokes the preview.
#[derive(Debug)]
pub struct StagedAttachment {
    /// Display name.
    pub name: String,
    /// Declared media type.
    pub media_type: String,
    /// Backing file location.
    pub path: PathBuf,
    /// Preview resource, revoked exactly once on drop.
    pub preview: PreviewHandle,
}

/// The pending text and staged attachment set for the next user turn.
#[derive(Debug, Default)]
pub struct Draft {
    /// Pending text, exactly as typed.
    pub text: String,
    /// Staged attachments, in selection order.
    pub attachments: Vec<StagedAttachment>,
}

impl Draft {
    /// Whether there is nothing submittable: whitespace-only text and no
    /// attachments.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.attachments.is_empty()
    }

    /// Whether there is any content at all (used by the outside-click guard:
    /// content is never discarded by a stray click).
    pub fn has_content(&self) -> bool {
        !self.text.is_empty() || !self.attachments.is_empty()
    }

    /// Snapshot the staged attachments for encoding. The draft itself stays
    /// untouched so a failed submission preserves everything.
    pub fn attachment_sources(&self) -> Vec<AttachmentSource> {
        self.attachments
            .iter()
            .map(|a| AttachmentSource {
                name: a.name.clone(),
                media_type: a.media_type.clone(),
                path: a.path.clone(),
            })
            .collect()
    }

    /// Assemble the outgoing parts: the text part always comes first and is
    /// always included, even when empty (keeps part ordering stable for
    /// attachment-only turns), followed by encoded file parts in staging
    /// order.
    pub async fn assemble_parts(&self) -> Result<Vec<Part>, TurnError> {
        let mut parts = vec![Part::text(self.text.clone())];
        parts.extend(encode_all(&self.attachment_sources()).await?);
        Ok(parts)
    }

    /// Reset to empty, revoking all previews via drop.
    pub fn clear(&mut self) {
        self.text.clear();
        self.attachments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::PreviewRegistry;
    use std::io::Write;

    fn staged(registry: &PreviewRegistry, dir: &tempfile::TempDir, name: &str) -> StagedAttachment {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"bytes").unwrap();
        StagedAttachment {
            name: name.to_string(),
            media_type: "image/png".to_string(),
            path,
            preview: registry.acquire("image/png"),
        }
    }

    #[test]
    fn blankness() {
        let mut draft = Draft::default();
        assert!(draft.is_blank());
        draft.text = "   \t ".to_string();
        assert!(draft.is_blank());
        assert!(draft.has_content());
        draft.text = "hello".to_string();
        assert!(!draft.is_blank());
    }

    #[tokio::test]
    async fn text_part_first_even_when_empty() {
        let registry = PreviewRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let mut draft = Draft::default();
        draft.attachments.push(staged(&registry, &dir, "only.png"));

        let parts = draft.assemble_parts().await.unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], Part::text(""));
        assert!(matches!(&parts[1], Part::File { .. }));
    }

    #[test]
    fn clear_revokes_previews() {
        let registry = PreviewRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let mut draft = Draft::default();
        draft.attachments.push(staged(&registry, &dir, "a.png"));
        draft.attachments.push(staged(&registry, &dir, "b.png"));
        assert_eq!(registry.live_count(), 2);

        draft.clear();
        assert_eq!(registry.live_count(), 0);
    }
}
