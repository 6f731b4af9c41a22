//! The composition state machine.
//!
//! UI callbacks (keystrokes, focus, outside clicks, file selection, submit)
//! are explicit transitions on `Composer`, so the activation, idle, and
//! submitting states and their guards are testable without any UI attached.

use crate::attachment::{accepted_media_type, AttachmentSource, PreviewRegistry};
use crate::error::TurnError;
use crate::models::Part;

use super::{Draft, PlaceholderRotation, StagedAttachment};

/// State of the composition surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposerState {
    /// No focus, no content. Placeholder rotation runs here only.
    #[default]
    Idle,
    /// Focused or holding content.
    Active,
    /// A submission is in flight; further submits are rejected.
    Submitting,
}

/// Client-side state machine for the in-progress user turn.
#[derive(Debug, Default)]
pub struct Composer {
    state: ComposerState,
    draft: Draft,
    previews: PreviewRegistry,
    placeholder: PlaceholderRotation,
}

impl Composer {
    /// Create an idle composer with an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub const fn state(&self) -> ComposerState {
        self.state
    }

    /// The draft under construction.
    pub const fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Preview registry backing this surface (exposed for leak checks).
    pub const fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Focus event on the input surface.
    pub fn focus(&mut self) {
        if self.state == ComposerState::Idle {
            self.state = ComposerState::Active;
        }
    }

    /// Click outside the composition surface. Collapses to idle only when
    /// the draft is empty; content is never discarded by a stray click.
    pub fn click_outside(&mut self) {
        if self.state == ComposerState::Active && !self.draft.has_content() {
            self.state = ComposerState::Idle;
        }
    }

    /// Replace the pending text (keystroke-level edits collapse to this).
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
        if self.state == ComposerState::Idle {
            self.state = ComposerState::Active;
        }
    }

    /// Enter keypress. Plain Enter is swallowed; Enter with the modifier
    /// (Ctrl or Cmd) requests submission. Returns whether to submit.
    pub fn key_enter(&self, modifier: bool) -> bool {
        modifier && self.state != ComposerState::Submitting
    }

    /// Replace the staged attachment set with a new file selection.
    ///
    /// Every file must be an accepted media type; an unsupported file
    /// rejects the whole selection with no state mutation. Superseded
    /// attachments have their previews revoked.
    pub fn stage_files(&mut self, files: Vec<AttachmentSource>) -> Result<(), TurnError> {
        if self.state == ComposerState::Submitting {
            return Err(TurnError::Busy);
        }
        if let Some(bad) = files.iter().find(|f| !accepted_media_type(&f.media_type)) {
            return Err(TurnError::UnsupportedMediaType(bad.media_type.clone()));
        }

        let staged: Vec<StagedAttachment> = files
            .into_iter()
            .map(|f| StagedAttachment {
                preview: self.previews.acquire(&f.media_type),
                name: f.name,
                media_type: f.media_type,
                path: f.path,
            })
            .collect();

        // Old handles drop here, revoking their previews.
        self.draft.attachments = staged;
        if self.state == ComposerState::Idle {
            self.state = ComposerState::Active;
        }
        Ok(())
    }

    /// Remove one staged attachment by index, revoking only its preview.
    /// Out-of-range indices are rejected so a doubled removal action can
    /// never take out two attachments.
    pub fn remove_attachment(&mut self, index: usize) -> bool {
        if index >= self.draft.attachments.len() {
            return false;
        }
        self.draft.attachments.remove(index);
        true
    }

    /// Begin a submission: validates the draft and enters `Submitting`.
    /// Blank drafts are a no-op rejection with no state change.
    pub fn begin_submit(&mut self) -> Result<(), TurnError> {
        if self.state == ComposerState::Submitting {
            return Err(TurnError::Busy);
        }
        if self.draft.is_blank() {
            return Err(TurnError::EmptyDraft);
        }
        self.state = ComposerState::Submitting;
        Ok(())
    }

    /// Validate, enter `Submitting`, and encode the draft into outgoing
    /// parts (text first, attachments in staging order). On encoding
    /// failure the draft is preserved unmodified and the surface returns to
    /// `Active` so the user can retry.
    pub async fn submit_parts(&mut self) -> Result<Vec<Part>, TurnError> {
        self.begin_submit()?;
        match self.draft.assemble_parts().await {
            Ok(parts) => Ok(parts),
            Err(err) => {
                self.state = ComposerState::Active;
                Err(err)
            }
        }
    }

    /// The transport accepted the turn: clear text and attachments (previews
    /// revoked) and return to idle.
    pub fn finish_submit(&mut self) {
        self.draft.clear();
        self.state = ComposerState::Idle;
    }

    /// The submission failed after encoding (transport refused the turn).
    /// Draft stays intact; surface returns to active.
    pub fn abort_submit(&mut self) {
        self.state = ComposerState::Active;
    }

    /// The placeholder hint to show, if any. Visible only while idle with
    /// empty text - never while the user is typing.
    pub fn placeholder(&self) -> Option<&'static str> {
        if self.state == ComposerState::Idle && self.draft.text.is_empty() {
            Some(self.placeholder.current())
        } else {
            None
        }
    }

    /// Timer tick for the placeholder rotation. Suspended (no-op) unless
    /// the surface is idle with empty text.
    pub fn tick_placeholder(&mut self) {
        if self.state == ComposerState::Idle && self.draft.text.is_empty() {
            self.placeholder.advance();
        }
    }
}
