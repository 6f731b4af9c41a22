//! Composition: the client-side state machine for the in-progress turn.

mod draft;
mod placeholder;
mod state;

pub use draft::{Draft, StagedAttachment};
pub use placeholder::{PlaceholderRotation, PLACEHOLDERS};
pub use state::{Composer, ComposerState};
