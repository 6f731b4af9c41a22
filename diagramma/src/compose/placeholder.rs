//! Decorative placeholder hint rotation.
//!
//! Purely cosmetic: cycles through hint strings while the composition
//! surface is idle and empty, and is suspended the instant the surface
//! becomes active or text appears. Correctness never depends on it.

/// Hint strings shown in the empty input field.
pub const PLACEHOLDERS: &[&str] = &[
    "Ask me about your documents...",
    "Summarize the file I've uploaded",
    "What are the key points in this image?",
    "Compare these two diagrams",
    "Explain this flowchart",
];

/// Cyclic rotation over the placeholder hints.
#[derive(Debug, Default)]
pub struct PlaceholderRotation {
    index: usize,
}

impl PlaceholderRotation {
    /// Create a rotation starting at the first hint.
    pub fn new() -> Self {
        Self::default()
    }

    /// The hint currently showing.
    pub fn current(&self) -> &'static str {
        PLACEHOLDERS[self.index]
    }

    /// Advance to the next hint, wrapping around.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % PLACEHOLDERS.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_around() {
        let mut rotation = PlaceholderRotation::new();
        let first = rotation.current();
        for _ in 0..PLACEHOLDERS.len() {
            rotation.advance();
        }
        assert_eq!(rotation.current(), first);
    }

    #[test]
    fn visits_every_hint() {
        let mut rotation = PlaceholderRotation::new();
        let mut seen = Vec::new();
        for _ in 0..PLACEHOLDERS.len() {
            seen.push(rotation.current());
            rotation.advance();
        }
        assert_eq!(seen, PLACEHOLDERS);
    }
}
