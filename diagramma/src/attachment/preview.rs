//! Preview resource tracking.
//!
//! Each staged attachment gets a preview URI that must be released exactly
//! once - when superseded by a new selection, when explicitly removed, or
//! when the owning draft is torn down. The handle revokes on `Drop`, so every
//! exit path releases through the same mechanism.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// Registry of live preview URIs for one composition surface.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    live: Arc<Mutex<HashSet<String>>>,
}

impl PreviewRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a preview URI for a staged attachment.
    pub fn acquire(&self, media_type: &str) -> PreviewHandle {
        let uri = format!("preview://{}", Uuid::now_v7());
        self.live
            .lock()
            .expect("preview registry poisoned")
            .insert(uri.clone());
        PreviewHandle {
            uri,
            media_type: media_type.to_string(),
            live: Arc::clone(&self.live),
        }
    }

    /// Number of preview URIs not yet revoked. Zero once every staged
    /// attachment has been removed, superseded, or torn down.
    pub fn live_count(&self) -> usize {
        self.live.lock().expect("preview registry poisoned").len()
    }
}

/// One preview URI, revoked exactly once when dropped.
#[derive(Debug)]
pub struct PreviewHandle {
    uri: String,
    media_type: String,
    live: Arc<Mutex<HashSet<String>>>,
}

impl PreviewHandle {
    /// The allocated preview URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Media type of the previewed attachment.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if let Ok(mut live) = self.live.lock() {
            live.remove(&self.uri);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_drop_balance() {
        let registry = PreviewRegistry::new();
        let a = registry.acquire("image/png");
        let b = registry.acquire("application/pdf");
        assert_eq!(registry.live_count(), 2);
        assert_ne!(a.uri(), b.uri());

        drop(a);
        assert_eq!(registry.live_count(), 1);
        drop(b);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn handles_survive_vec_removal_of_siblings() {
        let registry = PreviewRegistry::new();
        let mut handles: Vec<PreviewHandle> =
            (0..3).map(|_| registry.acquire("image/png")).collect();
        let kept = vec![handles[0].uri().to_string(), handles[2].uri().to_string()];

        handles.remove(1);
        assert_eq!(registry.live_count(), 2);
        assert_eq!(handles[0].uri(), kept[0]);
        assert_eq!(handles[1].uri(), kept[1]);
    }
}
