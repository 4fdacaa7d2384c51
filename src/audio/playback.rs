// Playback URL registry
//
// Finalized recordings get a revocable URL for local preview playback.
// The registry owns the bytes behind each URL; revoking a handle removes
// them, and a revoked handle never resolves again.

use base64::Engine;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

/// A revocable reference to registered playback audio
///
/// Exactly one handle exists per registered recording; handles are not
/// cloneable, so releasing the handle's owner releases the URL.
#[derive(Debug)]
pub struct PlaybackHandle {
    id: Uuid,
    url: String,
}

impl PlaybackHandle {
    pub fn new(id: Uuid, url: String) -> Self {
        Self { id, url }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Bytes and mime type backing one playback URL
#[derive(Debug, Clone)]
pub struct PlaybackEntry {
    pub bytes: Arc<Vec<u8>>,
    pub mime_type: String,
}

/// Registry of playback URLs for locally held audio
pub trait BlobUrlRegistry: Send + Sync {
    /// Register audio bytes and return the handle to their playback URL
    fn register(&self, bytes: &[u8], mime_type: &str) -> PlaybackHandle;

    /// Release a handle's URL. Idempotent; the URL never resolves again.
    fn revoke(&self, handle: &PlaybackHandle);

    /// Look up the audio behind a registered URL
    fn resolve(&self, id: Uuid) -> Option<PlaybackEntry>;

    /// Inline `data:` URL form of a registered entry, for small previews
    fn data_url(&self, handle: &PlaybackHandle) -> Option<String> {
        let entry = self.resolve(handle.id())?;
        Some(format!(
            "data:{};base64,{}",
            entry.mime_type,
            base64::engine::general_purpose::STANDARD.encode(entry.bytes.as_slice())
        ))
    }
}

/// In-process registry backing `/playback/{id}` URLs
#[derive(Default)]
pub struct InMemoryUrlRegistry {
    entries: Mutex<HashMap<Uuid, PlaybackEntry>>,
}

impl InMemoryUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobUrlRegistry for InMemoryUrlRegistry {
    fn register(&self, bytes: &[u8], mime_type: &str) -> PlaybackHandle {
        let id = Uuid::new_v4();
        let entry = PlaybackEntry {
            bytes: Arc::new(bytes.to_vec()),
            mime_type: mime_type.to_string(),
        };

        {
            let mut entries = self.entries.lock().unwrap();
            entries.insert(id, entry);
        }

        info!("Registered playback URL /playback/{} ({} bytes)", id, bytes.len());
        PlaybackHandle::new(id, format!("/playback/{}", id))
    }

    fn revoke(&self, handle: &PlaybackHandle) {
        let removed = {
            let mut entries = self.entries.lock().unwrap();
            entries.remove(&handle.id())
        };

        if removed.is_some() {
            info!("Revoked playback URL {}", handle.url());
        }
    }

    fn resolve(&self, id: Uuid) -> Option<PlaybackEntry> {
        let entries = self.entries.lock().unwrap();
        entries.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let registry = InMemoryUrlRegistry::new();
        let handle = registry.register(&[1, 2, 3], "audio/webm");

        assert!(handle.url().starts_with("/playback/"));

        let entry = registry.resolve(handle.id()).expect("entry should resolve");
        assert_eq!(entry.bytes.as_slice(), &[1, 2, 3]);
        assert_eq!(entry.mime_type, "audio/webm");
    }

    #[test]
    fn test_revoked_handle_never_resolves_again() {
        let registry = InMemoryUrlRegistry::new();
        let handle = registry.register(&[9, 9], "audio/wav");

        registry.revoke(&handle);
        assert!(registry.resolve(handle.id()).is_none());

        // Second revoke is a no-op
        registry.revoke(&handle);
        assert!(registry.resolve(handle.id()).is_none());
    }

    #[test]
    fn test_data_url_inlines_registered_bytes() {
        let registry = InMemoryUrlRegistry::new();
        let handle = registry.register(b"abc", "audio/wav");

        let data_url = registry.data_url(&handle).expect("data url");
        assert_eq!(data_url, "data:audio/wav;base64,YWJj");

        registry.revoke(&handle);
        assert!(registry.data_url(&handle).is_none());
    }

    #[test]
    fn test_handles_are_distinct_per_registration() {
        let registry = InMemoryUrlRegistry::new();
        let first = registry.register(&[1], "audio/wav");
        let second = registry.register(&[2], "audio/wav");

        assert_ne!(first.id(), second.id());
        assert_ne!(first.url(), second.url());
    }
}
