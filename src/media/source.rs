// Source references and the transient blob registry
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use url::Url;

use crate::error::PlayerError;

const BLOB_SCHEME: &str = "blob:";

/// A source reference as assigned to a media element.
///
/// Kept as the raw string the host handed over so that unparsable
/// references can still be carried around and reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaSource(String);

impl MediaSource {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Transient in-memory blob reference
    pub fn is_blob(&self) -> bool {
        self.0.starts_with(BLOB_SCHEME)
    }

    /// Empty, or equal to the host page's own address
    pub fn is_degenerate(&self, page_address: &str) -> bool {
        self.0.trim().is_empty() || self.0 == page_address
    }

    pub fn parse_url(&self) -> Result<Url, PlayerError> {
        Url::parse(&self.0).map_err(|e| PlayerError::UnparsableSourceUrl(format!("{}: {}", self.0, e)))
    }

    /// Local path for `file:` references
    pub fn file_path(&self) -> Option<PathBuf> {
        let url = Url::parse(&self.0).ok()?;
        if url.scheme() == "file" {
            url.to_file_path().ok()
        } else {
            None
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Url> for MediaSource {
    fn from(url: Url) -> Self {
        Self(url.into())
    }
}

#[derive(Debug, Clone)]
pub struct Blob {
    pub bytes: Arc<Vec<u8>>,
    pub content_type: String,
}

/// Registry of transient blob references.
///
/// Cloning shares the registry; handles stay valid until revoked.
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    blobs: Arc<RwLock<HashMap<String, Blob>>>,
    next_id: Arc<AtomicU64>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes and hand out a fresh `blob:` reference
    pub fn create(&self, bytes: Vec<u8>, content_type: impl Into<String>) -> MediaSource {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let reference = format!("{}ttsplayer/{:08x}", BLOB_SCHEME, id);
        self.blobs.write().insert(
            reference.clone(),
            Blob {
                bytes: Arc::new(bytes),
                content_type: content_type.into(),
            },
        );
        log::debug!("Created blob {}", reference);
        MediaSource(reference)
    }

    pub fn get(&self, source: &MediaSource) -> Option<Blob> {
        self.blobs.read().get(source.as_str()).cloned()
    }

    /// Read a blob's bytes, as a download would
    pub async fn fetch(&self, source: &MediaSource) -> Result<Blob, PlayerError> {
        // Yield once so the caller's continuation runs off the dispatching task
        tokio::task::yield_now().await;
        self.get(source)
            .ok_or_else(|| PlayerError::FetchFailure(format!("{} is no longer available", source)))
    }

    /// Release a blob reference; returns whether it was live
    pub fn revoke(&self, source: &MediaSource) -> bool {
        let removed = self.blobs.write().remove(source.as_str()).is_some();
        if removed {
            log::debug!("Revoked blob {}", source);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_references() {
        let page = "http://localhost:5000/";
        assert!(MediaSource::new("blob:http://localhost:5000/1234").is_blob());
        assert!(!MediaSource::new("http://cdn/clip.wav").is_blob());
        assert!(MediaSource::new(page).is_degenerate(page));
        assert!(MediaSource::new("").is_degenerate(page));
        assert!(!MediaSource::new("http://cdn/clip.wav").is_degenerate(page));
    }

    #[test]
    fn file_references_resolve_to_paths() {
        let source = MediaSource::new("file:///tmp/clip.wav");
        assert_eq!(source.file_path(), Some(PathBuf::from("/tmp/clip.wav")));
        assert_eq!(MediaSource::new("http://cdn/clip.wav").file_path(), None);
    }

    #[tokio::test]
    async fn blobs_live_until_revoked() {
        let store = BlobStore::new();
        let first = store.create(vec![1, 2, 3], "audio/mpeg");
        let second = store.create(vec![4], "audio/wav");
        assert_ne!(first, second);
        assert!(first.is_blob());

        let blob = store.fetch(&first).await.unwrap();
        assert_eq!(blob.bytes.as_slice(), &[1, 2, 3]);
        assert_eq!(blob.content_type, "audio/mpeg");

        assert!(store.revoke(&first));
        assert!(!store.revoke(&first));
        assert!(matches!(
            store.fetch(&first).await,
            Err(PlayerError::FetchFailure(_))
        ));
        assert_eq!(store.len(), 1);
    }
}
