//! In-process stand-in for browser object URLs.
//!
//! A [`BlobHandle`] names a byte buffer by URL for as long as the handle
//! lives; dropping it revokes the URL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::trace;

const URL_PREFIX: &str = "blob:compressor/";

#[derive(Default)]
struct Registry {
    next_id: u64,
    blobs: HashMap<u64, Arc<[u8]>>,
}

/// Shared table of live blobs. Cloning yields another view of the same table.
#[derive(Clone, Default)]
pub struct BlobStore {
    inner: Arc<Mutex<Registry>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self, bytes: impl Into<Arc<[u8]>>, mime: &str) -> BlobHandle {
        let bytes = bytes.into();
        let id = {
            let mut registry = self.registry();
            registry.next_id += 1;
            let id = registry.next_id;
            registry.blobs.insert(id, Arc::clone(&bytes));
            id
        };
        let url = format!("{}{}", URL_PREFIX, id);
        trace!("Created {} ({}, {} bytes)", url, mime, bytes.len());

        BlobHandle {
            id,
            url,
            mime: mime.to_owned(),
            bytes,
            store: self.clone(),
        }
    }

    /// Look up the bytes behind a URL that has not been revoked yet.
    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        let id: u64 = url.strip_prefix(URL_PREFIX)?.parse().ok()?;
        self.registry().blobs.get(&id).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.registry().blobs.len()
    }

    fn revoke(&self, id: u64) {
        self.registry().blobs.remove(&id);
    }
}

/// Owning reference to a registered blob.
pub struct BlobHandle {
    id: u64,
    url: String,
    mime: String,
    bytes: Arc<[u8]>,
    store: BlobStore,
}

impl BlobHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for BlobHandle {
    fn drop(&mut self) {
        trace!("Revoked {}", self.url);
        self.store.revoke(self.id);
    }
}

impl std::fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobHandle")
            .field("url", &self.url)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_resolves_until_dropped() {
        let store = BlobStore::new();
        let handle = store.create(vec![1u8, 2, 3], "image/png");
        let url = handle.url().to_owned();

        assert!(url.starts_with("blob:compressor/"));
        assert_eq!(store.resolve(&url).as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(store.live_count(), 1);

        drop(handle);
        assert!(store.resolve(&url).is_none());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn urls_are_unique() {
        let store = BlobStore::new();
        let a = store.create(vec![0u8], "application/pdf");
        let b = store.create(vec![0u8], "application/pdf");
        assert_ne!(a.url(), b.url());
        assert_eq!(store.live_count(), 2);
    }

    #[test]
    fn foreign_urls_do_not_resolve() {
        let store = BlobStore::new();
        let _handle = store.create(vec![9u8], "image/gif");
        assert!(store.resolve("blob:elsewhere/1").is_none());
        assert!(store.resolve("blob:compressor/abc").is_none());
    }
}
