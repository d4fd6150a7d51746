//! Preview handles for files that are not uploaded yet.
//!
//! A preview is a process-wide, revocable reference (a `blob:` URL in a
//! browser). Handles are cheap to mint but must be revoked exactly once,
//! so the tracker is the only caller of [`PreviewStore::revoke`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use imgdrop_transfer::{FileCandidate, SourceFile};
use tracing::{trace, warn};
use uuid::Uuid;

/// URL scheme prefix for handles minted by [`ObjectUrlTable`].
const OBJECT_URL_PREFIX: &str = "blob:imgdrop/";

/// Opaque reference to a locally resolvable preview.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewRef(String);

impl PreviewRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

/// Allocates and releases preview handles.
pub trait PreviewStore: Send + Sync {
    /// Mints a new handle for `file`.
    fn create(&self, file: &SourceFile) -> PreviewRef;

    /// Releases a handle previously returned by [`create`](Self::create).
    fn revoke(&self, preview: &PreviewRef);
}

/// In-memory object-URL table.
///
/// Keeps the payload of every live handle so a front end can render it,
/// and counts allocations and releases for leak checks.
#[derive(Debug, Default)]
pub struct ObjectUrlTable {
    inner: Mutex<TableInner>,
}

#[derive(Debug, Default)]
struct TableInner {
    live: HashMap<PreviewRef, Bytes>,
    created: u64,
    revoked: u64,
}

impl ObjectUrlTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TableInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the bytes behind a live handle.
    pub fn resolve(&self, preview: &PreviewRef) -> Option<Bytes> {
        self.lock().live.get(preview).cloned()
    }

    /// Number of handles minted and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    /// Total handles ever minted.
    pub fn created_count(&self) -> u64 {
        self.lock().created
    }

    /// Total successful revocations.
    pub fn revoked_count(&self) -> u64 {
        self.lock().revoked
    }
}

impl PreviewStore for ObjectUrlTable {
    fn create(&self, file: &SourceFile) -> PreviewRef {
        let preview = PreviewRef::new(format!("{OBJECT_URL_PREFIX}{}", Uuid::new_v4()));
        let mut inner = self.lock();
        inner.live.insert(preview.clone(), file.data().clone());
        inner.created += 1;
        trace!(url = preview.url(), file = file.name(), "preview created");
        preview
    }

    fn revoke(&self, preview: &PreviewRef) {
        let mut inner = self.lock();
        if inner.live.remove(preview).is_some() {
            inner.revoked += 1;
            trace!(url = preview.url(), "preview revoked");
        } else {
            warn!(url = preview.url(), "revoke of unknown or already released preview");
        }
    }
}
