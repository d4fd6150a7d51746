//! The tracker store.
//!
//! One mutex guards the entry list; every operation takes it once, so a
//! mutation of an entry completes before the next one starts even when
//! many upload tasks report concurrently. Changes are announced through a
//! `watch` revision counter.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use imgdrop_transfer::SourceFile;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::preview::{PreviewRef, PreviewStore};
use crate::types::{EntryId, EntryPatch, EntryStatus, FileEntry, Removal, StatusCounts};

/// Shared handle to the tracker. Clones refer to the same store.
#[derive(Clone)]
pub struct Tracker {
    shared: Arc<Shared>,
}

struct Shared {
    entries: Mutex<Vec<FileEntry>>,
    previews: Arc<dyn PreviewStore>,
    revision: watch::Sender<u64>,
}

impl Tracker {
    /// Creates an empty tracker that allocates previews from `previews`.
    pub fn new(previews: Arc<dyn PreviewStore>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(Vec::new()),
                previews,
                revision,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FileEntry>> {
        self.shared
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.shared.revision.send_modify(|rev| *rev += 1);
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Creates a `Pending` entry with a fresh preview for each file.
    ///
    /// Entries are appended in the given order and returned so the caller
    /// can start their uploads.
    pub fn admit(&self, files: Vec<SourceFile>) -> Vec<FileEntry> {
        if files.is_empty() {
            return Vec::new();
        }

        let created: Vec<FileEntry> = files
            .into_iter()
            .map(|file| {
                let preview = self.shared.previews.create(&file);
                FileEntry::new(file, preview)
            })
            .collect();

        self.lock().extend(created.iter().cloned());
        self.bump();

        debug!(count = created.len(), "admitted files");
        created
    }

    /// Merges `patch` into the entry with `id`.
    ///
    /// Returns `false` if the entry no longer exists (removed while an
    /// upload was still reporting) or nothing changed.
    ///
    /// Rules applied on top of last-writer-wins:
    /// - an entry that is `Deleting` never goes back to `Uploading` or
    ///   `Uploaded`, and ignores progress;
    /// - a progress report without a status change only applies while the
    ///   entry is `Uploading`, and never decreases it;
    /// - the remote key is set at most once.
    pub fn update(&self, id: EntryId, patch: EntryPatch) -> bool {
        let changed = {
            let mut entries = self.lock();
            let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
                return false;
            };
            apply_patch(entry, patch)
        };

        if changed {
            self.bump();
        }
        changed
    }

    /// Begins removing an entry, deciding under one lock whether storage
    /// must be involved.
    ///
    /// The preview is released in either case. An entry without a remote
    /// key is dropped right away; one with a key is marked `Deleting` and
    /// its key handed back. Returns `None` if the entry does not exist.
    pub fn start_removal(&self, id: EntryId) -> Option<Removal> {
        let (preview, removal) = {
            let mut entries = self.lock();
            let index = entries.iter().position(|e| e.id == id)?;
            let preview = entries[index].preview.take();
            let removal = match entries[index].remote_key.clone() {
                Some(key) => {
                    apply_patch(&mut entries[index], EntryPatch::deleting());
                    Removal::Remote { key }
                }
                None => {
                    entries.remove(index);
                    Removal::Local
                }
            };
            (preview, removal)
        };

        if let Some(p) = preview {
            self.shared.previews.revoke(&p);
        }
        self.bump();

        debug!(entry = %id, ?removal, "removal started");
        Some(removal)
    }

    /// Releases the entry's preview (if still held) and removes it.
    pub fn remove(&self, id: EntryId) -> Option<FileEntry> {
        let mut removed = {
            let mut entries = self.lock();
            let index = entries.iter().position(|e| e.id == id)?;
            entries.remove(index)
        };

        if let Some(p) = removed.preview.take() {
            self.shared.previews.revoke(&p);
        }
        self.bump();

        debug!(entry = %id, "entry removed");
        Some(removed)
    }

    /// Releases every preview still held. Entries stay in place.
    ///
    /// Returns the number of previews released; a second call releases
    /// nothing.
    pub fn teardown(&self) -> usize {
        let released = {
            let mut entries = self.lock();
            take_previews(&mut entries)
        };

        for p in &released {
            self.shared.previews.revoke(p);
        }
        if !released.is_empty() {
            self.bump();
        }

        debug!(released = released.len(), "tracker torn down");
        released.len()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Copy of all entries in admission order.
    pub fn snapshot(&self) -> Vec<FileEntry> {
        self.lock().clone()
    }

    /// Copy of a single entry.
    pub fn get(&self, id: EntryId) -> Option<FileEntry> {
        self.lock().iter().find(|e| e.id == id).cloned()
    }

    /// Number of entries, i.e. the count the validator treats as accepted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of entries per status.
    pub fn count_by_status(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for entry in self.lock().iter() {
            counts.add(entry.status);
        }
        counts
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> TrackerSubscription {
        TrackerSubscription {
            rx: self.shared.revision.subscribe(),
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let entries = self
            .entries
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        let released = take_previews(entries);
        if !released.is_empty() {
            warn!(count = released.len(), "tracker dropped without teardown");
        }
        for p in &released {
            self.previews.revoke(p);
        }
    }
}

fn take_previews(entries: &mut [FileEntry]) -> Vec<PreviewRef> {
    entries.iter_mut().filter_map(|e| e.preview.take()).collect()
}

fn apply_patch(entry: &mut FileEntry, patch: EntryPatch) -> bool {
    let before = (entry.status, entry.progress, entry.remote_key.clone(), entry.error);
    let deleting = entry.status == EntryStatus::Deleting;

    if let Some(status) = patch.status {
        let resurrects =
            deleting && matches!(status, EntryStatus::Uploading | EntryStatus::Uploaded);
        if resurrects {
            debug!(entry = %entry.id, to = %status, "ignoring transition out of deleting");
        } else {
            entry.status = status;
        }
    }

    // A bare progress report only counts while bytes are in flight; terminal
    // patches carry their own progress together with the status.
    if let Some(progress) = patch.progress
        && !deleting
    {
        let progress = progress.min(100);
        if patch.status.is_some() {
            entry.progress = progress;
        } else if entry.status == EntryStatus::Uploading {
            entry.progress = entry.progress.max(progress);
        } else {
            debug!(
                entry = %entry.id,
                status = %entry.status,
                progress,
                "ignoring stray progress"
            );
        }
    }

    if let Some(key) = patch.remote_key {
        match &entry.remote_key {
            None => entry.remote_key = Some(key),
            Some(existing) if *existing != key => {
                warn!(
                    entry = %entry.id,
                    existing = %existing,
                    new = %key,
                    "remote key already set"
                );
            }
            Some(_) => {}
        }
    }

    if let Some(error) = patch.error {
        entry.error = error;
    }

    before != (entry.status, entry.progress, entry.remote_key.clone(), entry.error)
}

/// Change notifications from a [`Tracker`].
pub struct TrackerSubscription {
    rx: watch::Receiver<u64>,
}

impl TrackerSubscription {
    /// Waits for the next change. Returns `false` once the tracker is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Revision number of the latest change seen.
    pub fn revision(&self) -> u64 {
        *self.rx.borrow()
    }
}
