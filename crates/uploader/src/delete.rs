//! Deletion orchestrator.
//!
//! Removes entries from the tracker, deleting the stored object first when
//! the entry has a remote key.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use imgdrop_toast::Toasts;
use imgdrop_tracker::{EntryId, EntryPatch, Removal, Tracker};
use tracing::{debug, info, warn};

use crate::error::DeletionError;
use crate::storage::StorageApi;

/// Result of [`DeletionOrchestrator::remove`].
#[derive(Debug)]
pub enum RemoveOutcome {
    /// No entry with that id.
    NotFound,
    /// Another removal of the same entry is still running.
    AlreadyInFlight,
    /// Entry had no remote object and was dropped locally.
    RemovedLocal,
    /// Remote object deleted and entry dropped.
    RemovedRemote { key: String },
    /// Remote delete failed; the entry stays, marked failed.
    Failed(DeletionError),
}

impl RemoveOutcome {
    /// Whether the entry is gone from the tracker.
    pub fn is_removed(&self) -> bool {
        matches!(self, Self::RemovedLocal | Self::RemovedRemote { .. })
    }
}

/// Removes entries, one in-flight removal per entry.
pub struct DeletionOrchestrator {
    storage: Arc<dyn StorageApi>,
    tracker: Tracker,
    toasts: Toasts,
    in_flight: Mutex<HashSet<EntryId>>,
}

/// Clears an id from the in-flight set when dropped.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<EntryId>>,
    id: EntryId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl DeletionOrchestrator {
    pub fn new(storage: Arc<dyn StorageApi>, tracker: Tracker, toasts: Toasts) -> Self {
        Self {
            storage,
            tracker,
            toasts,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn in_flight(&self) -> MutexGuard<'_, HashSet<EntryId>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes an entry.
    ///
    /// The preview is released up front. Entries without a remote key are
    /// dropped without any network call; otherwise the object is deleted
    /// and the entry dropped only if that succeeds. The key is read at the
    /// moment the removal starts, so a key attached by a running upload is
    /// never missed.
    pub async fn remove(&self, id: EntryId) -> RemoveOutcome {
        if !self.in_flight().insert(id) {
            debug!(entry = %id, "removal already in flight");
            return RemoveOutcome::AlreadyInFlight;
        }
        let _guard = InFlightGuard {
            set: &self.in_flight,
            id,
        };

        let key = match self.tracker.start_removal(id) {
            None => {
                debug!(entry = %id, "remove of unknown entry");
                return RemoveOutcome::NotFound;
            }
            Some(Removal::Local) => {
                self.toasts.success("File removed");
                info!(entry = %id, "entry removed locally");
                return RemoveOutcome::RemovedLocal;
            }
            Some(Removal::Remote { key }) => key,
        };

        debug!(entry = %id, key = %key, "deleting object");

        match self.storage.delete_object(&key).await {
            Ok(()) => {
                self.tracker.remove(id);
                self.toasts.success("File deleted successfully");
                info!(entry = %id, key = %key, "object deleted");
                RemoveOutcome::RemovedRemote { key }
            }
            Err(source) => {
                warn!(entry = %id, key = %key, error = %source, "delete failed");
                self.tracker.update(id, EntryPatch::delete_failed());
                self.toasts.error("Failed to delete file");
                RemoveOutcome::Failed(DeletionError { key, source })
            }
        }
    }

    /// Deletes an object that is not tracked, e.g. one uploaded by an
    /// earlier run.
    pub async fn delete_key(&self, key: &str) -> Result<(), DeletionError> {
        debug!(key = %key, "deleting untracked object");
        match self.storage.delete_object(key).await {
            Ok(()) => {
                self.toasts.success_with("File deleted successfully", key);
                info!(key = %key, "object deleted");
                Ok(())
            }
            Err(source) => {
                warn!(key = %key, error = %source, "delete failed");
                self.toasts.error_with("Failed to delete file", key);
                Err(DeletionError {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }
}
