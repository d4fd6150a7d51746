//! File uploader facade.
//!
//! Ties validation, the tracker and both orchestrators together behind the
//! handful of calls a front end needs: accept dropped files, remove one,
//! wait for uploads and tear down.

use std::sync::{Arc, Mutex, PoisonError};

use imgdrop_toast::Toasts;
use imgdrop_tracker::{EntryId, ObjectUrlTable, PreviewStore, Tracker};
use imgdrop_transfer::{FileCandidate, SourceFile, ValidationOptions, validate_batch};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::delete::{DeletionOrchestrator, RemoveOutcome};
use crate::error::{DeletionError, UploaderError};
use crate::storage::StorageApi;
use crate::upload::{UploadEvent, UploadOrchestrator};

/// Upload session for one drop target.
pub struct FileUploader {
    tracker: Tracker,
    toasts: Toasts,
    options: ValidationOptions,
    uploads: Arc<UploadOrchestrator>,
    deletions: DeletionOrchestrator,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl FileUploader {
    /// Creates a session with its own in-memory preview table.
    pub fn new(storage: Arc<dyn StorageApi>, options: ValidationOptions) -> Self {
        Self::with_previews(storage, options, Arc::new(ObjectUrlTable::new()))
    }

    /// Creates a session that allocates previews from `previews`.
    pub fn with_previews(
        storage: Arc<dyn StorageApi>,
        options: ValidationOptions,
        previews: Arc<dyn PreviewStore>,
    ) -> Self {
        let tracker = Tracker::new(previews);
        let toasts = Toasts::new();
        Self {
            uploads: Arc::new(UploadOrchestrator::new(
                storage.clone(),
                tracker.clone(),
                toasts.clone(),
            )),
            deletions: DeletionOrchestrator::new(storage, tracker.clone(), toasts.clone()),
            tracker,
            toasts,
            options,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Takes the upload event receiver. Can only be called once.
    pub fn take_events(&self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.uploads.take_events()
    }

    /// Whether the session holds as many files as it accepts.
    pub fn is_full(&self) -> bool {
        self.tracker.len() >= self.options.max_file_count
    }

    /// Validates a batch against the session limits without admitting it.
    ///
    /// Works on metadata alone, so callers can reject a batch before
    /// reading any file contents. A rejected batch yields one error notice
    /// listing every problem.
    pub fn check<F: FileCandidate>(&self, files: &[F]) -> Result<(), UploaderError> {
        let result = validate_batch(files, self.tracker.len(), &self.options);
        if result.valid {
            return Ok(());
        }

        let summary = result.errors.join(", ");
        warn!(files = files.len(), errors = %summary, "batch rejected");
        self.toasts.error(&format!("Upload failed: {summary}"));
        Err(UploaderError::Validation(result.errors))
    }

    /// Validates and admits a dropped batch, then starts its uploads.
    ///
    /// A rejected batch is not admitted at all. Must be called from within
    /// a Tokio runtime.
    pub fn accept(&self, files: Vec<SourceFile>) -> Result<Vec<EntryId>, UploaderError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        self.check(&files)?;

        let entries = self.tracker.admit(files);
        let ids = entries.iter().map(|e| e.id).collect();
        info!(files = entries.len(), "batch accepted");

        let handles = self.uploads.spawn(entries);
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(handles);
        Ok(ids)
    }

    /// Removes an entry, deleting its stored object if it has one.
    pub async fn remove(&self, id: EntryId) -> RemoveOutcome {
        self.deletions.remove(id).await
    }

    /// Deletes an untracked object by key.
    pub async fn delete_key(&self, key: &str) -> Result<(), DeletionError> {
        self.deletions.delete_key(key).await
    }

    /// Waits until every upload started so far has finished.
    pub async fn wait_idle(&self) {
        loop {
            let handles =
                std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "upload task ended abnormally");
                }
            }
        }
    }

    /// Releases every live preview. Entries stay in the tracker.
    pub fn teardown(&self) -> usize {
        self.tracker.teardown()
    }
}
