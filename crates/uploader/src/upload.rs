//! Upload orchestrator.
//!
//! Drives each admitted entry through negotiation and transfer, writing
//! every state change back into the [`Tracker`] and notifying the user
//! through [`Toasts`].

use std::sync::{Arc, Mutex, PoisonError};

use imgdrop_protocol::{PresignRequest, is_put_success};
use imgdrop_toast::Toasts;
use imgdrop_tracker::{EntryId, EntryPatch, FileEntry, Tracker};
use imgdrop_transfer::{FileCandidate, ProgressCoalescer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::UploadError;
use crate::storage::{ProgressFn, StorageApi};

/// Events emitted while uploads run.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Pre-signed URL obtained; the key is attached to the entry.
    Negotiated { id: EntryId, key: String },
    /// New in-flight percentage.
    Progress { id: EntryId, percent: u8 },
    /// Object stored.
    Completed { id: EntryId, key: String },
    /// Either phase failed.
    Failed { id: EntryId, error: String },
}

/// Runs uploads against a [`StorageApi`].
pub struct UploadOrchestrator {
    storage: Arc<dyn StorageApi>,
    tracker: Tracker,
    toasts: Toasts,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<UploadEvent>>>,
}

impl UploadOrchestrator {
    pub fn new(storage: Arc<dyn StorageApi>, tracker: Tracker, toasts: Toasts) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            storage,
            tracker,
            toasts,
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Takes the event receiver. Can only be called once.
    ///
    /// Events are dropped while the channel is full, so a slow consumer
    /// never stalls an upload.
    pub fn take_events(&self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Launches one task per entry. Uploads run independently.
    pub fn spawn(self: &Arc<Self>, entries: Vec<FileEntry>) -> Vec<JoinHandle<()>> {
        entries
            .into_iter()
            .map(|entry| {
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    // Failures are already recorded on the entry.
                    let _ = this.upload(entry).await;
                })
            })
            .collect()
    }

    /// Uploads a single entry: negotiate, then transfer.
    ///
    /// Each phase makes exactly one network call; nothing is retried.
    pub async fn upload(&self, entry: FileEntry) -> Result<(), UploadError> {
        let id = entry.id;
        let file = entry.source;

        let req = PresignRequest {
            filename: file.name().to_string(),
            content_type: file.content_type().to_string(),
            size: file.size(),
        };
        debug!(entry = %id, file = %req.filename, size = req.size, "requesting presigned URL");

        let presigned = match self.storage.presign(&req).await {
            Ok(presigned) => presigned,
            Err(e) => {
                warn!(entry = %id, file = %req.filename, error = %e, "presign failed");
                self.fail(id, "Failed to get presigned URL", e.to_string());
                return Err(UploadError::Negotiation(e));
            }
        };

        let key = presigned.key;
        self.tracker.update(id, EntryPatch::negotiated(key.clone()));
        self.emit(UploadEvent::Negotiated {
            id,
            key: key.clone(),
        });
        debug!(entry = %id, key = %key, "uploading object");

        let result = match self
            .storage
            .put_object(
                &presigned.presigned_url,
                file.content_type(),
                file.data().clone(),
                self.progress_sink(id),
            )
            .await
        {
            Ok(status) if is_put_success(status) => Ok(()),
            Ok(status) => Err(UploadError::UnexpectedStatus(status)),
            Err(e) => Err(UploadError::Transfer(e)),
        };

        match result {
            Ok(()) => {
                self.tracker.update(id, EntryPatch::uploaded());
                self.toasts
                    .success_with("File uploaded successfully", file.name());
                self.emit(UploadEvent::Completed {
                    id,
                    key: key.clone(),
                });
                info!(entry = %id, key = %key, file = %file.name(), "upload completed");
                Ok(())
            }
            Err(e) => {
                warn!(entry = %id, key = %key, error = %e, "upload failed");
                self.fail(id, "Failed to upload file", e.to_string());
                Err(e)
            }
        }
    }

    fn fail(&self, id: EntryId, notice: &str, error: String) {
        self.tracker.update(id, EntryPatch::upload_failed());
        self.toasts.error(notice);
        self.emit(UploadEvent::Failed { id, error });
    }

    /// Progress callback that publishes coalesced percentages.
    fn progress_sink(&self, id: EntryId) -> ProgressFn {
        let coalescer = Mutex::new(ProgressCoalescer::new());
        let tracker = self.tracker.clone();
        let events = self.events_tx.clone();

        Arc::new(move |sent, total| {
            let published = coalescer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .observe(sent, total);
            if let Some(percent) = published {
                tracker.update(id, EntryPatch::progress(percent));
                if events
                    .try_send(UploadEvent::Progress { id, percent })
                    .is_err()
                {
                    trace!(entry = %id, percent, "progress event dropped");
                }
            }
        })
    }

    fn emit(&self, event: UploadEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            trace!(error = %e, "upload event dropped");
        }
    }
}
