//! Entry types held by the tracker.

use std::fmt;

use imgdrop_transfer::SourceFile;
use uuid::Uuid;

use crate::preview::PreviewRef;

/// Stable identifier of a tracked file. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(Uuid);

impl EntryId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    /// Admitted, negotiation not finished yet.
    Pending,
    /// Pre-signed URL obtained, bytes in flight.
    Uploading,
    /// Stored remotely.
    Uploaded,
    /// Remote delete in flight.
    Deleting,
    /// Last upload or delete attempt failed.
    Failed,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Uploaded => "uploaded",
            Self::Deleting => "deleting",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One file the user added.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub id: EntryId,
    pub source: SourceFile,
    /// `None` once the preview has been released.
    pub preview: Option<PreviewRef>,
    pub status: EntryStatus,
    /// Percent 0–100, meaningful while [`EntryStatus::Uploading`].
    pub progress: u8,
    /// Storage key, known once negotiation succeeded.
    pub remote_key: Option<String>,
    pub error: bool,
}

impl FileEntry {
    pub(crate) fn new(source: SourceFile, preview: PreviewRef) -> Self {
        Self {
            id: EntryId::generate(),
            source,
            preview: Some(preview),
            status: EntryStatus::Pending,
            progress: 0,
            remote_key: None,
            error: false,
        }
    }

    /// Whether removing this entry requires a storage call.
    pub fn has_remote(&self) -> bool {
        self.remote_key.is_some()
    }
}

/// Partial change set merged into an entry by [`Tracker::update`].
///
/// `None` fields are left untouched.
///
/// [`Tracker::update`]: crate::Tracker::update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub status: Option<EntryStatus>,
    pub progress: Option<u8>,
    pub remote_key: Option<String>,
    pub error: Option<bool>,
}

impl EntryPatch {
    /// Negotiation succeeded: key known, bytes about to flow.
    pub fn negotiated(key: impl Into<String>) -> Self {
        Self {
            status: Some(EntryStatus::Uploading),
            progress: Some(0),
            remote_key: Some(key.into()),
            error: Some(false),
        }
    }

    /// In-flight progress report.
    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    /// Bytes confirmed stored.
    pub fn uploaded() -> Self {
        Self {
            status: Some(EntryStatus::Uploaded),
            progress: Some(100),
            error: Some(false),
            ..Self::default()
        }
    }

    /// Upload attempt failed in either phase.
    pub fn upload_failed() -> Self {
        Self {
            status: Some(EntryStatus::Failed),
            progress: Some(0),
            error: Some(true),
            ..Self::default()
        }
    }

    /// Remote delete started.
    pub fn deleting() -> Self {
        Self {
            status: Some(EntryStatus::Deleting),
            ..Self::default()
        }
    }

    /// Remote delete failed; entry stays visible.
    pub fn delete_failed() -> Self {
        Self {
            status: Some(EntryStatus::Failed),
            error: Some(true),
            ..Self::default()
        }
    }
}

/// How [`Tracker::start_removal`] disposed of an entry.
///
/// [`Tracker::start_removal`]: crate::Tracker::start_removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// No remote object; the entry is already gone.
    Local,
    /// The entry is `Deleting`; storage must delete `key`.
    Remote { key: String },
}

/// Number of entries per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub uploading: usize,
    pub uploaded: usize,
    pub deleting: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub(crate) fn add(&mut self, status: EntryStatus) {
        match status {
            EntryStatus::Pending => self.pending += 1,
            EntryStatus::Uploading => self.uploading += 1,
            EntryStatus::Uploaded => self.uploaded += 1,
            EntryStatus::Deleting => self.deleting += 1,
            EntryStatus::Failed => self.failed += 1,
        }
    }

    /// Entries whose upload has not settled yet.
    pub fn in_flight(&self) -> usize {
        self.pending + self.uploading
    }
}
