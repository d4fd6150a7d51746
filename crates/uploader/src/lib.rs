//! Upload and delete orchestration for imgdrop.
//!
//! This crate implements the **business logic** that moves user files into
//! an object store through pre-signed URLs. It has no UI dependencies: a
//! front end feeds dropped files into a [`FileUploader`] and renders the
//! [`Tracker`](imgdrop_tracker::Tracker) it exposes.
//!
//! # Upload pipeline (per file, one task each)
//!
//! 1. **Negotiate**: ask the backend for a pre-signed PUT URL and key
//! 2. **Transfer**: PUT the raw bytes, reporting progress
//!
//! # Removal
//!
//! Entries without a remote key are dropped locally; others are deleted
//! from storage first and kept visible as failed if that does not work.

pub mod delete;
pub mod error;
pub mod http;
pub mod session;
pub mod storage;
pub mod upload;

#[cfg(test)]
mod mock;

// Re-export primary types for convenience.
pub use delete::{DeletionOrchestrator, RemoveOutcome};
pub use error::{DeletionError, StorageError, UploadError, UploaderError};
pub use http::HttpStorage;
pub use session::FileUploader;
pub use storage::{ProgressFn, StorageApi};
pub use upload::{UploadEvent, UploadOrchestrator};
