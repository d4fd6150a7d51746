//! Storage collaborator trait.
//!
//! The front end never holds bucket credentials. It asks an application
//! endpoint for a pre-signed URL, PUTs bytes to that URL, and asks another
//! endpoint to delete objects. [`HttpStorage`](crate::HttpStorage) speaks
//! the real protocol; tests plug in mocks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use imgdrop_protocol::{PresignRequest, PresignResponse};

use crate::error::StorageError;

/// Receives `(bytes_sent, total_bytes)` while a PUT is in flight.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Abstract access to the object store.
pub trait StorageApi: Send + Sync {
    /// Requests a pre-signed PUT URL. Any non-2xx answer is an error.
    fn presign(
        &self,
        req: &PresignRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PresignResponse, StorageError>> + Send + '_>>;

    /// PUTs `data` to a pre-signed URL and returns the HTTP status.
    ///
    /// Only transport failures are errors; the caller judges the status.
    fn put_object(
        &self,
        url: &str,
        content_type: &str,
        data: Bytes,
        on_progress: ProgressFn,
    ) -> Pin<Box<dyn Future<Output = Result<u16, StorageError>> + Send + '_>>;

    /// Deletes the object stored under `key`. A missing object is success.
    fn delete_object(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>>;
}
