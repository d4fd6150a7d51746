//! Recording [`StorageApi`] double shared by the orchestrator tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use imgdrop_protocol::{PresignRequest, PresignResponse};
use imgdrop_transfer::SourceFile;
use tokio::sync::Notify;

use crate::error::StorageError;
use crate::storage::{ProgressFn, StorageApi};

/// Scripted answer for one PUT.
#[derive(Debug, Clone, Copy)]
pub enum PutOutcome {
    Status(u16),
    TransportError,
}

/// Records every call and answers from per-operation scripts.
///
/// Unscripted calls succeed: presign yields `key-<filename>`, PUT yields 200
/// and delete yields `Ok`.
#[derive(Default)]
pub struct MockStorage {
    pub presign_calls: Mutex<Vec<PresignRequest>>,
    pub put_calls: Mutex<Vec<(String, String, usize)>>,
    pub delete_calls: Mutex<Vec<String>>,
    pub presign_script: Mutex<VecDeque<Result<String, u16>>>,
    pub put_script: Mutex<VecDeque<PutOutcome>>,
    pub delete_script: Mutex<VecDeque<Result<(), u16>>>,
    /// Progress reports sent before each PUT answers.
    pub progress_steps: Vec<u64>,
    /// When set, PUT waits for a notification before answering.
    pub put_gate: Option<Arc<Notify>>,
    /// When set, delete waits for a notification before answering.
    pub delete_gate: Option<Arc<Notify>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presign_key(&self, key: &str) {
        self.presign_script
            .lock()
            .unwrap()
            .push_back(Ok(key.to_string()));
    }

    pub fn presign_fails(&self, status: u16) {
        self.presign_script.lock().unwrap().push_back(Err(status));
    }

    pub fn put_answers(&self, outcome: PutOutcome) {
        self.put_script.lock().unwrap().push_back(outcome);
    }

    pub fn delete_fails(&self, status: u16) {
        self.delete_script.lock().unwrap().push_back(Err(status));
    }

    pub fn presign_count(&self) -> usize {
        self.presign_calls.lock().unwrap().len()
    }

    pub fn put_count(&self) -> usize {
        self.put_calls.lock().unwrap().len()
    }

    pub fn delete_count(&self) -> usize {
        self.delete_calls.lock().unwrap().len()
    }
}

impl StorageApi for MockStorage {
    fn presign(
        &self,
        req: &PresignRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PresignResponse, StorageError>> + Send + '_>> {
        self.presign_calls.lock().unwrap().push(req.clone());
        let scripted = self.presign_script.lock().unwrap().pop_front();
        let filename = req.filename.clone();
        Box::pin(async move {
            match scripted {
                Some(Ok(key)) => Ok(PresignResponse {
                    presigned_url: format!("https://bucket.test/{key}?sig=1"),
                    key,
                }),
                Some(Err(status)) => Err(StorageError::Status {
                    status,
                    body: "Failed to generate URL".into(),
                }),
                None => Ok(PresignResponse {
                    presigned_url: format!("https://bucket.test/key-{filename}?sig=1"),
                    key: format!("key-{filename}"),
                }),
            }
        })
    }

    fn put_object(
        &self,
        url: &str,
        content_type: &str,
        data: Bytes,
        on_progress: ProgressFn,
    ) -> Pin<Box<dyn Future<Output = Result<u16, StorageError>> + Send + '_>> {
        self.put_calls
            .lock()
            .unwrap()
            .push((url.to_string(), content_type.to_string(), data.len()));
        let scripted = self.put_script.lock().unwrap().pop_front();
        let total = data.len() as u64;
        Box::pin(async move {
            for sent in &self.progress_steps {
                on_progress(*sent, total);
                tokio::task::yield_now().await;
            }
            if let Some(gate) = &self.put_gate {
                gate.notified().await;
            }
            match scripted.unwrap_or(PutOutcome::Status(200)) {
                PutOutcome::Status(status) => Ok(status),
                PutOutcome::TransportError => Err(StorageError::Status {
                    status: 0,
                    body: "connection reset".into(),
                }),
            }
        })
    }

    fn delete_object(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        self.delete_calls.lock().unwrap().push(key.to_string());
        let scripted = self.delete_script.lock().unwrap().pop_front();
        Box::pin(async move {
            if let Some(gate) = &self.delete_gate {
                gate.notified().await;
            }
            match scripted {
                Some(Err(status)) => Err(StorageError::Status {
                    status,
                    body: "Failed to delete file".into(),
                }),
                _ => Ok(()),
            }
        })
    }
}

pub fn png(name: &str, len: usize) -> SourceFile {
    SourceFile::new(name, "image/png", vec![0u8; len])
}
