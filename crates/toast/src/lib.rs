//! Toast notices shown to the user after uploads and deletions.
//!
//! [`ToastQueue`] is the plain in-memory queue; [`Toasts`] is the clonable
//! handle the orchestrators push into from their tasks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Toasts kept before the oldest is dropped.
const CAPACITY: usize = 32;

/// The visual category of a toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// A single notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub title: String,
    pub message: Option<String>,
}

/// In-memory toast queue with monotonic ID assignment.
///
/// The queue is bounded; pushing past capacity drops the oldest toast.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a toast with explicit kind, title and message.
    /// Returns the assigned toast ID.
    pub fn push(
        &mut self,
        kind: ToastKind,
        title: impl Into<String>,
        message: Option<String>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.toasts.len() == CAPACITY {
            self.toasts.remove(0);
        }
        self.toasts.push(Toast {
            id,
            kind,
            title: title.into(),
            message,
        });
        id
    }

    pub fn success(&mut self, title: impl Into<String>) -> u64 {
        self.push(ToastKind::Success, title, None)
    }

    pub fn error(&mut self, title: impl Into<String>) -> u64 {
        self.push(ToastKind::Error, title, None)
    }

    pub fn success_with(&mut self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Success, title, Some(message.into()))
    }

    pub fn error_with(&mut self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Error, title, Some(message.into()))
    }

    /// Iterate over toasts in insertion order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Removes and returns all toasts, oldest first.
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }
}

/// Shared, clonable handle to a [`ToastQueue`].
///
/// Every toast is also logged, so headless runs keep a trace of what the
/// user would have seen.
#[derive(Debug, Clone, Default)]
pub struct Toasts {
    queue: Arc<Mutex<ToastQueue>>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ToastQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn success(&self, title: &str) -> u64 {
        tracing::info!(toast = title, "success");
        self.lock().success(title)
    }

    pub fn success_with(&self, title: &str, message: &str) -> u64 {
        tracing::info!(toast = title, message, "success");
        self.lock().success_with(title, message)
    }

    pub fn error(&self, title: &str) -> u64 {
        tracing::warn!(toast = title, "error");
        self.lock().error(title)
    }

    pub fn error_with(&self, title: &str, message: &str) -> u64 {
        tracing::warn!(toast = title, message, "error");
        self.lock().error_with(title, message)
    }

    /// Copy of the current toasts, oldest first.
    pub fn snapshot(&self) -> Vec<Toast> {
        self.lock().iter().cloned().collect()
    }

    /// Removes and returns all toasts, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        self.lock().drain()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_retrieve() {
        let mut q = ToastQueue::new();
        let id = q.push(ToastKind::Error, "Test", Some("details".into()));

        let toast = q.iter().next().unwrap();
        assert_eq!(toast.id, id);
        assert_eq!(toast.title, "Test");
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message.as_deref(), Some("details"));
    }

    #[test]
    fn ids_are_monotonic_and_order_kept() {
        let mut q = ToastQueue::new();
        let id0 = q.success("first");
        let id1 = q.error("second");
        let id2 = q.success_with("third", "body");
        assert_eq!((id0, id1, id2), (0, 1, 2));

        let titles: Vec<&str> = q.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut q = ToastQueue::new();
        for i in 0..CAPACITY + 2 {
            q.success(format!("t{i}"));
        }

        assert_eq!(q.len(), CAPACITY);
        let first = q.iter().next().unwrap();
        assert_eq!(first.title, "t2");
        assert_eq!(first.id, 2);
    }

    #[test]
    fn drain_empties_the_queue() {
        let mut q = ToastQueue::new();
        q.success("a");
        q.error_with("b", "why");

        let drained = q.drain();
        assert_eq!(drained.len(), 2);
        assert!(q.is_empty());
        // IDs keep counting after a drain.
        assert_eq!(q.success("c"), 2);
    }

    #[test]
    fn shared_handle_sees_pushes_from_clones() {
        let toasts = Toasts::new();
        let clone = toasts.clone();
        clone.success_with("File uploaded successfully", "cat.png");
        clone.error("Failed to delete file");

        let snap = toasts.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].kind, ToastKind::Success);
        assert_eq!(snap[1].kind, ToastKind::Error);

        assert_eq!(toasts.drain().len(), 2);
        assert!(toasts.is_empty());
    }
}
