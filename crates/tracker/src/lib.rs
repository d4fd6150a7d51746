//! Transfer tracker: the single source of truth for files the user added.
//!
//! The tracker keeps an ordered list of [`FileEntry`] records, one per
//! accepted file, and is mutated only through [`Tracker::admit`],
//! [`Tracker::update`], [`Tracker::start_removal`], [`Tracker::remove`]
//! and [`Tracker::teardown`].
//! Readers take [`Tracker::snapshot`]s and can await changes through a
//! [`TrackerSubscription`].
//!
//! Every entry owns a preview handle allocated from a shared
//! [`PreviewStore`]; the tracker releases each handle exactly once.

pub mod preview;
pub mod store;
pub mod types;

// Re-export primary types for convenience.
pub use preview::{ObjectUrlTable, PreviewRef, PreviewStore};
pub use store::{Tracker, TrackerSubscription};
pub use types::{EntryId, EntryPatch, EntryStatus, FileEntry, Removal, StatusCounts};
