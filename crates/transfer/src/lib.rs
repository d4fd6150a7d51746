//! Client-side file handling for imgdrop uploads.
//!
//! - [`SourceFile`] holds the bytes and metadata of a file picked by the user.
//! - [`validate_batch`] gates a dropped batch on count, size and MIME type.
//! - [`ProgressCoalescer`] turns `(sent, total)` byte pairs into monotonic
//!   integer percentages.

mod progress;
mod types;
mod validation;

pub use progress::{IN_FLIGHT_CAP, ProgressCoalescer, percent_of};
pub use types::{FileCandidate, FileInfo, SourceFile, detect_content_type};
pub use validation::{
    DEFAULT_ALLOWED_MIME_TYPES, ValidationOptions, ValidationResult, format_file_size,
    validate_batch, validate_file,
};

/// One mebibyte, the unit used in size-limit messages.
pub const MIB: u64 = 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
