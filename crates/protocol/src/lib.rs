//! Wire types shared by the imgdrop client and its storage endpoints.
//!
//! The client only ever talks to two application endpoints plus the
//! pre-signed URL handed back by the first one:
//!
//! - `POST /api/s3/upload`: negotiate a pre-signed PUT URL
//! - `PUT <presignedUrl>`: raw object bytes
//! - `DELETE /api/s3/delete`: remove an object by key

pub mod constants;
pub mod messages;

// Re-export primary types for convenience.
pub use constants::{DELETE_PATH, UPLOAD_PATH, is_put_success};
pub use messages::{DeleteRequest, DeleteResponse, ErrorResponse, PresignRequest, PresignResponse};
