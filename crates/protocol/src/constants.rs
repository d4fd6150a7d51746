//! Endpoint paths and status rules for the storage collaborator.

/// Negotiation endpoint: returns a pre-signed PUT URL and the object key.
pub const UPLOAD_PATH: &str = "/api/s3/upload";

/// Object deletion endpoint.
pub const DELETE_PATH: &str = "/api/s3/delete";

/// Returns `true` if a PUT to a pre-signed URL counts as stored.
///
/// Only 200 and 204 are accepted; other 2xx codes are treated as failures.
pub fn is_put_success(status: u16) -> bool {
    matches!(status, 200 | 204)
}
