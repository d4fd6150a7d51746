use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::TransferError;

/// MIME type used when the extension is not recognised.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Anything the validator can judge: a name, a byte size and a MIME type.
pub trait FileCandidate {
    fn name(&self) -> &str;
    fn size(&self) -> u64;
    fn content_type(&self) -> &str;
}

/// File metadata without a payload.
///
/// Lets callers validate a batch before reading any bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub content_type: String,
}

impl FileInfo {
    /// Reads a file's metadata from disk without touching its contents.
    pub async fn stat(path: &Path) -> Result<Self, TransferError> {
        let name = file_name(path)?;
        let meta = tokio::fs::metadata(path).await?;
        let content_type = detect_content_type(&name).unwrap_or(FALLBACK_CONTENT_TYPE);

        Ok(Self {
            content_type: content_type.to_string(),
            size: meta.len(),
            name,
        })
    }
}

impl FileCandidate for FileInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// A user-selected file: immutable bytes plus metadata.
///
/// Cloning is cheap; the payload is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    name: String,
    content_type: String,
    data: Bytes,
}

impl SourceFile {
    /// Creates a source file from an in-memory payload.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Reads a file from disk, deriving the MIME type from its extension.
    pub async fn load(path: &Path) -> Result<Self, TransferError> {
        let name = file_name(path)?;
        let data = tokio::fs::read(path).await?;
        let content_type = detect_content_type(&name).unwrap_or(FALLBACK_CONTENT_TYPE);

        debug!(file = %name, size = data.len(), content_type, "loaded source file");

        Ok(Self::new(name, content_type, data))
    }

    /// Raw payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Metadata-only view of this file.
    pub fn info(&self) -> FileInfo {
        FileInfo {
            name: self.name.clone(),
            size: self.size(),
            content_type: self.content_type.clone(),
        }
    }
}

impl FileCandidate for SourceFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }
}

fn file_name(path: &Path) -> Result<String, TransferError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| TransferError::InvalidPath(path.display().to_string()))
}

/// Detects an image MIME type from a file extension (case-insensitive).
pub fn detect_content_type(path: &str) -> Option<&'static str> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        Some("svg") => Some("image/svg+xml"),
        _ => None,
    }
}
