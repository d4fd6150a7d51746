use crate::MIB;
use crate::types::FileCandidate;

/// MIME types accepted when no explicit list is configured.
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

/// Limits applied to a dropped batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Per-file ceiling in bytes.
    pub max_file_size_bytes: u64,
    /// Ceiling across already accepted plus incoming files.
    pub max_file_count: usize,
    pub allowed_mime_types: Vec<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 5 * MIB,
            max_file_count: 5,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Outcome of validating one file or a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validates a single file against the type and size limits.
pub fn validate_file<F: FileCandidate + ?Sized>(
    file: &F,
    options: &ValidationOptions,
) -> ValidationResult {
    let mut errors = Vec::new();
    collect_file_errors(file, options, &mut errors);
    ValidationResult::from_errors(errors)
}

/// Validates a dropped batch.
///
/// Every violation across the whole batch is reported; the batch is only
/// valid when the error list is empty.
pub fn validate_batch<F: FileCandidate>(
    files: &[F],
    current_count: usize,
    options: &ValidationOptions,
) -> ValidationResult {
    let mut errors = Vec::new();

    if current_count.saturating_add(files.len()) > options.max_file_count {
        errors.push(format!("Maximum {} files allowed", options.max_file_count));
    }

    for file in files {
        collect_file_errors(file, options, &mut errors);
    }

    ValidationResult::from_errors(errors)
}

fn collect_file_errors<F: FileCandidate + ?Sized>(
    file: &F,
    options: &ValidationOptions,
    errors: &mut Vec<String>,
) {
    if !options
        .allowed_mime_types
        .iter()
        .any(|t| t == file.content_type())
    {
        errors.push(format!("{}: Only image files are allowed", file.name()));
    }

    if file.size() > options.max_file_size_bytes {
        let max_mb = options.max_file_size_bytes as f64 / MIB as f64;
        errors.push(format!(
            "{}: File size must be under {max_mb}MB",
            file.name()
        ));
    }
}

/// Formats a byte count for display (`"0 Bytes"`, `"1.5 KB"`, `"5 MB"`).
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
