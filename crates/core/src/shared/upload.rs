use std::path::Path;

use crate::shared::constants::{DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE};
use crate::shared::error::FaceSwapError;

/// Format and size limits applied to an uploaded source image before decoding.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadLimits {
    pub max_file_size: usize,
    /// Lowercase, dot-prefixed (".jpg").
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

/// Checks the uploaded file name's extension and the payload size.
///
/// A missing file name is accepted; the payload still has to decode later.
pub fn validate_upload(
    filename: Option<&str>,
    bytes: &[u8],
    limits: &UploadLimits,
) -> Result<(), FaceSwapError> {
    if let Some(name) = filename {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        if !limits.allowed_extensions.iter().any(|a| *a == ext) {
            return Err(FaceSwapError::InvalidImage(format!(
                "Invalid file type. Allowed: {}",
                limits.allowed_extensions.join(", ")
            )));
        }
    }

    if bytes.is_empty() {
        return Err(FaceSwapError::InvalidImage("Uploaded file is empty".into()));
    }

    if bytes.len() > limits.max_file_size {
        return Err(FaceSwapError::InvalidImage(format!(
            "File too large. Max size: {}MB",
            limits.max_file_size / (1024 * 1024)
        )));
    }

    Ok(())
}
