//! Image upload collaborator and in-flight upload state

use thiserror::Error;

use crate::selection::SavedSelection;

/// Storage backend rejected or failed an upload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("upload to {bucket}/{path} failed: {reason}")]
pub struct StorageError {
    pub bucket: String,
    pub path: String,
    pub reason: String,
}

impl StorageError {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("unsupported content type {content_type:?}")]
    InvalidType { content_type: String },

    #[error("file is {size} bytes, limit is {max_bytes}")]
    TooLarge { size: u64, max_bytes: u64 },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Object storage that accepts uploaded images and serves them by URL
pub trait ImageStore {
    /// Store `bytes` under `path` in `bucket`
    fn upload(&mut self, bucket: &str, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Publicly resolvable URL for a stored path
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// An upload that passed validation and is waiting on the storage backend.
///
/// Holds the cursor captured before the upload started, so the image lands
/// where the user was when they picked the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub bucket: String,
    pub path: String,
    /// Alt text for the inserted image (the original file name)
    pub alt: String,
    pub saved_selection: Option<SavedSelection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::new("quote-item-images", "1.png", "quota exceeded");
        assert_eq!(
            err.to_string(),
            "upload to quote-item-images/1.png failed: quota exceeded"
        );
    }

    #[test]
    fn test_upload_error_from_storage() {
        let err: UploadError = StorageError::new("b", "p", "denied").into();
        assert!(matches!(err, UploadError::Storage(_)));
        assert_eq!(err.to_string(), "upload to b/p failed: denied");
    }
}
