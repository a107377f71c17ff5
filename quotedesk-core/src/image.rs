//! Image references and upload candidates

use crate::upload::UploadError;

/// An image embedded in a document: `![alt](url)`
///
/// The URL points at bytes owned by the storage backend; the reference itself
/// owns nothing but the two strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Alt text
    pub alt: String,
    /// Image source URL
    pub url: String,
}

impl ImageRef {
    /// Create a new image reference
    pub fn new(alt: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            alt: alt.into(),
            url: url.into(),
        }
    }

    /// Markdown-ish form of the reference
    pub fn to_markdown(&self) -> String {
        format!("![{}]({})", self.alt, self.url)
    }
}

/// A file picked by the user for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Original file name, used as alt text once inserted
    pub name: String,
    /// MIME type reported by the host
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Text after the last '.', or the whole name when there is none
    pub fn extension(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Storage path for this file, named after the upload time
    pub fn storage_path(&self, unix_millis: u128) -> String {
        format!("{}.{}", unix_millis, self.extension())
    }

    /// Check the file against the upload policy before any bytes leave the host
    pub fn check_policy(&self, accept_prefix: &str, max_bytes: u64) -> Result<(), UploadError> {
        if !self.content_type.starts_with(accept_prefix) {
            return Err(UploadError::InvalidType {
                content_type: self.content_type.clone(),
            });
        }

        if self.size() > max_bytes {
            return Err(UploadError::TooLarge {
                size: self.size(),
                max_bytes,
            });
        }

        Ok(())
    }
}
