//! Quotedesk Core - rich-text codec and editing session
//!
//! This crate contains the description-editing logic of quotedesk, independent
//! of any rendering host:
//! - Markdown-ish <-> rendered markup conversion
//! - Editable surface capability with a headless rope-backed implementation
//! - Editing session (toolbar commands, shortcuts, image upload and insertion)
//! - Configuration management

pub mod codec;
pub mod config;
pub mod editor;
pub mod image;
pub mod notify;
pub mod selection;
pub mod surface;
pub mod upload;

// Re-export commonly used types
pub use codec::{decode_from_rendered, encode_to_rendered, Placement, RichTextCodec};
pub use config::Config;
pub use editor::RichTextEditor;
pub use image::{ImageFile, ImageRef};
pub use notify::{Notification, Notifier};
pub use selection::{SavedSelection, SurfaceRange};
pub use surface::{EditableSurface, FormatCommand, MemorySurface};
pub use upload::{ImageStore, UploadError};
