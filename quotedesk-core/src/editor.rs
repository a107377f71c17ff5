//! Rich-text editing session
//!
//! Owns an editable surface and the markdown-ish value it represents, and keeps
//! the two in sync as the user types, formats and inserts images.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::codec::{Placement, RichTextCodec};
use crate::config::{Config, EditorConfig, UploadConfig};
use crate::image::{ImageFile, ImageRef};
use crate::notify::{Notification, Notifier};
use crate::surface::{EditableSurface, FormatCommand, InlineStyle};
use crate::upload::{ImageStore, PendingUpload, UploadError};

/// Active inline styles at the cursor, for highlighting toolbar buttons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolbarState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        meta: false,
    };
    pub const META: Modifiers = Modifiers {
        ctrl: false,
        meta: true,
    };
}

/// What the host should do with a key event after the session has seen it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// The session handled the key; suppress the host's default behaviour
    PreventDefault,
    /// Let the host apply its default, then call `handle_input`
    SyncAfterDefault,
    /// Not ours
    Default,
}

/// Formatting shortcut bound to a key chord, if any
pub fn shortcut_command(key: Key, modifiers: Modifiers) -> Option<FormatCommand> {
    if !(modifiers.ctrl || modifiers.meta) {
        return None;
    }
    match key {
        Key::Char('b') => Some(FormatCommand::Bold),
        Key::Char('i') => Some(FormatCommand::Italic),
        Key::Char('u') => Some(FormatCommand::Underline),
        _ => None,
    }
}

type ChangeCallback = Box<dyn FnMut(&str)>;

pub struct RichTextEditor<S: EditableSurface> {
    surface: S,
    codec: RichTextCodec,
    upload: UploadConfig,
    editor: EditorConfig,
    value: String,
    toolbar: ToolbarState,
    uploading: bool,
    on_change: Option<ChangeCallback>,
}

impl<S: EditableSurface> RichTextEditor<S> {
    /// Start a session, rendering `value` onto the surface
    pub fn new(surface: S, codec: RichTextCodec, upload: UploadConfig, value: impl Into<String>) -> Self {
        let mut editor = Self {
            surface,
            codec,
            upload,
            editor: EditorConfig::default(),
            value: String::new(),
            toolbar: ToolbarState::default(),
            uploading: false,
            on_change: None,
        };
        editor.set_value(value);
        editor
    }

    pub fn from_config(surface: S, config: &Config, value: impl Into<String>) -> Self {
        let mut editor = Self::new(
            surface,
            RichTextCodec::from_config(config),
            config.upload.clone(),
            value,
        );
        editor.editor = config.editor.clone();
        editor
    }

    /// Register the callback invoked whenever the markdown-ish value changes
    pub fn with_on_change(mut self, on_change: impl FnMut(&str) + 'static) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn codec(&self) -> &RichTextCodec {
        &self.codec
    }

    pub fn toolbar_state(&self) -> ToolbarState {
        self.toolbar
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn show_placeholder(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Placeholder text, when the value is blank
    pub fn placeholder(&self) -> Option<&str> {
        self.show_placeholder()
            .then_some(self.editor.placeholder.as_str())
    }

    /// Visible height of the surface in text rows
    pub fn rows(&self) -> u16 {
        self.editor.rows
    }

    /// Colours offered by the colour picker
    pub fn palette(&self) -> &[String] {
        &self.editor.palette
    }

    fn in_palette(&self, color: &str) -> bool {
        self.editor
            .palette
            .iter()
            .any(|c| c.eq_ignore_ascii_case(color.trim()))
    }

    /// Accept a value from outside the session.
    ///
    /// The surface is only rewritten when its markup differs from the encoded
    /// value, so an unchanged value keeps the user's selection intact.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        let html = self.codec.encode(&self.value);
        if self.surface.inner_html() != html {
            self.surface.set_inner_html(&html);
        }
    }

    /// Pull the surface content back into the value.
    ///
    /// Returns true and notifies `on_change` when the value changed.
    pub fn handle_input(&mut self) -> bool {
        let markdown = self.codec.decode(&self.surface.inner_html());
        if markdown == self.value {
            return false;
        }

        self.value = markdown;
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(&self.value);
        }
        true
    }

    pub fn handle_key(&mut self, key: Key, modifiers: Modifiers) -> KeyAction {
        if key == Key::Enter {
            return KeyAction::SyncAfterDefault;
        }

        match shortcut_command(key, modifiers) {
            Some(command) => {
                self.toolbar_command(command);
                KeyAction::PreventDefault
            }
            None => KeyAction::Default,
        }
    }

    pub fn update_toolbar_state(&mut self) {
        self.toolbar = ToolbarState {
            bold: self.surface.query_command_state(InlineStyle::Bold),
            italic: self.surface.query_command_state(InlineStyle::Italic),
            underline: self.surface.query_command_state(InlineStyle::Underline),
        };
    }

    /// Apply a toolbar command to the selection and sync the value.
    ///
    /// Colours outside the configured palette are refused.
    pub fn toolbar_command(&mut self, command: FormatCommand) {
        if let FormatCommand::ForeColor(color) = &command {
            if !self.in_palette(color) {
                log::debug!("Colour {} is not in the palette", color);
                return;
            }
        }

        if !self.surface.exec_command(&command) {
            log::debug!("{:?} not applied to the current selection", command);
        }
        if command.inline_style().is_some() {
            self.update_toolbar_state();
        }
        self.handle_input();
    }

    /// Validate a picked file and capture the cursor ahead of the upload.
    ///
    /// Rejected files produce a notification and no pending upload.
    pub fn begin_image_upload(
        &mut self,
        file: &ImageFile,
        notifier: &mut impl Notifier,
    ) -> Option<PendingUpload> {
        if self.uploading {
            log::debug!("Upload already in progress, ignoring {}", file.name);
            return None;
        }

        if let Err(err) = file.check_policy(&self.upload.accept_prefix, self.upload.max_bytes) {
            log::info!("Rejected image {}: {}", file.name, err);
            notifier.notify(self.upload_notice(&err));
            return None;
        }

        let unix_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        self.uploading = true;
        Some(PendingUpload {
            bucket: self.upload.bucket.clone(),
            path: file.storage_path(unix_millis),
            alt: file.name.clone(),
            saved_selection: self.surface.save_selection(),
        })
    }

    /// Complete an upload started with [`begin_image_upload`](Self::begin_image_upload).
    ///
    /// On success the image goes in at the saved cursor (or the end of the
    /// surface) and the value is synced. On failure the document is left
    /// untouched.
    pub fn finish_image_upload(
        &mut self,
        pending: PendingUpload,
        result: Result<String, UploadError>,
        notifier: &mut impl Notifier,
    ) -> Option<Placement> {
        self.uploading = false;

        match result {
            Ok(url) => {
                let image = ImageRef::new(pending.alt, url);
                let placement = self.codec.insert_image_at_cursor(
                    &mut self.surface,
                    pending.saved_selection.as_ref(),
                    &image,
                );
                self.handle_input();
                notifier.notify(Notification::info(
                    "Success",
                    "Image uploaded and inserted successfully",
                ));
                Some(placement)
            }
            Err(err) => {
                log::error!("Error uploading image: {}", err);
                notifier.notify(self.upload_notice(&err));
                None
            }
        }
    }

    /// Validate, upload and insert an image in one blocking call
    pub fn upload_image(
        &mut self,
        file: &ImageFile,
        store: &mut impl ImageStore,
        notifier: &mut impl Notifier,
    ) -> Option<Placement> {
        let pending = self.begin_image_upload(file, notifier)?;
        let result = store
            .upload(&pending.bucket, &pending.path, &file.bytes)
            .map(|()| store.public_url(&pending.bucket, &pending.path))
            .map_err(UploadError::from);
        self.finish_image_upload(pending, result, notifier)
    }

    fn upload_notice(&self, err: &UploadError) -> Notification {
        match err {
            UploadError::InvalidType { .. } => {
                Notification::destructive("Invalid file type", "Please select an image file")
            }
            UploadError::TooLarge { .. } => Notification::destructive(
                "File too large",
                format!(
                    "Please select an image smaller than {}",
                    self.upload.max_size_label()
                ),
            ),
            UploadError::Storage(_) => Notification::destructive("Error", "Failed to upload image"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationVariant;
    use crate::selection::SurfaceRange;
    use crate::surface::MemorySurface;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor(value: &str) -> RichTextEditor<MemorySurface> {
        RichTextEditor::new(
            MemorySurface::new(),
            RichTextCodec::default(),
            UploadConfig::default(),
            value,
        )
    }

    fn recording(value: &str) -> (RichTextEditor<MemorySurface>, Rc<RefCell<Vec<String>>>) {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        let editor = editor(value).with_on_change(move |v| sink.borrow_mut().push(v.to_string()));
        (editor, changes)
    }

    #[test]
    fn test_new_renders_value() {
        let editor = editor("**hi**\nthere");
        assert_eq!(editor.surface().inner_html(), "<strong>hi</strong><br>there");
        assert_eq!(editor.value(), "**hi**\nthere");
    }

    #[test]
    fn test_set_value_keeps_surface_when_markup_matches() {
        let mut editor = editor("plain");
        editor.surface_mut().set_cursor(3).unwrap();
        let rev = editor.surface().revision();

        editor.set_value("plain");
        assert_eq!(editor.surface().revision(), rev);
        assert_eq!(editor.surface().selection(), Some(SurfaceRange::caret(3)));

        editor.set_value("changed");
        assert_eq!(editor.surface().inner_html(), "changed");
    }

    #[test]
    fn test_handle_input_notifies_on_change() {
        let (mut editor, changes) = recording("abc");
        editor.surface_mut().set_cursor(3).unwrap();
        editor.surface_mut().type_text("<b>d</b>").unwrap();

        assert!(editor.handle_input());
        assert_eq!(editor.value(), "abc**d**");
        assert_eq!(*changes.borrow(), vec!["abc**d**".to_string()]);

        // No change, no callback
        assert!(!editor.handle_input());
        assert_eq!(changes.borrow().len(), 1);
    }

    #[test]
    fn test_placeholder() {
        let editor = RichTextEditor::from_config(MemorySurface::new(), &Config::default(), "  ");
        assert!(editor.show_placeholder());
        assert_eq!(editor.placeholder(), Some("Enter description..."));

        let editor = RichTextEditor::from_config(MemorySurface::new(), &Config::default(), "x");
        assert_eq!(editor.placeholder(), None);
    }

    #[test]
    fn test_rows_and_palette_from_config() {
        let mut config = Config::default();
        config.editor.rows = 10;
        config.editor.palette = vec!["#112233".to_string()];

        let editor = RichTextEditor::from_config(MemorySurface::new(), &config, "");
        assert_eq!(editor.rows(), 10);
        assert_eq!(editor.palette().to_vec(), vec!["#112233".to_string()]);

        let editor = self::editor("");
        assert_eq!(editor.rows(), 6);
        assert_eq!(editor.palette().len(), 12);
    }

    #[test]
    fn test_fore_color_must_come_from_palette() {
        let mut editor = editor("red text");
        editor.surface_mut().select(SurfaceRange::new(0, 3)).unwrap();

        editor.toolbar_command(FormatCommand::ForeColor("#123456".to_string()));
        assert_eq!(editor.surface().inner_html(), "red text");

        editor.toolbar_command(FormatCommand::ForeColor("#dc2626".to_string()));
        assert_eq!(
            editor.surface().inner_html(),
            "<font color=\"#dc2626\">red</font> text"
        );
    }

    #[test]
    fn test_finish_upload_keeps_quoted_file_name() {
        let mut editor = editor("");
        let mut notes: Vec<Notification> = Vec::new();
        let file = ImageFile::new(r#"rack "B".png"#, "image/png", vec![1]);
        let pending = editor.begin_image_upload(&file, &mut notes).unwrap();

        editor.finish_image_upload(pending, Ok("http://x/r.png".to_string()), &mut notes);

        assert_eq!(editor.value(), r#"![rack "B".png](http://x/r.png)"#);
    }

    #[test]
    fn test_shortcut_mapping() {
        assert_eq!(
            shortcut_command(Key::Char('b'), Modifiers::CTRL),
            Some(FormatCommand::Bold)
        );
        assert_eq!(
            shortcut_command(Key::Char('i'), Modifiers::META),
            Some(FormatCommand::Italic)
        );
        assert_eq!(
            shortcut_command(Key::Char('u'), Modifiers::CTRL),
            Some(FormatCommand::Underline)
        );
        assert_eq!(shortcut_command(Key::Char('b'), Modifiers::NONE), None);
        assert_eq!(shortcut_command(Key::Char('x'), Modifiers::CTRL), None);
    }

    #[test]
    fn test_handle_key_enter_defers_sync() {
        let mut editor = editor("a");
        assert_eq!(
            editor.handle_key(Key::Enter, Modifiers::NONE),
            KeyAction::SyncAfterDefault
        );
        assert_eq!(
            editor.handle_key(Key::Char('a'), Modifiers::NONE),
            KeyAction::Default
        );
    }

    #[test]
    fn test_ctrl_b_bolds_selection_and_syncs() {
        let (mut editor, changes) = recording("make this bold");
        editor
            .surface_mut()
            .select(SurfaceRange::new(5, 9))
            .unwrap();

        let action = editor.handle_key(Key::Char('b'), Modifiers::CTRL);

        assert_eq!(action, KeyAction::PreventDefault);
        assert_eq!(editor.value(), "make **this** bold");
        assert!(editor.toolbar_state().bold);
        assert_eq!(changes.borrow().len(), 1);
    }

    #[test]
    fn test_toolbar_command_without_selection_is_silent() {
        let (mut editor, changes) = recording("text");
        editor.toolbar_command(FormatCommand::Italic);
        assert_eq!(editor.value(), "text");
        assert!(changes.borrow().is_empty());
        assert_eq!(editor.toolbar_state(), ToolbarState::default());
    }

    #[test]
    fn test_list_command_flattens_on_decode() {
        let mut editor = editor("one");
        editor.surface_mut().select(SurfaceRange::new(0, 3)).unwrap();
        editor.toolbar_command(FormatCommand::UnorderedList);
        assert_eq!(editor.surface().inner_html(), "<ul><li>one</li></ul>");
        assert_eq!(editor.value(), "one");
    }

    #[test]
    fn test_begin_upload_rejects_non_image() {
        let mut editor = editor("");
        let mut notes: Vec<Notification> = Vec::new();
        let file = ImageFile::new("quote.pdf", "application/pdf", vec![1]);

        assert!(editor.begin_image_upload(&file, &mut notes).is_none());
        assert!(!editor.is_uploading());
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Invalid file type");
        assert_eq!(notes[0].variant, NotificationVariant::Destructive);
    }

    #[test]
    fn test_begin_upload_rejects_oversize() {
        let mut editor = editor("");
        let mut notes: Vec<Notification> = Vec::new();
        let file = ImageFile::new("big.png", "image/png", vec![0; 5 * 1024 * 1024 + 1]);

        assert!(editor.begin_image_upload(&file, &mut notes).is_none());
        assert_eq!(notes[0].title, "File too large");
        assert_eq!(notes[0].description, "Please select an image smaller than 5MB");
    }

    #[test]
    fn test_begin_upload_captures_cursor() {
        let mut editor = editor("hello");
        editor.surface_mut().set_cursor(2).unwrap();
        let mut notes: Vec<Notification> = Vec::new();
        let file = ImageFile::new("site.png", "image/png", vec![1, 2]);

        let pending = editor.begin_image_upload(&file, &mut notes).unwrap();

        assert!(editor.is_uploading());
        assert!(notes.is_empty());
        assert_eq!(pending.bucket, "quote-item-images");
        assert!(pending.path.ends_with(".png"));
        assert_eq!(pending.alt, "site.png");
        assert_eq!(
            pending.saved_selection.map(|s| s.range),
            Some(SurfaceRange::caret(2))
        );

        // A second pick while uploading is ignored
        assert!(editor.begin_image_upload(&file, &mut notes).is_none());
    }

    #[test]
    fn test_finish_upload_failure_leaves_document() {
        let (mut editor, changes) = recording("hello");
        let mut notes: Vec<Notification> = Vec::new();
        let file = ImageFile::new("site.png", "image/png", vec![1]);
        let pending = editor.begin_image_upload(&file, &mut notes).unwrap();

        let err = crate::upload::StorageError::new("quote-item-images", "x.png", "denied");
        let placement = editor.finish_image_upload(pending, Err(err.into()), &mut notes);

        assert_eq!(placement, None);
        assert!(!editor.is_uploading());
        assert_eq!(editor.value(), "hello");
        assert_eq!(editor.surface().inner_html(), "hello");
        assert!(changes.borrow().is_empty());
        assert_eq!(notes.last().map(|n| n.description.as_str()), Some("Failed to upload image"));
    }

    #[test]
    fn test_finish_upload_inserts_at_cursor() {
        let (mut editor, changes) = recording("ab");
        editor.surface_mut().set_cursor(1).unwrap();
        let mut notes: Vec<Notification> = Vec::new();
        let file = ImageFile::new("cat.png", "image/png", vec![1]);
        let pending = editor.begin_image_upload(&file, &mut notes).unwrap();

        let placement =
            editor.finish_image_upload(pending, Ok("http://x/cat.png".to_string()), &mut notes);

        assert!(matches!(placement, Some(Placement::AtCursor(_))));
        assert_eq!(editor.value(), "a![cat.png](http://x/cat.png) b");
        assert_eq!(*changes.borrow(), vec!["a![cat.png](http://x/cat.png) b".to_string()]);
        assert_eq!(notes.last().map(|n| n.title.as_str()), Some("Success"));
    }
}
