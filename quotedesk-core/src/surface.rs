//! Editable surface capability and a headless implementation
//!
//! A surface holds rendered markup plus a live selection, and knows how to
//! apply native formatting commands to that selection. Browser hosts implement
//! [`EditableSurface`] over a contenteditable element; [`MemorySurface`] keeps
//! the markup in a rope so editing behaviour can run without a renderer.

use regex::Regex;
use ropey::Rope;
use std::sync::OnceLock;
use thiserror::Error;

use crate::selection::{SavedSelection, SurfaceRange};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("no active selection")]
    NoSelection,

    #[error("saved selection is stale (saved at revision {saved}, surface at {current})")]
    Stale { saved: u64, current: u64 },

    #[error("offset {offset} is past the end of the surface ({len} chars)")]
    OutOfBounds { offset: usize, len: usize },

    #[error("offset {offset} falls inside a markup tag")]
    InsideMarkup { offset: usize },
}

/// Inline styles a toolbar can report as active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
}

impl InlineStyle {
    /// Tag names that carry this style; the first is the one a surface emits
    pub fn tag_names(&self) -> &'static [&'static str] {
        match self {
            InlineStyle::Bold => &["b", "strong"],
            InlineStyle::Italic => &["i", "em"],
            InlineStyle::Underline => &["u"],
        }
    }
}

/// Native formatting commands understood by a surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    UnorderedList,
    OrderedList,
    /// Legacy font size, 1 through 7
    FontSize(u8),
    ForeColor(String),
}

impl FormatCommand {
    pub fn inline_style(&self) -> Option<InlineStyle> {
        match self {
            FormatCommand::Bold => Some(InlineStyle::Bold),
            FormatCommand::Italic => Some(InlineStyle::Italic),
            FormatCommand::Underline => Some(InlineStyle::Underline),
            _ => None,
        }
    }
}

/// Host capability for a live editable surface.
///
/// Offsets are char offsets into the rendered markup returned by
/// [`inner_html`](EditableSurface::inner_html).
pub trait EditableSurface {
    fn inner_html(&self) -> String;

    /// Replace the whole content; drops the selection
    fn set_inner_html(&mut self, html: &str);

    fn selection(&self) -> Option<SurfaceRange>;

    /// Capture the current selection so it can be restored after an async step
    fn save_selection(&self) -> Option<SavedSelection>;

    /// Make a saved selection current again, failing if it no longer applies
    fn restore_selection(&mut self, saved: &SavedSelection) -> Result<SurfaceRange, SurfaceError>;

    /// Collapse the selection to a caret at `offset`
    fn set_cursor(&mut self, offset: usize) -> Result<(), SurfaceError>;

    /// Remove the selected content; returns the offset where it started
    fn delete_contents(&mut self, range: SurfaceRange) -> Result<usize, SurfaceError>;

    /// Insert markup at `at`; returns the offset just past the inserted markup
    fn insert_markup(&mut self, at: usize, markup: &str) -> Result<usize, SurfaceError>;

    /// Append markup to the end; returns the new end offset
    fn append_markup(&mut self, markup: &str) -> usize;

    /// Apply a formatting command to the current selection.
    ///
    /// Returns false, leaving the surface untouched, when there is nothing to
    /// apply it to.
    fn exec_command(&mut self, command: &FormatCommand) -> bool;

    /// Whether the selection start sits inside the given style
    fn query_command_state(&self, style: InlineStyle) -> bool;
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"(?i)<(/?)([a-z][a-z0-9]*)\b[^>]*>").expect("Invalid tag regex"))
}

/// In-memory surface backed by a rope.
///
/// Every content mutation bumps the revision, so selections saved before a
/// mutation are refused on restore.
#[derive(Clone, Debug, Default)]
pub struct MemorySurface {
    rope: Rope,
    selection: Option<SurfaceRange>,
    rev: u64,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_html(html: &str) -> Self {
        Self {
            rope: Rope::from_str(html),
            selection: None,
            rev: 1,
        }
    }

    pub fn revision(&self) -> u64 {
        self.rev
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Set the selection, as a user dragging or clicking would
    pub fn select(&mut self, range: SurfaceRange) -> Result<(), SurfaceError> {
        self.check_range(range)?;
        self.selection = Some(range);
        Ok(())
    }

    /// Type text over the current selection, leaving the caret after it
    pub fn type_text(&mut self, text: &str) -> Result<usize, SurfaceError> {
        let range = self.selection.ok_or(SurfaceError::NoSelection)?;
        let at = self.delete_contents(range)?;
        let end = self.insert_markup(at, text)?;
        self.selection = Some(SurfaceRange::caret(end));
        Ok(end)
    }

    /// Markup between two char offsets, clamped to the content
    pub fn slice(&self, start: usize, end: usize) -> String {
        let len = self.rope.len_chars();
        let end = end.min(len);
        let start = start.min(end);
        self.rope.slice(start..end).to_string()
    }

    fn touch(&mut self) {
        self.rev += 1;
    }

    fn check_offset(&self, offset: usize) -> Result<(), SurfaceError> {
        let len = self.rope.len_chars();
        if offset > len {
            return Err(SurfaceError::OutOfBounds { offset, len });
        }
        if self.inside_markup(offset) {
            return Err(SurfaceError::InsideMarkup { offset });
        }
        Ok(())
    }

    fn check_range(&self, range: SurfaceRange) -> Result<(usize, usize), SurfaceError> {
        let (start, end) = range.range();
        self.check_offset(start)?;
        self.check_offset(end)?;
        Ok((start, end))
    }

    /// An offset is inside markup when it falls strictly within a tag.
    ///
    /// A bare `<` in text, as in `a < b`, does not open a tag.
    fn inside_markup(&self, offset: usize) -> bool {
        let html = self.rope.to_string();
        let byte = self.rope.char_to_byte(offset);
        tag_pattern()
            .find_iter(&html)
            .take_while(|m| m.start() < byte)
            .any(|m| byte < m.end())
    }

    fn wrap(&mut self, start: usize, end: usize, open: &str, close: &str) -> bool {
        let open_len = open.chars().count();
        self.rope.insert(end, close);
        self.rope.insert(start, open);
        self.selection = Some(SurfaceRange::new(start + open_len, end + open_len));
        self.touch();
        true
    }

    fn toggle_inline(&mut self, start: usize, end: usize, style: InlineStyle) -> bool {
        let len = self.rope.len_chars();
        for name in style.tag_names() {
            let open = format!("<{}>", name);
            let close = format!("</{}>", name);
            let open_len = open.chars().count();
            let close_len = close.chars().count();

            let wrapped = start >= open_len
                && end + close_len <= len
                && self.slice(start - open_len, start).eq_ignore_ascii_case(&open)
                && self.slice(end, end + close_len).eq_ignore_ascii_case(&close);

            if wrapped {
                self.rope.remove(end..end + close_len);
                self.rope.remove(start - open_len..start);
                self.selection = Some(SurfaceRange::new(start - open_len, end - open_len));
                self.touch();
                return true;
            }
        }

        let name = style.tag_names()[0];
        self.wrap(start, end, &format!("<{}>", name), &format!("</{}>", name))
    }
}

impl EditableSurface for MemorySurface {
    fn inner_html(&self) -> String {
        self.rope.to_string()
    }

    fn set_inner_html(&mut self, html: &str) {
        self.rope = Rope::from_str(html);
        self.selection = None;
        self.touch();
    }

    fn selection(&self) -> Option<SurfaceRange> {
        self.selection
    }

    fn save_selection(&self) -> Option<SavedSelection> {
        self.selection.map(|range| SavedSelection {
            range,
            revision: self.rev,
        })
    }

    fn restore_selection(&mut self, saved: &SavedSelection) -> Result<SurfaceRange, SurfaceError> {
        if saved.revision != self.rev {
            return Err(SurfaceError::Stale {
                saved: saved.revision,
                current: self.rev,
            });
        }
        self.check_range(saved.range)?;
        self.selection = Some(saved.range);
        Ok(saved.range)
    }

    fn set_cursor(&mut self, offset: usize) -> Result<(), SurfaceError> {
        self.check_offset(offset)?;
        self.selection = Some(SurfaceRange::caret(offset));
        Ok(())
    }

    fn delete_contents(&mut self, range: SurfaceRange) -> Result<usize, SurfaceError> {
        let (start, end) = self.check_range(range)?;
        if start < end {
            self.rope.remove(start..end);
            self.touch();
        }
        self.selection = Some(SurfaceRange::caret(start));
        Ok(start)
    }

    fn insert_markup(&mut self, at: usize, markup: &str) -> Result<usize, SurfaceError> {
        self.check_offset(at)?;
        self.rope.insert(at, markup);
        self.touch();
        Ok(at + markup.chars().count())
    }

    fn append_markup(&mut self, markup: &str) -> usize {
        let end = self.rope.len_chars();
        self.rope.insert(end, markup);
        self.touch();
        end + markup.chars().count()
    }

    fn exec_command(&mut self, command: &FormatCommand) -> bool {
        let Some(range) = self.selection else {
            return false;
        };
        if range.is_collapsed() {
            return false;
        }
        let Ok((start, end)) = self.check_range(range) else {
            return false;
        };

        match command {
            FormatCommand::Bold | FormatCommand::Italic | FormatCommand::Underline => {
                match command.inline_style() {
                    Some(style) => self.toggle_inline(start, end, style),
                    None => false,
                }
            }
            FormatCommand::UnorderedList => self.wrap(start, end, "<ul><li>", "</li></ul>"),
            FormatCommand::OrderedList => self.wrap(start, end, "<ol><li>", "</li></ol>"),
            FormatCommand::FontSize(size) if (1..=7).contains(size) => {
                self.wrap(start, end, &format!("<font size=\"{}\">", size), "</font>")
            }
            FormatCommand::ForeColor(color)
                if !color.trim().is_empty() && !color.contains(['"', '<', '>']) =>
            {
                self.wrap(start, end, &format!("<font color=\"{}\">", color), "</font>")
            }
            _ => false,
        }
    }

    fn query_command_state(&self, style: InlineStyle) -> bool {
        let Some(range) = self.selection else {
            return false;
        };
        let (start, _) = range.range();
        let prefix = self.slice(0, start);

        let mut depth: i64 = 0;
        for caps in tag_pattern().captures_iter(&prefix) {
            let name = caps[2].to_ascii_lowercase();
            if !style.tag_names().contains(&name.as_str()) {
                continue;
            }
            if caps[1].is_empty() {
                depth += 1;
            } else {
                depth -= 1;
            }
        }
        depth > 0
    }
}
