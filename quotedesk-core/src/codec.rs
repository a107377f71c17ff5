//! Conversion between markdown-ish text and rendered surface markup
//!
//! The persisted form of a description is a small markdown dialect: `**bold**`,
//! `*italic*`, `__underline__`, `![alt](url)` and newlines. Editable surfaces
//! work on markup instead. Both directions are ordered chains of regex
//! substitutions; neither is a full parser, so anything outside the supported
//! constructs is passed through (encode) or stripped (decode).

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::config::{Config, ImageStyle};
use crate::image::ImageRef;
use crate::selection::{SavedSelection, SurfaceRange};
use crate::surface::{EditableSurface, SurfaceError};

struct Patterns {
    md_bold: Regex,
    md_italic: Regex,
    md_underline: Regex,
    md_image: Regex,

    strong: Regex,
    b: Regex,
    em: Regex,
    i: Regex,
    u: Regex,
    br: Regex,
    div_open: Regex,
    div_close: Regex,
    p_open: Regex,
    p_close: Regex,
    img_src_alt: Regex,
    img_alt_src: Regex,
    img_src_only: Regex,
    any_tag: Regex,
    blank_run: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("Invalid codec regex");
        Patterns {
            md_bold: re(r"\*\*(.*?)\*\*"),
            md_italic: re(r"\*(.*?)\*"),
            md_underline: re(r"__(.*?)__"),
            md_image: re(r"!\[([^\]]*)\]\(([^)]+)\)"),

            // Tag names end on a word boundary: `<b` must not match `<br>`,
            // `<i` must not match `<img>`, `<u` must not match `<ul>`.
            strong: re(r"(?i)<strong\b[^>]*>(.*?)</strong\s*>"),
            b: re(r"(?i)<b\b[^>]*>(.*?)</b\s*>"),
            em: re(r"(?i)<em\b[^>]*>(.*?)</em\s*>"),
            i: re(r"(?i)<i\b[^>]*>(.*?)</i\s*>"),
            u: re(r"(?i)<u\b[^>]*>(.*?)</u\s*>"),
            br: re(r"(?i)<br\b[^>]*>"),
            div_open: re(r"(?i)<div\b[^>]*>"),
            div_close: re(r"(?i)</div\s*>"),
            p_open: re(r"(?i)<p\b[^>]*>"),
            p_close: re(r"(?i)</p\s*>"),
            img_src_alt: re(r#"(?i)<img\b[^>]*\bsrc="([^"]*)"[^>]*\balt="([^"]*)"[^>]*>"#),
            img_alt_src: re(r#"(?i)<img\b[^>]*\balt="([^"]*)"[^>]*\bsrc="([^"]*)"[^>]*>"#),
            img_src_only: re(r#"(?i)<img\b[^>]*\bsrc="([^"]*)"[^>]*>"#),
            any_tag: re(r"<[^>]+>"),
            blank_run: re(r"\n{3,}"),
        }
    })
}

/// Where an inserted image ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Inserted at the restored cursor; the caret sits at this char offset
    AtCursor(usize),
    /// Appended to the end of the surface; the caret sits at this char offset
    Appended(usize),
}

/// Converts between markdown-ish text and rendered markup
#[derive(Debug, Clone, Default)]
pub struct RichTextCodec {
    image_style: ImageStyle,
}

impl RichTextCodec {
    pub fn new(image_style: ImageStyle) -> Self {
        Self { image_style }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.image.clone())
    }

    pub fn image_style(&self) -> &ImageStyle {
        &self.image_style
    }

    /// Rendered `<img>` element for an image reference
    pub fn image_markup(&self, image: &ImageRef) -> String {
        format!(
            r#"<img src="{}" alt="{}" style="{}" />"#,
            escape_attr(&image.url),
            escape_attr(&image.alt),
            self.image_style.css()
        )
    }

    /// Convert markdown-ish text into rendered markup
    pub fn encode(&self, markdown: &str) -> String {
        if markdown.is_empty() {
            return String::new();
        }

        let p = patterns();
        let text = p.md_bold.replace_all(markdown, "<strong>${1}</strong>");
        let text = p.md_italic.replace_all(&text, "<em>${1}</em>");
        let text = p.md_underline.replace_all(&text, "<u>${1}</u>");
        let text = p.md_image.replace_all(&text, |caps: &Captures| {
            self.image_markup(&ImageRef::new(&caps[1], &caps[2]))
        });

        text.replace('\n', "<br>")
    }

    /// Convert rendered markup back into markdown-ish text.
    ///
    /// Best effort: tags outside the supported set are removed, not escaped.
    pub fn decode(&self, rendered: &str) -> String {
        if rendered.is_empty() {
            return String::new();
        }

        let p = patterns();
        let steps: &[(&Regex, &str)] = &[
            (&p.strong, "**${1}**"),
            (&p.b, "**${1}**"),
            (&p.em, "*${1}*"),
            (&p.i, "*${1}*"),
            (&p.u, "__${1}__"),
            (&p.br, "\n"),
            (&p.div_open, "\n"),
            (&p.div_close, ""),
            (&p.p_open, ""),
            (&p.p_close, "\n\n"),
        ];
        // (pattern, src group, alt group)
        let images: &[(&Regex, usize, Option<usize>)] = &[
            (&p.img_src_alt, 1, Some(2)),
            (&p.img_alt_src, 2, Some(1)),
            (&p.img_src_only, 1, None),
        ];
        let cleanup: &[(&Regex, &str)] = &[(&p.any_tag, ""), (&p.blank_run, "\n\n")];

        let mut text = rendered.to_string();
        for (pattern, replacement) in steps {
            let replaced = pattern.replace_all(&text, *replacement).into_owned();
            text = replaced;
        }
        for &(pattern, src, alt) in images {
            let replaced = pattern
                .replace_all(&text, |caps: &Captures| {
                    let alt = alt.map_or("", |group| &caps[group]);
                    ImageRef::new(unescape_attr(alt), unescape_attr(&caps[src])).to_markdown()
                })
                .into_owned();
            text = replaced;
        }
        for (pattern, replacement) in cleanup {
            let replaced = pattern.replace_all(&text, *replacement).into_owned();
            text = replaced;
        }

        trim_document(&text).to_string()
    }

    /// Insert an image at a previously saved cursor position.
    ///
    /// Falls back to appending at the end of the surface when there is no
    /// saved position or it can no longer be restored. Never fails.
    pub fn insert_image_at_cursor<S: EditableSurface + ?Sized>(
        &self,
        surface: &mut S,
        saved: Option<&SavedSelection>,
        image: &ImageRef,
    ) -> Placement {
        let markup = self.image_markup(image);

        if let Some(saved) = saved {
            match surface.restore_selection(saved) {
                Ok(range) => match insert_in_range(surface, range, &markup) {
                    Ok(caret) => {
                        log::debug!("Inserted image at cursor, caret now at {}", caret);
                        return Placement::AtCursor(caret);
                    }
                    Err(err) => {
                        log::warn!("Image not inserted at cursor, appending to end: {}", err);
                    }
                },
                Err(err) => {
                    log::warn!("Range restoration failed, appending image to end: {}", err);
                }
            }
        }

        surface.append_markup(&markup);
        let caret = surface.append_markup(" ");
        if let Err(err) = surface.set_cursor(caret) {
            log::warn!("Could not place caret after appended image: {}", err);
        }
        Placement::Appended(caret)
    }
}

/// Replace `range` with the image markup and a trailing space.
///
/// Fails only while the image is not yet on the surface. Once it is, the
/// remaining steps are best effort so the image is never inserted twice.
fn insert_in_range<S: EditableSurface + ?Sized>(
    surface: &mut S,
    range: SurfaceRange,
    markup: &str,
) -> Result<usize, SurfaceError> {
    let at = surface.delete_contents(range)?;
    let after_image = surface.insert_markup(at, markup)?;

    let caret = match surface.insert_markup(after_image, " ") {
        Ok(after_space) => after_space,
        Err(err) => {
            log::warn!("Could not add space after image: {}", err);
            after_image
        }
    };
    if let Err(err) = surface.set_cursor(caret) {
        log::warn!("Could not place caret after image: {}", err);
    }
    Ok(caret)
}

/// Escape a value for a double-quoted attribute
fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape_attr(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn trim_document(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Encode with the default image style
pub fn encode_to_rendered(markdown: &str) -> String {
    RichTextCodec::default().encode(markdown)
}

/// Decode with the default codec
pub fn decode_from_rendered(rendered: &str) -> String {
    RichTextCodec::default().decode(rendered)
}

/// Collapse runs of blank lines and trim, the same cleanup `decode` applies
pub fn normalize_markdown(markdown: &str) -> String {
    let collapsed = patterns().blank_run.replace_all(markdown, "\n\n");
    trim_document(&collapsed).to_string()
}
