//! Content-stream construction for one overlay page.
//!
//! The canvas emits raw PDF operators via `lopdf::content::Operation`. Text
//! state changes (`Tf`, `rg`) are emitted only when they differ from the
//! current state, and text is encoded as WinAnsi with `?` standing in for
//! characters outside the Latin-1 range.

use crate::error::OverlayError;
use formfill_template::{DEFAULT_FONT, TextStyle};
use formfill_types::{Color, PointPos};
use lopdf::StringFormat;
use lopdf::content::{Content, Operation};
use std::collections::BTreeMap;

/// The PDF base-14 font names the overlay can reference without embedding.
const BASE14_FONTS: &[&str] = &[
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
    "Times-Roman",
    "Times-Bold",
    "Times-Italic",
    "Times-BoldItalic",
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
    "Symbol",
    "ZapfDingbats",
];

/// Clamps a configured font name to the base-14 set; unknown names resolve
/// to Helvetica rather than failing the render.
pub fn normalize_font(name: &str) -> &'static str {
    BASE14_FONTS
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(name))
        .copied()
        .unwrap_or(DEFAULT_FONT)
}

/// Assigns stable internal resource names (`OF1`, `OF2`, ...) to the base-14
/// fonts an overlay document uses. Shared by all pages of one overlay so the
/// merger can register each font once.
#[derive(Debug, Default)]
pub struct FontBook {
    by_base_font: BTreeMap<&'static str, String>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Internal name for a (possibly unnormalized) font name.
    pub fn internal_name(&mut self, font: &str) -> String {
        let base = normalize_font(font);
        let next = format!("OF{}", self.by_base_font.len() + 1);
        self.by_base_font.entry(base).or_insert(next).clone()
    }

    /// `(internal name, base font)` pairs for resource registration.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_base_font.iter().map(|(base, internal)| (internal.as_str(), *base))
    }

    pub fn is_empty(&self) -> bool {
        self.by_base_font.is_empty()
    }
}

#[derive(Default, Clone, PartialEq)]
struct TextState {
    font_name: String,
    font_size: f32,
    fill_color: Option<Color>,
}

/// Operator builder for a single overlay page.
pub struct PageCanvas<'book> {
    ops: Vec<Operation>,
    state: TextState,
    fonts: &'book mut FontBook,
}

impl<'book> PageCanvas<'book> {
    pub fn new(fonts: &'book mut FontBook) -> Self {
        Self { ops: Vec::new(), state: TextState::default(), fonts }
    }

    /// Draws `text` with its baseline starting at `at` (point space).
    pub fn draw_text(&mut self, style: &TextStyle, at: PointPos, text: &str) {
        if text.is_empty() {
            return;
        }
        self.ops.push(Operation::new("BT", vec![]));
        self.set_font(style);
        self.set_fill_color(style.color);
        self.ops
            .push(Operation::new("Td", vec![at.x.into(), at.y.into()]));
        self.ops.push(Operation::new(
            "Tj",
            vec![lopdf::Object::String(to_win_ansi(text), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    /// Strokes an empty rectangle, `(x, y)` being its lower-left corner.
    pub fn stroke_rect(&mut self, color: Color, line_width: f32, x: f32, y: f32, w: f32, h: f32) {
        let (r, g, b) = color.to_unit_rgb();
        self.ops.push(Operation::new("q", vec![]));
        self.ops
            .push(Operation::new("RG", vec![r.into(), g.into(), b.into()]));
        self.ops.push(Operation::new("w", vec![line_width.into()]));
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), w.into(), h.into()],
        ));
        self.ops.push(Operation::new("S", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    /// Places a previously registered image XObject into the box with
    /// lower-left corner `(x, y)`.
    pub fn place_image(&mut self, resource_name: &str, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
        ));
        self.ops.push(Operation::new(
            "Do",
            vec![lopdf::Object::Name(resource_name.as_bytes().to_vec())],
        ));
        self.ops.push(Operation::new("Q", vec![]));
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Encodes the collected operators into content-stream bytes.
    pub fn into_content(self) -> Result<Vec<u8>, OverlayError> {
        let content = Content { operations: self.ops };
        Ok(content.encode()?)
    }

    fn set_font(&mut self, style: &TextStyle) {
        let internal = self.fonts.internal_name(&style.font);
        if self.state.font_name != internal || self.state.font_size != style.size {
            self.ops.push(Operation::new(
                "Tf",
                vec![
                    lopdf::Object::Name(internal.as_bytes().to_vec()),
                    style.size.into(),
                ],
            ));
            self.state.font_name = internal;
            self.state.font_size = style.size;
        }
    }

    fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color != Some(color) {
            let (r, g, b) = color.to_unit_rgb();
            self.ops
                .push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
            self.state.fill_color = Some(color);
        }
    }
}

fn to_win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| if c as u32 <= 255 { c as u8 } else { b'?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_font_normalizes_to_helvetica() {
        assert_eq!(normalize_font("Comic Sans"), "Helvetica");
        assert_eq!(normalize_font("courier-bold"), "Courier-Bold");
    }

    #[test]
    fn font_book_assigns_stable_names() {
        let mut book = FontBook::new();
        let a = book.internal_name("Helvetica");
        let b = book.internal_name("Courier");
        let again = book.internal_name("helvetica");
        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(book.entries().count(), 2);
    }

    #[test]
    fn text_state_is_deduplicated() {
        let mut book = FontBook::new();
        let mut canvas = PageCanvas::new(&mut book);
        let style = TextStyle::default();
        canvas.draw_text(&style, PointPos::new(10.0, 20.0), "one");
        canvas.draw_text(&style, PointPos::new(10.0, 40.0), "two");
        let bytes = canvas.into_content().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        // One Tf and one rg despite two text runs.
        assert_eq!(text.matches("Tf").count(), 1);
        assert_eq!(text.matches("rg").count(), 1);
        assert_eq!(text.matches("Tj").count(), 2);
    }

    #[test]
    fn win_ansi_replaces_out_of_range() {
        assert_eq!(to_win_ansi("señor"), b"se\xf1or".to_vec());
        assert_eq!(to_win_ansi("漢"), b"?".to_vec());
    }

    #[test]
    fn empty_text_draws_nothing() {
        let mut book = FontBook::new();
        let mut canvas = PageCanvas::new(&mut book);
        canvas.draw_text(&TextStyle::default(), PointPos::new(0.0, 0.0), "");
        assert!(canvas.is_empty());
    }
}
