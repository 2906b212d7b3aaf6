// src/ui/components/text.rs
//! Fonts, text measurement and clipped text drawing

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::{
    MonoFont, MonoTextStyle,
    ascii::{FONT_5X8, FONT_6X10, FONT_10X20},
};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

/// Text size variants
///
/// Provides three preset text sizes with corresponding embedded-graphics fonts:
/// - `Small`: 5x8 font
/// - `Medium`: 6x10 font
/// - `Large`: 10x20 font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Small,
    Medium,
    Large,
}

impl TextSize {
    pub fn font(&self) -> &'static MonoFont<'static> {
        match self {
            TextSize::Small => &FONT_5X8,
            TextSize::Medium => &FONT_6X10,
            TextSize::Large => &FONT_10X20,
        }
    }

    /// Horizontal advance of `text`: every glyph plus the spacing between
    /// glyphs, without trailing spacing after the last one.
    pub fn measure_text_width(&self, text: &str) -> i32 {
        let count = text.chars().count() as i32;
        if count == 0 {
            return 0;
        }
        let font = self.font();
        let advance = (font.character_size.width + font.character_spacing) as i32;
        count * advance - font.character_spacing as i32
    }

    pub fn line_height(&self) -> i32 {
        self.font().character_size.height as i32
    }
}

/// Draw `text` with its top-left corner at `position`.
///
/// Callers clip the target to the owning widget's bounds.
pub fn draw_text<D>(
    target: &mut D,
    text: &str,
    position: Point,
    size: TextSize,
    color: Rgb565,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    if text.is_empty() {
        return Ok(());
    }
    let style = MonoTextStyle::new(size.font(), color);
    Text::with_baseline(text, position, style, Baseline::Top).draw(target)?;
    Ok(())
}

/// Copy `text` into a fixed-capacity string, cutting at the last character
/// boundary that fits.
pub(crate) fn truncated<const N: usize>(text: &str) -> heapless::String<N> {
    let mut end = text.len().min(N);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = heapless::String::new();
    out.push_str(&text[..end]).ok();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::Framebuffer;

    #[test]
    fn test_measure_excludes_trailing_spacing() {
        let font = TextSize::Medium.font();
        let expected = 3 * (font.character_size.width + font.character_spacing) as i32
            - font.character_spacing as i32;

        assert_eq!(TextSize::Medium.measure_text_width("abc"), expected);
        assert_eq!(TextSize::Large.measure_text_width(""), 0);
        assert_eq!(TextSize::Small.measure_text_width("x"), 5);
    }

    #[test]
    fn test_line_heights() {
        assert_eq!(TextSize::Small.line_height(), 8);
        assert_eq!(TextSize::Medium.line_height(), 10);
        assert_eq!(TextSize::Large.line_height(), 20);
    }

    #[test]
    fn test_truncated_respects_char_boundaries() {
        let s: heapless::String<4> = truncated("abcdef");
        assert_eq!(s.as_str(), "abcd");

        // 'é' is two bytes; cutting at byte 4 would split it.
        let s: heapless::String<4> = truncated("abcé");
        assert_eq!(s.as_str(), "abc");
    }

    #[test]
    fn test_text_is_clipped_by_target() {
        let mut fb = Framebuffer::new(40, 20);
        {
            let clip = crate::ui::Rect::new(0, 0, 6, 10).to_rectangle();
            let mut target = fb.clipped(&clip);
            draw_text(&mut target, "WW", Point::zero(), TextSize::Medium, Rgb565::WHITE).unwrap();
        }

        let lit_outside = (6..40)
            .flat_map(|x| (0..20).map(move |y| (x, y)))
            .any(|(x, y)| fb.pixel(x, y) != Some(Rgb565::BLACK));
        let lit_inside = (0..6)
            .flat_map(|x| (0..10).map(move |y| (x, y)))
            .any(|(x, y)| fb.pixel(x, y) == Some(Rgb565::WHITE));

        assert!(lit_inside);
        assert!(!lit_outside, "second glyph must be clipped away");
    }
}
