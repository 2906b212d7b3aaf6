// src/ui/components/button.rs
//! Push button: filled face, inner border and a line of text

use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use crate::framebuffer::Framebuffer;
use crate::ui::colors::{BLACK, GRAY_75};
use crate::ui::components::replace;
use crate::ui::components::text::{TextSize, draw_text, truncated};
use crate::ui::core::{Rect, WidgetId, WidgetType};
use crate::ui::primitives::{fill_rect, stroke_rect};
use crate::ui::tree::{Paint, WidgetKind, WidgetTree};

/// Maximum button text length in bytes
pub const BUTTON_TEXT_CAPACITY: usize = 64;

/// Payload of a button widget.
#[derive(Debug, Clone)]
pub struct Button {
    text: heapless::String<BUTTON_TEXT_CAPACITY>,
    padding: i32,
    background_color: Rgb565,
    text_color: Rgb565,
    border_color: Rgb565,
    border_thickness: i32,
    font: Option<TextSize>,
}

impl Button {
    fn new(text: &str) -> Self {
        Self {
            text: truncated(text),
            padding: 8,
            background_color: GRAY_75,
            text_color: BLACK,
            border_color: BLACK,
            border_thickness: 1,
            font: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn padding(&self) -> i32 {
        self.padding
    }

    pub fn background_color(&self) -> Rgb565 {
        self.background_color
    }

    pub fn text_color(&self) -> Rgb565 {
        self.text_color
    }

    pub fn border(&self) -> (Rgb565, i32) {
        (self.border_color, self.border_thickness)
    }

    pub fn font(&self) -> Option<TextSize> {
        self.font
    }

    /// Text extent plus padding and border on both sides, `None` without a font.
    fn preferred_size(&self) -> Option<(i32, i32)> {
        let font = self.font?;
        let chrome = 2 * self.padding + 2 * self.border_thickness;
        Some((
            font.measure_text_width(&self.text) + chrome,
            font.line_height() + chrome,
        ))
    }
}

impl Paint for Button {
    fn paint(&self, bounds: Rect, fb: &mut Framebuffer) -> Result<(), Infallible> {
        let mut target = fb.clipped(&bounds.to_rectangle());
        fill_rect(&mut target, bounds, self.background_color)?;
        stroke_rect(&mut target, bounds, self.border_color, self.border_thickness)?;
        if let Some(font) = self.font {
            let origin = Point::new(bounds.x + self.padding, bounds.y + self.padding);
            draw_text(&mut target, &self.text, origin, font, self.text_color)?;
        }
        Ok(())
    }
}

impl WidgetTree {
    pub fn create_button(&mut self, x: i32, y: i32, width: i32, height: i32, text: &str) -> WidgetId {
        self.insert(
            WidgetKind::Button(Button::new(text)),
            Rect::new(x, y, width, height),
        )
    }

    /// Button sized to fit `text` in `font`.
    pub fn create_button_auto(&mut self, x: i32, y: i32, text: &str, font: TextSize) -> WidgetId {
        let id = self.create_button(x, y, 0, 0, text);
        self.set_button_font(id, Some(font));
        self.button_auto_size(id);
        id
    }

    pub fn button(&self, id: WidgetId) -> Option<&Button> {
        match &self.get(id)?.kind {
            WidgetKind::Button(button) => Some(button),
            _ => None,
        }
    }

    fn button_mut(&mut self, id: WidgetId) -> Option<&mut Button> {
        let found = self.widget_type(id);
        match self.get_mut(id).map(|w| &mut w.kind) {
            Some(WidgetKind::Button(button)) => Some(button),
            _ => {
                Self::mismatch(id, WidgetType::Button, found);
                None
            }
        }
    }

    /// Apply `f` to the button and mark it dirty if `f` reports a change.
    fn update_button<F>(&mut self, id: WidgetId, f: F)
    where
        F: FnOnce(&mut Button) -> bool,
    {
        if self.button_mut(id).is_some_and(f) {
            self.mark_dirty(id);
        }
    }

    pub fn set_button_text(&mut self, id: WidgetId, text: &str) {
        self.update_button(id, |b| {
            let text = truncated(text);
            let changed = b.text != text;
            b.text = text;
            changed
        });
    }

    pub fn set_button_padding(&mut self, id: WidgetId, padding: i32) {
        self.update_button(id, |b| replace(&mut b.padding, padding));
    }

    pub fn set_button_background(&mut self, id: WidgetId, color: Rgb565) {
        self.update_button(id, |b| replace(&mut b.background_color, color));
    }

    pub fn set_button_text_color(&mut self, id: WidgetId, color: Rgb565) {
        self.update_button(id, |b| replace(&mut b.text_color, color));
    }

    pub fn set_button_border(&mut self, id: WidgetId, color: Rgb565, thickness: i32) {
        self.update_button(id, |b| {
            replace(&mut b.border_color, color) | replace(&mut b.border_thickness, thickness)
        });
    }

    pub fn set_button_font(&mut self, id: WidgetId, font: Option<TextSize>) {
        self.update_button(id, |b| replace(&mut b.font, font));
    }

    /// Resize the button around its text. Does nothing without a font.
    pub fn button_auto_size(&mut self, id: WidgetId) {
        if let Some((width, height)) = self.button(id).and_then(Button::preferred_size) {
            self.set_size(id, width, height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::colors::WHITE;

    #[test]
    fn test_defaults() {
        let mut tree = WidgetTree::default();
        let id = tree.create_button(0, 0, 80, 30, "OK");
        let button = tree.button(id).unwrap();

        assert_eq!(button.text(), "OK");
        assert_eq!(button.padding(), 8);
        assert_eq!(button.background_color(), GRAY_75);
        assert_eq!(button.border(), (BLACK, 1));
        assert_eq!(button.font(), None);
    }

    #[test]
    fn test_auto_size_wraps_text() {
        let mut tree = WidgetTree::default();
        let id = tree.create_button_auto(10, 10, "Clear", TextSize::Medium);

        // padding 8 and border 1 on both sides
        let expected_width = TextSize::Medium.measure_text_width("Clear") + 16 + 2;
        assert_eq!(
            tree.geometry(id),
            Some(Rect::new(10, 10, expected_width, 10 + 16 + 2))
        );
    }

    #[test]
    fn test_long_text_is_truncated() {
        let mut tree = WidgetTree::default();
        let long = "x".repeat(100);
        let id = tree.create_button(0, 0, 10, 10, &long);

        assert_eq!(tree.button(id).unwrap().text().len(), BUTTON_TEXT_CAPACITY);
    }

    #[test]
    fn test_setters_dirty_only_on_change() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(100, 100);
        let id = tree.create_button(0, 0, 80, 30, "OK");
        tree.render_frame(id, &mut fb);

        tree.set_button_text(id, "OK");
        tree.set_button_padding(id, 8);
        assert!(!tree.is_dirty(id));

        tree.set_button_background(id, WHITE);
        assert!(tree.is_dirty(id));
    }

    #[test]
    fn test_paint_fills_face_and_border() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(100, 100);
        let id = tree.create_button(10, 10, 40, 20, "");
        tree.set_button_border(id, WHITE, 2);

        tree.render_frame(id, &mut fb);

        assert_eq!(fb.pixel(10, 10), Some(WHITE));
        assert_eq!(fb.pixel(11, 11), Some(WHITE));
        assert_eq!(fb.pixel(20, 20), Some(GRAY_75));
        assert_eq!(fb.pixel(50, 30), Some(Rgb565::BLACK), "outside bounds");
    }

    #[test]
    fn test_button_setter_ignores_labels() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(100, 100);
        let label = tree.create_label(0, 0, "L");
        tree.render_frame(label, &mut fb);

        tree.set_button_text(label, "changed");

        assert!(!tree.is_dirty(label));
        assert_eq!(tree.label_text(label), Some("L"));
    }
}
