// src/ui/components/label.rs
//! Single line of text without background

use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use crate::framebuffer::Framebuffer;
use crate::ui::colors::WHITE;
use crate::ui::components::replace;
use crate::ui::components::text::{TextSize, draw_text, truncated};
use crate::ui::core::{Rect, WidgetId, WidgetType};
use crate::ui::tree::{Paint, WidgetKind, WidgetTree};

/// Maximum label text length in bytes
pub const LABEL_TEXT_CAPACITY: usize = 128;

#[derive(Debug, Clone)]
pub struct Label {
    text: heapless::String<LABEL_TEXT_CAPACITY>,
    color: Rgb565,
    font: Option<TextSize>,
}

impl Label {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> Rgb565 {
        self.color
    }

    pub fn font(&self) -> Option<TextSize> {
        self.font
    }
}

impl Paint for Label {
    fn paint(&self, bounds: Rect, fb: &mut Framebuffer) -> Result<(), Infallible> {
        let Some(font) = self.font else {
            return Ok(());
        };
        let mut target = fb.clipped(&bounds.to_rectangle());
        draw_text(&mut target, &self.text, Point::new(bounds.x, bounds.y), font, self.color)
    }
}

impl WidgetTree {
    /// Label at `(x, y)` with zero size; size it with
    /// [`label_auto_size`](Self::label_auto_size) or a layout.
    pub fn create_label(&mut self, x: i32, y: i32, text: &str) -> WidgetId {
        let label = Label {
            text: truncated(text),
            color: WHITE,
            font: None,
        };
        self.insert(WidgetKind::Label(label), Rect::new(x, y, 0, 0))
    }

    pub fn create_label_auto(&mut self, x: i32, y: i32, text: &str, font: TextSize) -> WidgetId {
        let id = self.create_label(x, y, text);
        self.set_label_font(id, Some(font));
        self.label_auto_size(id);
        id
    }

    pub fn label(&self, id: WidgetId) -> Option<&Label> {
        match &self.get(id)?.kind {
            WidgetKind::Label(label) => Some(label),
            _ => None,
        }
    }

    pub fn label_text(&self, id: WidgetId) -> Option<&str> {
        self.label(id).map(Label::text)
    }

    fn update_label<F>(&mut self, id: WidgetId, f: F)
    where
        F: FnOnce(&mut Label) -> bool,
    {
        let found = self.widget_type(id);
        let changed = match self.get_mut(id).map(|w| &mut w.kind) {
            Some(WidgetKind::Label(label)) => f(label),
            _ => {
                Self::mismatch(id, WidgetType::Label, found);
                false
            }
        };
        if changed {
            self.mark_dirty(id);
        }
    }

    /// Replace the text. The label keeps its size; call
    /// [`label_auto_size`](Self::label_auto_size) to refit it.
    pub fn set_label_text(&mut self, id: WidgetId, text: &str) {
        self.update_label(id, |l| {
            let text = truncated(text);
            let changed = l.text != text;
            l.text = text;
            changed
        });
    }

    pub fn set_label_color(&mut self, id: WidgetId, color: Rgb565) {
        self.update_label(id, |l| replace(&mut l.color, color));
    }

    pub fn set_label_font(&mut self, id: WidgetId, font: Option<TextSize>) {
        self.update_label(id, |l| replace(&mut l.font, font));
    }

    /// Size the label to its text advance and line height.
    pub fn label_auto_size(&mut self, id: WidgetId) {
        let Some(label) = self.label(id) else {
            return;
        };
        let Some(font) = label.font else {
            return;
        };
        let width = font.measure_text_width(&label.text);
        self.set_size(id, width, font.line_height());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::colors::YELLOW;

    #[test]
    fn test_created_without_size() {
        let mut tree = WidgetTree::default();
        let id = tree.create_label(3, 4, "hello");

        assert_eq!(tree.geometry(id), Some(Rect::new(3, 4, 0, 0)));
        assert_eq!(tree.label(id).unwrap().color(), WHITE);
        assert_eq!(tree.label(id).unwrap().font(), None);
    }

    #[test]
    fn test_auto_size_matches_measurement() {
        let mut tree = WidgetTree::default();
        let id = tree.create_label_auto(0, 0, "Draw", TextSize::Large);

        let bounds = tree.geometry(id).unwrap();
        assert_eq!(bounds.width, TextSize::Large.measure_text_width("Draw"));
        assert_eq!(bounds.height, 20);
    }

    #[test]
    fn test_text_change_marks_dirty() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(100, 40);
        let id = tree.create_label_auto(0, 0, "0", TextSize::Medium);
        tree.render_frame(id, &mut fb);

        tree.set_label_text(id, "0");
        assert!(!tree.is_dirty(id));

        tree.set_label_text(id, "7");
        assert!(tree.is_dirty(id));
        assert_eq!(tree.label_text(id), Some("7"));
    }

    #[test]
    fn test_paint_draws_in_label_color() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(100, 40);
        let id = tree.create_label_auto(0, 0, "#", TextSize::Medium);
        tree.set_label_color(id, YELLOW);

        tree.render_frame(id, &mut fb);

        let lit = (0..6)
            .flat_map(|x| (0..10).map(move |y| (x, y)))
            .filter(|&(x, y)| fb.pixel(x, y) == Some(YELLOW))
            .count();
        assert!(lit > 0, "glyph pixels use the label color");
        assert_eq!(fb.pixel(50, 20), Some(Rgb565::BLACK), "outside untouched");
    }
}
