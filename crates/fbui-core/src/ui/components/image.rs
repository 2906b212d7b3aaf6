// src/ui/components/image.rs
//! Sprite images and the image widget

use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use crate::framebuffer::Framebuffer;
use crate::ui::colors::BLACK;
use crate::ui::components::replace;
use crate::ui::core::{Rect, WidgetId, WidgetType};
use crate::ui::primitives::{blit_image, stroke_rect};
use crate::ui::tree::{Paint, WidgetKind, WidgetTree};

/// Packed `0xAARRGGBB` sprite pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Argb8888(pub u32);

impl Argb8888 {
    pub const fn new(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self((alpha as u32) << 24 | (red as u32) << 16 | (green as u32) << 8 | blue as u32)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }
}

/// Borrowed sprite: `width * height` row-major pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Image {
    pub width: i32,
    pub height: i32,
    pixels: &'static [Argb8888],
}

impl Image {
    /// `None` unless `pixels` holds exactly `width * height` entries.
    pub fn new(width: i32, height: i32, pixels: &'static [Argb8888]) -> Option<Self> {
        if width < 0 || height < 0 || pixels.len() != (width * height) as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn pixels(&self) -> &'static [Argb8888] {
        self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Argb8888> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

/// Payload of an image widget: an optional sprite and an inner border.
#[derive(Debug, Clone)]
pub struct ImageWidget {
    image: Option<Image>,
    border_color: Rgb565,
    border_thickness: i32,
}

impl ImageWidget {
    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn border(&self) -> (Rgb565, i32) {
        (self.border_color, self.border_thickness)
    }
}

impl Paint for ImageWidget {
    fn paint(&self, bounds: Rect, fb: &mut Framebuffer) -> Result<(), Infallible> {
        if let Some(image) = &self.image {
            blit_image(fb, bounds.x, bounds.y, image, bounds);
        }
        let mut target = fb.clipped(&bounds.to_rectangle());
        stroke_rect(&mut target, bounds, self.border_color, self.border_thickness)
    }
}

impl WidgetTree {
    /// Image widget sized to its sprite; without a sprite it starts at 0x0.
    pub fn create_image(&mut self, x: i32, y: i32, image: Option<Image>) -> WidgetId {
        let (width, height) = image.map_or((0, 0), |i| (i.width, i.height));
        let widget = ImageWidget {
            image,
            border_color: BLACK,
            border_thickness: 0,
        };
        self.insert(WidgetKind::Image(widget), Rect::new(x, y, width, height))
    }

    pub fn image(&self, id: WidgetId) -> Option<&ImageWidget> {
        match &self.get(id)?.kind {
            WidgetKind::Image(image) => Some(image),
            _ => None,
        }
    }

    fn image_mut(&mut self, id: WidgetId) -> Option<&mut ImageWidget> {
        let found = self.widget_type(id);
        match self.get_mut(id).map(|w| &mut w.kind) {
            Some(WidgetKind::Image(image)) => Some(image),
            _ => {
                Self::mismatch(id, WidgetType::Image, found);
                None
            }
        }
    }

    /// Swap the sprite and resize the widget to it.
    pub fn set_image(&mut self, id: WidgetId, image: Option<Image>) {
        let Some(widget) = self.image_mut(id) else {
            return;
        };
        if !replace(&mut widget.image, image) {
            return;
        }
        self.mark_dirty(id);
        if let Some(image) = image {
            self.set_size(id, image.width, image.height);
        }
    }

    pub fn set_image_border(&mut self, id: WidgetId, color: Rgb565, thickness: i32) {
        if self.image_mut(id).is_some_and(|w| {
            replace(&mut w.border_color, color) | replace(&mut w.border_thickness, thickness)
        }) {
            self.mark_dirty(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::colors::WHITE;

    static OPAQUE_RED: [Argb8888; 6] = [Argb8888::new(255, 255, 0, 0); 6];
    static CHECKER: [Argb8888; 4] = [
        Argb8888::new(255, 255, 255, 255),
        Argb8888::new(0, 0, 0, 0),
        Argb8888::new(0, 0, 0, 0),
        Argb8888::new(255, 255, 255, 255),
    ];

    #[test]
    fn test_argb_channels() {
        let px = Argb8888::new(0x11, 0x22, 0x33, 0x44);
        assert_eq!(px.0, 0x1122_3344);
        assert_eq!((px.alpha(), px.red(), px.green(), px.blue()), (0x11, 0x22, 0x33, 0x44));
    }

    #[test]
    fn test_image_requires_matching_pixel_count() {
        assert!(Image::new(3, 2, &OPAQUE_RED).is_some());
        assert!(Image::new(2, 2, &OPAQUE_RED).is_none());
    }

    #[test]
    fn test_widget_takes_sprite_size() {
        let mut tree = WidgetTree::default();
        let sprite = Image::new(3, 2, &OPAQUE_RED);

        let id = tree.create_image(5, 5, sprite);
        let empty = tree.create_image(0, 0, None);

        assert_eq!(tree.geometry(id), Some(Rect::new(5, 5, 3, 2)));
        assert_eq!(tree.geometry(empty), Some(Rect::new(0, 0, 0, 0)));
        assert_eq!(tree.image(id).unwrap().border(), (BLACK, 0));
    }

    #[test]
    fn test_paint_honors_alpha() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(10, 10);
        let id = tree.create_image(2, 2, Image::new(2, 2, &CHECKER));

        tree.render_frame(id, &mut fb);

        let background = tree.background();
        assert_eq!(fb.pixel(2, 2), Some(WHITE));
        assert_eq!(fb.pixel(3, 2), Some(background), "transparent shows erase color");
        assert_eq!(fb.pixel(3, 3), Some(WHITE));
    }

    #[test]
    fn test_set_image_resizes() {
        let mut tree = WidgetTree::default();
        let id = tree.create_image(0, 0, None);

        tree.set_image(id, Image::new(2, 2, &CHECKER));

        assert_eq!(tree.geometry(id), Some(Rect::new(0, 0, 2, 2)));
        assert!(tree.is_dirty(id));
    }

    #[test]
    fn test_border_painted_over_sprite() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(10, 10);
        let id = tree.create_image(0, 0, Image::new(3, 2, &OPAQUE_RED));
        tree.set_image_border(id, WHITE, 1);

        tree.render_frame(id, &mut fb);

        assert_eq!(fb.pixel(0, 0), Some(WHITE));
        assert_eq!(fb.pixel(3, 0), Some(Rgb565::BLACK), "outside the widget");
    }
}
