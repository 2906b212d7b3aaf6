//! RAM framebuffer with a pending dirty-rectangle list and change detection.
//!
//! All widget painting targets this buffer instead of the panel. The widget
//! tree queues the regions it needs erased in a fixed-capacity list; after a
//! frame is painted, only the rectangular region containing changed pixels is
//! flushed to the hardware display in a single transaction.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::UiConfig;
use crate::ui::Rect;

/// Capacity of the pending dirty-rectangle list.
///
/// Rectangles pushed past this limit are dropped. This is an intentional,
/// bounded-memory policy: the dropped regions are simply not erased this frame.
pub const MAX_DIRTY_RECTS: usize = 32;

/// Mapping from logical `(x, y)` coordinates to the physical pixel buffer.
///
/// Widgets always work in logical coordinates; the orientation only changes
/// where a pixel lands in memory, so a panel can be mounted rotated without
/// touching widget code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Physical layout equals logical layout
    #[default]
    Landscape,
    /// Rotated 90 degrees clockwise
    Portrait,
    /// Rotated 180 degrees
    LandscapeFlipped,
    /// Rotated 270 degrees clockwise
    PortraitFlipped,
}

impl Orientation {
    fn swaps_axes(self) -> bool {
        matches!(self, Orientation::Portrait | Orientation::PortraitFlipped)
    }
}

/// Bounding box of physical pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy)]
struct ChangedRegion {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl ChangedRegion {
    /// Expand the region to include the given pixel coordinate.
    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Create a new region covering a single pixel.
    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }
}

/// Heap-allocated framebuffer implementing `DrawTarget<Color = Rgb565>`.
pub struct Framebuffer {
    pixels: Vec<Rgb565>,
    width: usize,
    height: usize,
    orientation: Orientation,
    dirty_rects: heapless::Vec<Rect, MAX_DIRTY_RECTS>,
    changed: Option<ChangedRegion>,
}

impl Framebuffer {
    /// Allocate a new framebuffer of the given logical size filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width as usize;
        let height = height as usize;
        Self {
            pixels: vec![Rgb565::BLACK; width * height],
            width,
            height,
            orientation: Orientation::Landscape,
            dirty_rects: heapless::Vec::new(),
            changed: None,
        }
    }

    /// Allocate a framebuffer sized and oriented from the configuration.
    pub fn from_config(config: &UiConfig) -> Self {
        Self::new(config.display.width, config.display.height)
            .with_orientation(config.display.orientation)
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Logical width in pixels.
    pub fn width(&self) -> u32 {
        self.width as u32
    }

    /// Logical height in pixels.
    pub fn height(&self) -> u32 {
        self.height as u32
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Size of the buffer as laid out in memory (width/height swapped for portrait).
    pub fn physical_size(&self) -> Size {
        if self.orientation.swaps_axes() {
            Size::new(self.height as u32, self.width as u32)
        } else {
            Size::new(self.width as u32, self.height as u32)
        }
    }

    /// Raw pixel buffer in physical order.
    pub fn physical_pixels(&self) -> &[Rgb565] {
        &self.pixels
    }

    /// Physical coordinate of a logical pixel.
    #[inline]
    fn physical(&self, x: usize, y: usize) -> (usize, usize) {
        let (w, h) = (self.width, self.height);
        match self.orientation {
            Orientation::Landscape => (x, y),
            Orientation::Portrait => (h - 1 - y, x),
            Orientation::LandscapeFlipped => (w - 1 - x, h - 1 - y),
            Orientation::PortraitFlipped => (y, w - 1 - x),
        }
    }

    /// Map a physical panel coordinate, e.g. a touch point, back to logical
    /// coordinates. `None` outside the panel.
    pub fn to_logical(&self, physical: Point) -> Option<Point> {
        let size = self.physical_size();
        if physical.x < 0
            || physical.y < 0
            || physical.x as u32 >= size.width
            || physical.y as u32 >= size.height
        {
            return None;
        }
        let (px, py) = (physical.x, physical.y);
        let (w, h) = (self.width as i32, self.height as i32);
        let (x, y) = match self.orientation {
            Orientation::Landscape => (px, py),
            Orientation::Portrait => (py, h - 1 - px),
            Orientation::LandscapeFlipped => (w - 1 - px, h - 1 - py),
            Orientation::PortraitFlipped => (w - 1 - py, px),
        };
        Some(Point::new(x, y))
    }

    /// Linear buffer index of a logical pixel.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        let (px, py) = self.physical(x, y);
        py * self.physical_size().width as usize + px
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Read a logical pixel, `None` outside the viewport.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb565> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(self.pixels[self.index(x as usize, y as usize)])
    }

    /// Write a logical pixel; writes outside the viewport are ignored.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgb565) {
        if self.in_bounds(x, y) {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    /// Write a single pixel, expanding the changed region only if the color changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb565) {
        let (px, py) = self.physical(x, y);
        let idx = py * self.physical_size().width as usize + px;
        if self.pixels[idx] != color {
            self.pixels[idx] = color;
            match &mut self.changed {
                Some(region) => region.expand(px, py),
                None => self.changed = Some(ChangedRegion::from_point(px, py)),
            }
        }
    }

    /// Fill a logical rectangle, clipped to the viewport.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgb565) {
        let Some(clipped) = rect.clip_to(self.width as i32, self.height as i32) else {
            return;
        };
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
    }

    /// Queue a region to be erased by [`clear_dirty_rects`](Self::clear_dirty_rects).
    ///
    /// Empty rectangles and rectangles already covered by a pending one are
    /// accepted without using capacity. Returns `false` when the list is full
    /// and the rectangle was dropped.
    pub fn push_dirty_rect(&mut self, rect: Rect) -> bool {
        if rect.is_empty() || self.dirty_rects.iter().any(|r| r.contains_rect(&rect)) {
            return true;
        }
        if self.dirty_rects.push(rect).is_err() {
            warn!(
                "Dirty rect list full ({} entries), dropping {:?}",
                MAX_DIRTY_RECTS, rect
            );
            return false;
        }
        true
    }

    /// Regions waiting to be erased this frame.
    pub fn dirty_rects(&self) -> &[Rect] {
        &self.dirty_rects
    }

    /// Erase every pending region with `color`, then empty the list.
    pub fn clear_dirty_rects(&mut self, color: Rgb565) {
        if !self.dirty_rects.is_empty() {
            debug!("Erasing {} dirty rects", self.dirty_rects.len());
        }
        let rects = core::mem::take(&mut self.dirty_rects);
        for rect in &rects {
            self.fill_rect(*rect, color);
        }
    }

    /// Flush the changed region to a hardware display, then reset the change state.
    ///
    /// Only the bounding rectangle of changed pixels is sent, in physical
    /// coordinates, via `fill_contiguous`. If nothing changed, this is a no-op.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(region) = self.changed.take() else {
            return Ok(());
        };

        let width = region.max_x - region.min_x + 1;
        let height = region.max_y - region.min_y + 1;

        debug!(
            "Flushing {}x{} changed region at ({}, {})",
            width, height, region.min_x, region.min_y
        );

        let area = Rectangle::new(
            Point::new(region.min_x as i32, region.min_y as i32),
            Size::new(width as u32, height as u32),
        );

        // Borrow the pixel slice so the closure captures a shared reference,
        // avoiding the `FnMut` escaping-reference issue with `&mut self`.
        let pixels = &self.pixels;
        let stride = self.physical_size().width as usize;
        let pixel_iter = (region.min_y..=region.max_y).flat_map(move |y| {
            let row_start = y * stride + region.min_x;
            pixels[row_start..row_start + width].iter().copied()
        });

        display.fill_contiguous(&area, pixel_iter)
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.put_pixel(coord.x, coord.y, color);
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        for (point, color) in area.points().zip(colors) {
            self.put_pixel(point.x, point.y, color);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let rect = Rect::new(
            area.top_left.x,
            area.top_left.y,
            area.size.width as i32,
            area.size.height as i32,
        );
        self.fill_rect(rect, color);
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_dirty_rects_clips_and_empties_list() {
        let mut fb = Framebuffer::new(10, 10);
        fb.push_dirty_rect(Rect::new(-5, 8, 8, 8));

        fb.clear_dirty_rects(Rgb565::WHITE);

        assert!(fb.dirty_rects().is_empty());
        assert_eq!(fb.pixel(0, 9), Some(Rgb565::WHITE));
        assert_eq!(fb.pixel(2, 8), Some(Rgb565::WHITE));
        assert_eq!(fb.pixel(3, 8), Some(Rgb565::BLACK), "outside the rect");
        assert_eq!(fb.pixel(0, 7), Some(Rgb565::BLACK), "outside the rect");
    }

    #[test]
    fn test_dirty_rect_capacity_drops_excess() {
        let mut fb = Framebuffer::new(100, 100);
        for i in 0..MAX_DIRTY_RECTS as i32 {
            assert!(fb.push_dirty_rect(Rect::new(i * 2, 0, 1, 1)));
        }

        assert!(!fb.push_dirty_rect(Rect::new(99, 99, 1, 1)), "list is full");
        assert_eq!(fb.dirty_rects().len(), MAX_DIRTY_RECTS);
    }

    #[test]
    fn test_covered_and_empty_rects_use_no_capacity() {
        let mut fb = Framebuffer::new(100, 100);
        fb.push_dirty_rect(Rect::new(0, 0, 50, 50));
        fb.push_dirty_rect(Rect::new(10, 10, 5, 5));
        fb.push_dirty_rect(Rect::new(60, 60, 0, 5));

        assert_eq!(fb.dirty_rects(), &[Rect::new(0, 0, 50, 50)]);
    }

    #[test]
    fn test_portrait_orientation_maps_pixels() {
        let mut fb = Framebuffer::new(4, 3).with_orientation(Orientation::Portrait);
        fb.put_pixel(0, 0, Rgb565::WHITE);

        assert_eq!(fb.physical_size(), Size::new(3, 4));
        // Logical (0, 0) lands at physical (height - 1, 0).
        assert_eq!(fb.index(0, 0), 2);
        assert_eq!(fb.physical_pixels()[2], Rgb565::WHITE);
        assert_eq!(fb.pixel(0, 0), Some(Rgb565::WHITE));
    }

    #[test]
    fn test_physical_points_map_back_to_logical() {
        for orientation in [
            Orientation::Landscape,
            Orientation::Portrait,
            Orientation::LandscapeFlipped,
            Orientation::PortraitFlipped,
        ] {
            let fb = Framebuffer::new(4, 3).with_orientation(orientation);
            let physical_width = fb.physical_size().width as usize;
            for y in 0..3 {
                for x in 0..4 {
                    let index = fb.index(x, y);
                    let physical = Point::new(
                        (index % physical_width) as i32,
                        (index / physical_width) as i32,
                    );
                    assert_eq!(
                        fb.to_logical(physical),
                        Some(Point::new(x as i32, y as i32)),
                        "{:?} at ({}, {})",
                        orientation,
                        x,
                        y
                    );
                }
            }
            assert_eq!(fb.to_logical(Point::new(-1, 0)), None);
        }

        let portrait = Framebuffer::new(4, 3).with_orientation(Orientation::Portrait);
        assert_eq!(portrait.to_logical(Point::new(3, 0)), None, "outside the 3x4 panel");
    }

    #[test]
    fn test_flush_sends_only_changed_region() {
        let mut fb = Framebuffer::new(20, 20);
        let mut display = Framebuffer::new(20, 20);
        fb.put_pixel(3, 4, Rgb565::RED);
        fb.put_pixel(5, 6, Rgb565::GREEN);

        fb.flush(&mut display).ok();

        assert_eq!(display.pixel(3, 4), Some(Rgb565::RED));
        assert_eq!(display.pixel(5, 6), Some(Rgb565::GREEN));
        assert!(display.changed.is_some());
        assert!(fb.changed.is_none(), "flush resets change tracking");
    }
}
