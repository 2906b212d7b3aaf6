// src/ui/core.rs
//! Core UI types: signed geometry, widget handles and widget type tags

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Axis-aligned rectangle in logical screen coordinates.
///
/// Widths and heights are signed: layout arithmetic with oversized padding or
/// spacing may produce negative sizes, which are kept rather than rejected.
/// A rectangle with a non-positive width or height covers no pixels. Edge
/// arithmetic saturates at the `i32` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Half-open point test: `x in [x0, x0 + w)`, `y in [y0, y0 + h)`.
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// True when the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// True when every pixel of `other` lies inside `self`.
    ///
    /// An empty rectangle is contained in anything.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        if other.is_empty() {
            return true;
        }
        !self.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.right().max(other.right());
        let max_y = self.bottom().max(other.bottom());

        Rect::new(
            min_x,
            min_y,
            max_x.saturating_sub(min_x),
            max_y.saturating_sub(min_y),
        )
    }

    /// Intersection of `self` with `[0, width) x [0, height)`.
    ///
    /// Returns `None` when nothing remains.
    pub fn clip_to(&self, width: i32, height: i32) -> Option<Rect> {
        self.intersection(&Rect::new(0, 0, width, height))
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y)))
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Convert to an embedded-graphics rectangle, clamping negative sizes to 0.
    pub fn to_rectangle(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.x, self.y),
            Size::new(self.width.max(0) as u32, self.height.max(0) as u32),
        )
    }
}

/// Handle to a widget stored in a [`WidgetTree`](crate::ui::WidgetTree).
///
/// Handles are generational: once a widget is destroyed its handle goes stale
/// and every operation on it becomes a no-op, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// The five widget variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetType {
    Button,
    Label,
    Canvas,
    Container,
    Image,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_point_is_half_open() {
        let r = Rect::new(10, 20, 5, 4);
        assert!(r.contains_point(10, 20));
        assert!(r.contains_point(14, 23));
        assert!(!r.contains_point(15, 20), "right edge is exclusive");
        assert!(!r.contains_point(10, 24), "bottom edge is exclusive");
        assert!(!r.contains_point(9, 20));
    }

    #[test]
    fn test_union_expands_to_cover_both() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 20, 10, 5);
        assert_eq!(a.union(&b), Rect::new(0, 0, 15, 25));
        assert_eq!(Rect::default().union(&b), b, "empty rect is the identity");
    }

    #[test]
    fn test_clip_to_viewport() {
        let r = Rect::new(-5, 90, 20, 20);
        assert_eq!(r.clip_to(100, 100), Some(Rect::new(0, 90, 15, 10)));
        assert_eq!(Rect::new(200, 0, 5, 5).clip_to(100, 100), None);
    }

    #[test]
    fn test_negative_size_covers_nothing() {
        let r = Rect::new(0, 0, -10, 5);
        assert!(r.is_empty());
        assert!(!r.intersects(&Rect::new(-20, 0, 40, 40)));
        assert_eq!(r.to_rectangle().size, Size::new(0, 5));
    }
}
