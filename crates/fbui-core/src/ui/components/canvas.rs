// src/ui/components/canvas.rs
//! Freehand drawing surface backed by an 8-bit intensity raster
//!
//! Strokes only touch the raster and grow a canvas-local dirty rectangle, so
//! the next frame repaints just the stroked area instead of the whole widget.
//! The raster can be resampled to a 28x28 classifier input.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::trace;

use crate::config::CanvasConfig;
use crate::framebuffer::Framebuffer;
use crate::ui::colors::{BLACK, WHITE};
use crate::ui::components::replace;
use crate::ui::core::{Rect, WidgetId, WidgetType};
use crate::ui::primitives::stroke_rect;
use crate::ui::tree::{Paint, WidgetKind, WidgetTree};

/// Side length of the classifier input grid
pub const CLASSIFIER_INPUT_SIDE: usize = 28;

pub const CLASSIFIER_INPUT_LEN: usize = CLASSIFIER_INPUT_SIDE * CLASSIFIER_INPUT_SIDE;

/// Row-major 28x28 intensity grid
pub type ClassifierInput = [u8; CLASSIFIER_INPUT_LEN];

/// Stroke intensity written by the brush
const INK: u8 = 255;

/// Resampling method for [`WidgetTree::downsample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleFilter {
    /// Mean of every source pixel under the output cell
    #[default]
    Box,
    /// Interpolate between the four nearest source pixels
    Bilinear,
}

#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: Vec<u8>,
    width: i32,
    height: i32,
    brush_size: i32,
    background_color: Rgb565,
    brush_color: Rgb565,
    border_color: Rgb565,
    border_thickness: i32,
    /// Canvas-local area touched since the last paint
    dirty_rect: Option<Rect>,
}

impl Canvas {
    fn new(width: i32, height: i32, defaults: &CanvasConfig) -> Self {
        Self {
            pixels: vec![0; raster_len(width, height)],
            width,
            height,
            brush_size: defaults.brush_size.max(1),
            background_color: WHITE,
            brush_color: BLACK,
            border_color: BLACK,
            border_thickness: defaults.border_thickness,
            dirty_rect: None,
        }
    }

    /// Intensity raster, row-major, `width * height` bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn intensity(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    pub fn brush_size(&self) -> i32 {
        self.brush_size
    }

    pub fn brush_color(&self) -> Rgb565 {
        self.brush_color
    }

    pub fn background_color(&self) -> Rgb565 {
        self.background_color
    }

    pub fn border(&self) -> (Rgb565, i32) {
        (self.border_color, self.border_thickness)
    }

    /// Canvas-local region awaiting repaint, if any.
    pub fn dirty_rect(&self) -> Option<Rect> {
        self.dirty_rect
    }

    pub(crate) fn reset_dirty_rect(&mut self) {
        self.dirty_rect = None;
    }

    /// Reallocate a cleared raster for the new size.
    pub(crate) fn resize(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; raster_len(width, height)];
        self.dirty_rect = None;
    }

    fn expand_dirty_rect(&mut self, rect: Rect) {
        self.dirty_rect = Some(match self.dirty_rect {
            Some(current) => current.union(&rect),
            None => rect,
        });
    }

    /// Stamp the brush centered on a canvas-local point.
    ///
    /// Returns `false`, touching nothing, when the point lies outside the
    /// canvas. The stamp covers `[c - size/2, c + size/2]` on both axes,
    /// clamped to the raster.
    fn stamp(&mut self, cx: i32, cy: i32) -> bool {
        if cx < 0 || cy < 0 || cx >= self.width || cy >= self.height {
            return false;
        }

        let half = self.brush_size / 2;
        let x0 = (cx - half).max(0);
        let y0 = (cy - half).max(0);
        let x1 = (cx + half).min(self.width - 1);
        let y1 = (cy + half).min(self.height - 1);

        for y in y0..=y1 {
            let row = (y * self.width) as usize;
            self.pixels[row + x0 as usize..=row + x1 as usize].fill(INK);
        }

        self.expand_dirty_rect(Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1));
        true
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
        self.expand_dirty_rect(Rect::new(0, 0, self.width, self.height));
    }

    /// Repaint the canvas-local `region`, then redraw the border over it.
    pub(crate) fn paint_region(
        &self,
        bounds: Rect,
        region: Rect,
        fb: &mut Framebuffer,
    ) -> Result<(), Infallible> {
        let Some(region) = region.clip_to(self.width, self.height) else {
            return Ok(());
        };

        for y in region.y..region.bottom() {
            let row = (y * self.width) as usize;
            for x in region.x..region.right() {
                let color = if self.pixels[row + x as usize] > 0 {
                    self.brush_color
                } else {
                    self.background_color
                };
                fb.put_pixel(bounds.x + x, bounds.y + y, color);
            }
        }

        let clip = region.offset(bounds.x, bounds.y);
        let mut target = fb.clipped(&clip.to_rectangle());
        stroke_rect(&mut target, bounds, self.border_color, self.border_thickness)
    }

    /// Resample the raster onto the 28x28 classifier grid.
    pub fn downsample(&self, filter: ResampleFilter) -> ClassifierInput {
        match filter {
            ResampleFilter::Box => self.downsample_box(),
            ResampleFilter::Bilinear => self.downsample_bilinear(),
        }
    }

    fn downsample_box(&self) -> ClassifierInput {
        let mut out = [0u8; CLASSIFIER_INPUT_LEN];
        let side = CLASSIFIER_INPUT_SIDE as f32;
        let x_scale = self.width as f32 / side;
        let y_scale = self.height as f32 / side;

        for oy in 0..CLASSIFIER_INPUT_SIDE {
            let center_y = (oy as f32 + 0.5) * y_scale;
            let start_y = ((center_y - y_scale * 0.5) as i32).max(0);
            let end_y = ((center_y + y_scale * 0.5) as i32).min(self.height - 1);

            for ox in 0..CLASSIFIER_INPUT_SIDE {
                let center_x = (ox as f32 + 0.5) * x_scale;
                let start_x = ((center_x - x_scale * 0.5) as i32).max(0);
                let end_x = ((center_x + x_scale * 0.5) as i32).min(self.width - 1);

                let mut sum = 0u32;
                let mut count = 0u32;
                for y in start_y..=end_y {
                    let row = (y * self.width) as usize;
                    for x in start_x..=end_x {
                        sum += self.pixels[row + x as usize] as u32;
                        count += 1;
                    }
                }

                out[oy * CLASSIFIER_INPUT_SIDE + ox] = if count > 0 { (sum / count) as u8 } else { 0 };
            }
        }
        out
    }

    fn downsample_bilinear(&self) -> ClassifierInput {
        let mut out = [0u8; CLASSIFIER_INPUT_LEN];
        if self.width <= 0 || self.height <= 0 {
            return out;
        }

        let side = CLASSIFIER_INPUT_SIDE as f32;
        let x_scale = self.width as f32 / side;
        let y_scale = self.height as f32 / side;
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let at = |x: i32, y: i32| self.pixels[(y * self.width + x) as usize] as f32;

        for oy in 0..CLASSIFIER_INPUT_SIDE {
            let sy = ((oy as f32 + 0.5) * y_scale - 0.5).clamp(0.0, max_y);
            let y0 = sy as i32;
            let y1 = (y0 + 1).min(self.height - 1);
            let fy = sy - y0 as f32;

            for ox in 0..CLASSIFIER_INPUT_SIDE {
                let sx = ((ox as f32 + 0.5) * x_scale - 0.5).clamp(0.0, max_x);
                let x0 = sx as i32;
                let x1 = (x0 + 1).min(self.width - 1);
                let fx = sx - x0 as f32;

                let top = at(x0, y0) * (1.0 - fx) + at(x1, y0) * fx;
                let bottom = at(x0, y1) * (1.0 - fx) + at(x1, y1) * fx;
                let value = libm::roundf(top * (1.0 - fy) + bottom * fy);
                out[oy * CLASSIFIER_INPUT_SIDE + ox] = value.clamp(0.0, 255.0) as u8;
            }
        }
        out
    }
}

impl Paint for Canvas {
    fn paint(&self, bounds: Rect, fb: &mut Framebuffer) -> Result<(), Infallible> {
        self.paint_region(bounds, Rect::new(0, 0, self.width, self.height), fb)
    }
}

fn raster_len(width: i32, height: i32) -> usize {
    width.max(0) as usize * height.max(0) as usize
}

impl WidgetTree {
    /// Canvas with a cleared raster and the tree's brush and border defaults.
    pub fn create_canvas(&mut self, x: i32, y: i32, width: i32, height: i32) -> WidgetId {
        let canvas = Canvas::new(width, height, &self.canvas_defaults);
        self.insert(WidgetKind::Canvas(canvas), Rect::new(x, y, width, height))
    }

    pub fn canvas(&self, id: WidgetId) -> Option<&Canvas> {
        match &self.get(id)?.kind {
            WidgetKind::Canvas(canvas) => Some(canvas),
            _ => None,
        }
    }

    fn canvas_mut(&mut self, id: WidgetId) -> Option<&mut Canvas> {
        let found = self.widget_type(id);
        match self.get_mut(id).map(|w| &mut w.kind) {
            Some(WidgetKind::Canvas(canvas)) => Some(canvas),
            _ => {
                Self::mismatch(id, WidgetType::Canvas, found);
                None
            }
        }
    }

    pub fn canvas_pixels(&self, id: WidgetId) -> Option<&[u8]> {
        self.canvas(id).map(Canvas::pixels)
    }

    /// Stamp the brush at screen coordinates `(x, y)`.
    ///
    /// Points outside the canvas are ignored and leave the dirty flag alone.
    /// Otherwise only the stamped area is scheduled for repaint.
    pub fn draw_at(&mut self, id: WidgetId, x: i32, y: i32) {
        let Some(bounds) = self.geometry(id) else {
            return;
        };
        let Some(canvas) = self.canvas_mut(id) else {
            return;
        };
        let (Some(local_x), Some(local_y)) = (x.checked_sub(bounds.x), y.checked_sub(bounds.y))
        else {
            return;
        };
        if canvas.stamp(local_x, local_y) {
            trace!("Stroke at ({}, {}) on {:?}", x, y, id);
            self.propagate_dirty(id);
        }
    }

    /// Erase every stroke.
    pub fn clear_canvas(&mut self, id: WidgetId) {
        if let Some(canvas) = self.canvas_mut(id) {
            canvas.clear();
            self.propagate_dirty(id);
        }
    }

    /// Values below one are clamped to one. Affects future strokes only.
    pub fn set_brush_size(&mut self, id: WidgetId, size: i32) {
        if let Some(canvas) = self.canvas_mut(id) {
            canvas.brush_size = size.max(1);
        }
    }

    pub fn set_brush_color(&mut self, id: WidgetId, color: Rgb565) {
        if self.canvas_mut(id).is_some_and(|c| replace(&mut c.brush_color, color)) {
            self.mark_dirty(id);
        }
    }

    pub fn set_canvas_background(&mut self, id: WidgetId, color: Rgb565) {
        if self
            .canvas_mut(id)
            .is_some_and(|c| replace(&mut c.background_color, color))
        {
            self.mark_dirty(id);
        }
    }

    pub fn set_canvas_border(&mut self, id: WidgetId, color: Rgb565, thickness: i32) {
        if self.canvas_mut(id).is_some_and(|c| {
            replace(&mut c.border_color, color) | replace(&mut c.border_thickness, thickness)
        }) {
            self.mark_dirty(id);
        }
    }

    /// Box-filtered 28x28 classifier input.
    pub fn get_28x28(&self, id: WidgetId) -> Option<ClassifierInput> {
        self.downsample(id, ResampleFilter::Box)
    }

    pub fn downsample(&self, id: WidgetId, filter: ResampleFilter) -> Option<ClassifierInput> {
        self.canvas(id).map(|c| c.downsample(filter))
    }
}
