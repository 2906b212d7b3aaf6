// src/ui/render.rs
//! Frame pipeline: collect damage, erase it, repaint what changed
//!
//! A frame runs in four steps:
//! 1. [`handle_dirty`](WidgetTree::handle_dirty) queues the regions that
//!    changed widgets occupied on the previous frame.
//! 2. Damage closure: every visible leaf overlapping a queued region is
//!    scheduled for repaint and its own area is queued in turn, until
//!    nothing new is added. Overlapping siblings are therefore repainted in
//!    tree order, exactly as a full repaint would.
//! 3. The framebuffer erases all queued regions with the background color.
//! 4. [`render`](WidgetTree::render) repaints every scheduled widget.

use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::prelude::*;
use log::trace;

use crate::framebuffer::Framebuffer;
use crate::ui::core::{Rect, WidgetId};
use crate::ui::tree::{Paint, Widget, WidgetKind, WidgetTree};

/// Area a dirty canvas needs when only strokes changed it, in screen
/// coordinates. `None` means the whole widget repaints.
fn stroke_area(widget: &Widget) -> Option<Rect> {
    match &widget.kind {
        WidgetKind::Canvas(canvas) if !widget.invalidated => canvas
            .dirty_rect()
            .map(|r| r.offset(widget.bounds.x, widget.bounds.y)),
        _ => None,
    }
}

impl WidgetTree {
    /// Render one frame of the tree rooted at `root`.
    ///
    /// Does nothing when the tree is clean and nothing was destroyed since
    /// the previous frame.
    pub fn render_frame(&mut self, root: WidgetId, fb: &mut Framebuffer) {
        if !self.is_dirty(root) && self.orphaned.is_empty() {
            return;
        }

        self.handle_dirty(root, fb);
        for footprint in core::mem::take(&mut self.orphaned) {
            fb.push_dirty_rect(footprint);
        }
        self.schedule_damage(root, fb);

        trace!("Frame damage: {:?}", fb.dirty_rects());
        fb.clear_dirty_rects(self.background);
        self.render(root, fb);
    }

    /// Clear the framebuffer and repaint the whole tree.
    pub fn render_full(&mut self, root: WidgetId, fb: &mut Framebuffer) {
        self.orphaned.clear();
        fb.clear_dirty_rects(self.background);
        let Ok(()) = fb.clear(self.background);
        self.force_redraw(root);
        self.render(root, fb);
    }

    /// Mark every widget under `root` as changed so the next frame repaints
    /// the whole subtree.
    pub fn force_redraw(&mut self, root: WidgetId) {
        self.mark_dirty(root);
        let mut index = 0;
        while let Some(child) = self.child_at(root, index) {
            self.force_redraw(child);
            index += 1;
        }
    }

    /// Queue the regions that must be erased because widgets under `id`
    /// changed.
    ///
    /// A changed leaf queues the area it painted last frame. A canvas that
    /// only received strokes queues just the stroked area. A container
    /// queues its previous area only when it changed itself, not when it is
    /// dirty because of a descendant. Clean subtrees are skipped.
    pub fn handle_dirty(&self, id: WidgetId, fb: &mut Framebuffer) {
        let Some(widget) = self.get(id) else {
            return;
        };
        if !widget.dirty {
            return;
        }

        match &widget.kind {
            WidgetKind::Container(_) => {
                if widget.invalidated {
                    fb.push_dirty_rect(widget.prev);
                }
                let mut index = 0;
                while let Some(child) = self.child_at(id, index) {
                    self.handle_dirty(child, fb);
                    index += 1;
                }
            }
            _ => match stroke_area(widget) {
                Some(area) => {
                    fb.push_dirty_rect(area);
                }
                None => {
                    fb.push_dirty_rect(widget.prev);
                }
            },
        }
    }

    /// Grow the queued damage until every visible leaf touching it is
    /// scheduled and its repaint area is queued too.
    fn schedule_damage(&mut self, root: WidgetId, fb: &mut Framebuffer) {
        let mut leaves = Vec::new();
        self.collect_visible_leaves(root, &mut leaves);
        let mut damage: Vec<Rect> = fb.dirty_rects().to_vec();

        loop {
            let mut grew = false;
            for &leaf in &leaves {
                let Some(widget) = self.get(leaf) else {
                    continue;
                };
                let bounds = widget.bounds;

                let area = if widget.dirty {
                    match stroke_area(widget) {
                        // Damage from elsewhere reaching outside the stroked
                        // area forces a full canvas repaint.
                        Some(strokes)
                            if damage.iter().any(|d| {
                                d.intersection(&bounds)
                                    .is_some_and(|hit| !strokes.contains_rect(&hit))
                            }) =>
                        {
                            if let Some(widget) = self.get_mut(leaf) {
                                widget.invalidated = true;
                            }
                            bounds
                        }
                        Some(strokes) => strokes,
                        None => bounds,
                    }
                } else if damage.iter().any(|d| d.intersects(&bounds)) {
                    self.mark_dirty(leaf);
                    bounds
                } else {
                    continue;
                };

                if area.is_empty() || damage.iter().any(|d| d.contains_rect(&area)) {
                    continue;
                }
                fb.push_dirty_rect(area);
                damage.push(area);
                grew = true;
            }
            if !grew {
                break;
            }
        }
    }

    /// Visible leaves under `id` in paint order.
    fn collect_visible_leaves(&self, id: WidgetId, out: &mut Vec<WidgetId>) {
        let Some(widget) = self.get(id) else {
            return;
        };
        if !widget.visible {
            return;
        }
        if !matches!(widget.kind, WidgetKind::Container(_)) {
            out.push(id);
            return;
        }
        let mut index = 0;
        while let Some(child) = self.child_at(id, index) {
            self.collect_visible_leaves(child, out);
            index += 1;
        }
    }

    /// Paint every dirty, visible widget under `id` in tree order.
    ///
    /// Invisible subtrees are marked clean without painting. Painted widgets
    /// become clean and remember their current geometry.
    pub fn render(&mut self, id: WidgetId, fb: &mut Framebuffer) {
        let Some(widget) = self.get(id) else {
            return;
        };
        if !widget.visible {
            self.clean_hidden(id);
            return;
        }
        if !widget.dirty {
            return;
        }

        if matches!(widget.kind, WidgetKind::Container(_)) {
            let mut index = 0;
            while let Some(child) = self.child_at(id, index) {
                self.render(child, fb);
                index += 1;
            }
        } else {
            let Ok(()) = self.paint_leaf(id, fb);
        }

        if let Some(widget) = self.get_mut(id) {
            widget.dirty = false;
            widget.invalidated = false;
            widget.prev = widget.bounds;
            if let WidgetKind::Canvas(canvas) = &mut widget.kind {
                canvas.reset_dirty_rect();
            }
        }
    }

    fn paint_leaf(&self, id: WidgetId, fb: &mut Framebuffer) -> Result<(), Infallible> {
        let Some(widget) = self.get(id) else {
            return Ok(());
        };
        let bounds = widget.bounds;
        match &widget.kind {
            WidgetKind::Button(button) => button.paint(bounds, fb),
            WidgetKind::Label(label) => label.paint(bounds, fb),
            WidgetKind::Image(image) => image.paint(bounds, fb),
            WidgetKind::Canvas(canvas) => match canvas.dirty_rect() {
                Some(region) if !widget.invalidated => canvas.paint_region(bounds, region, fb),
                _ => canvas.paint(bounds, fb),
            },
            WidgetKind::Container(_) => Ok(()),
        }
    }

    /// Clean a hidden subtree. Hidden widgets leave no footprint behind.
    fn clean_hidden(&mut self, id: WidgetId) {
        let Some(widget) = self.get_mut(id) else {
            return;
        };
        widget.dirty = false;
        widget.invalidated = false;
        widget.prev = Rect::default();
        if let WidgetKind::Canvas(canvas) = &mut widget.kind {
            canvas.reset_dirty_rect();
        }

        let mut index = 0;
        while let Some(child) = self.child_at(id, index) {
            self.clean_hidden(child);
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::colors::{WHITE, YELLOW};
    use crate::ui::{Alignment, AnimationType, Image, LayoutType, TextSize};
    use crate::ui::components::Argb8888;
    use embedded_graphics::pixelcolor::Rgb565;

    const W: u32 = 240;
    const H: u32 = 160;

    fn assert_matches_full_repaint(tree: &mut WidgetTree, root: WidgetId, fb: &Framebuffer) {
        let mut reference = Framebuffer::new(W, H);
        tree.render_full(root, &mut reference);
        let mismatch = fb
            .physical_pixels()
            .iter()
            .zip(reference.physical_pixels())
            .position(|(a, b)| a != b);
        assert_eq!(
            mismatch, None,
            "incremental frame differs from a full repaint at buffer index {:?}",
            mismatch
        );
    }

    #[test]
    fn test_render_cleans_and_snapshots_geometry() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(W, H);
        let root = tree.create_container(0, 0, W as i32, H as i32, LayoutType::None);
        let button = tree.create_button(10, 10, 50, 20, "A");
        tree.add_child(root, button).unwrap();

        tree.render_frame(root, &mut fb);

        assert!(!tree.is_dirty(root));
        assert!(!tree.is_dirty(button));
        assert_eq!(tree.previous_geometry(button), tree.geometry(button));
    }

    #[test]
    fn test_clean_tree_touches_nothing() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(W, H);
        let button = tree.create_button(10, 10, 50, 20, "A");
        tree.render_frame(button, &mut fb);
        fb.put_pixel(20, 20, Rgb565::RED);

        tree.render_frame(button, &mut fb);

        assert_eq!(fb.pixel(20, 20), Some(Rgb565::RED));
    }

    #[test]
    fn test_force_redraw_repaints_everything() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(W, H);
        let root = tree.create_container(0, 0, W as i32, H as i32, LayoutType::None);
        let button = tree.create_button(10, 10, 50, 20, "A");
        tree.add_child(root, button).unwrap();
        tree.render_frame(root, &mut fb);
        fb.put_pixel(20, 20, Rgb565::RED);
        fb.put_pixel(200, 150, Rgb565::RED);

        tree.force_redraw(root);
        tree.render_frame(root, &mut fb);

        assert_ne!(fb.pixel(20, 20), Some(Rgb565::RED));
        assert_eq!(fb.pixel(200, 150), Some(tree.background()));
    }

    #[test]
    fn test_moved_widget_erases_old_area() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(W, H);
        let root = tree.create_container(0, 0, W as i32, H as i32, LayoutType::None);
        let button = tree.create_button(10, 10, 50, 20, "A");
        tree.add_child(root, button).unwrap();
        tree.render_frame(root, &mut fb);

        tree.set_position(button, 100, 100);
        tree.render_frame(root, &mut fb);

        assert_eq!(fb.pixel(20, 20), Some(tree.background()));
        assert_eq!(fb.pixel(120, 110), Some(tree.button(button).unwrap().background_color()));
    }

    #[test]
    fn test_hidden_and_destroyed_widgets_are_erased() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(W, H);
        let root = tree.create_container(0, 0, W as i32, H as i32, LayoutType::None);
        let hidden = tree.create_button(10, 10, 30, 30, "H");
        let doomed = tree.create_button(100, 10, 30, 30, "D");
        tree.add_child(root, hidden).unwrap();
        tree.add_child(root, doomed).unwrap();
        tree.render_frame(root, &mut fb);

        tree.set_visible(hidden, false);
        tree.destroy(doomed);
        tree.render_frame(root, &mut fb);

        assert_eq!(fb.pixel(20, 20), Some(tree.background()));
        assert_eq!(fb.pixel(110, 20), Some(tree.background()));
        assert_eq!(tree.previous_geometry(hidden), Some(Rect::default()));
    }

    #[test]
    fn test_showing_container_paints_children_added_while_hidden() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(W, H);
        let root = tree.create_container(0, 0, W as i32, H as i32, LayoutType::None);
        let panel = tree.create_container(20, 20, 100, 60, LayoutType::None);
        let early = tree.create_button(25, 50, 20, 20, "E");
        tree.add_child(root, panel).unwrap();
        tree.add_child(panel, early).unwrap();
        tree.render_full(root, &mut fb);

        tree.set_visible(panel, false);
        let late = tree.create_button(20, 20, 40, 20, "L");
        tree.add_child(panel, late).unwrap();
        tree.set_visible(early, true);
        tree.render_frame(root, &mut fb);
        assert_eq!(fb.pixel(30, 30), Some(tree.background()));

        tree.set_visible(panel, true);
        tree.render_frame(root, &mut fb);

        let face = tree.button(late).unwrap().background_color();
        assert_eq!(fb.pixel(30, 30), Some(face), "child added while hidden is painted");
        assert_matches_full_repaint(&mut tree, root, &fb);
    }

    #[test]
    fn test_child_change_does_not_erase_whole_container() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(W, H);
        let root = tree.create_container(0, 0, W as i32, H as i32, LayoutType::None);
        let label = tree.create_label_auto(10, 10, "1", TextSize::Medium);
        tree.add_child(root, label).unwrap();
        tree.render_frame(root, &mut fb);
        fb.put_pixel(200, 150, Rgb565::RED);

        tree.set_label_text(label, "2");
        tree.render_frame(root, &mut fb);

        assert_eq!(fb.pixel(200, 150), Some(Rgb565::RED), "outside any damage");
    }

    #[test]
    fn test_overlapping_sibling_keeps_z_order() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(W, H);
        let root = tree.create_container(0, 0, W as i32, H as i32, LayoutType::None);
        let below = tree.create_button(10, 10, 60, 40, "below");
        let above = tree.create_button(40, 30, 60, 40, "above");
        tree.add_child(root, below).unwrap();
        tree.add_child(root, above).unwrap();
        tree.set_button_background(above, YELLOW);
        tree.render_frame(root, &mut fb);

        tree.set_button_background(below, WHITE);
        tree.render_frame(root, &mut fb);

        assert_eq!(fb.pixel(60, 45), Some(YELLOW), "upper sibling stays on top");
        assert_eq!(fb.pixel(20, 20), Some(WHITE));
        assert!(!tree.is_dirty(above));
    }

    #[test]
    fn test_stroke_under_overlapping_widget_matches_full_repaint() {
        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(W, H);
        let root = tree.create_container(0, 0, W as i32, H as i32, LayoutType::None);
        let canvas = tree.create_canvas(20, 20, 100, 100);
        let badge = tree.create_button(50, 50, 30, 20, "");
        tree.add_child(root, canvas).unwrap();
        tree.add_child(root, badge).unwrap();
        tree.render_full(root, &mut fb);

        tree.draw_at(canvas, 52, 52);
        tree.draw_at(canvas, 30, 30);
        tree.render_frame(root, &mut fb);

        assert_eq!(fb.pixel(30, 30), Some(Rgb565::BLACK));
        assert_matches_full_repaint(&mut tree, root, &fb);
    }

    #[test]
    fn test_incremental_frames_match_full_repaint() {
        static SPRITE: [Argb8888; 16] = [Argb8888::new(128, 255, 0, 0); 16];

        let mut tree = WidgetTree::default();
        let mut fb = Framebuffer::new(W, H);
        let root = tree.create_container(0, 0, W as i32, H as i32, LayoutType::VBox);
        tree.set_padding(root, 4);
        tree.set_spacing(root, 4);
        tree.set_alignment(root, Alignment::Center);

        let title = tree.create_container(0, 0, 200, 24, LayoutType::HBox);
        let heading = tree.create_label_auto(0, 0, "Draw", TextSize::Large);
        tree.add_child(title, heading).unwrap();
        tree.set_animation(title, AnimationType::Floating);
        tree.add_child(root, title).unwrap();

        let canvas = tree.create_canvas(0, 0, 80, 60);
        tree.add_child(root, canvas).unwrap();

        let row = tree.create_container(0, 0, 200, 40, LayoutType::HBox);
        tree.set_spacing(row, 6);
        let clear = tree.create_button_auto(0, 0, "Clear", TextSize::Medium);
        let guess = tree.create_button_auto(0, 0, "Guess", TextSize::Medium);
        let sprite = tree.create_image(0, 0, Image::new(4, 4, &SPRITE));
        tree.add_child(row, clear).unwrap();
        tree.add_child(row, guess).unwrap();
        tree.add_child(row, sprite).unwrap();
        tree.add_child(root, row).unwrap();

        let result = tree.create_label_auto(0, 0, "?", TextSize::Medium);
        tree.add_child(root, result).unwrap();

        tree.render_full(root, &mut fb);

        let c = tree.geometry(canvas).unwrap();
        for step in 0..10 {
            tree.draw_at(canvas, c.x + 10 + step * 5, c.y + 20 + step);
        }
        tree.update(0.5);
        tree.render_frame(root, &mut fb);
        assert_matches_full_repaint(&mut tree, root, &fb);

        tree.set_label_text(result, "7");
        tree.label_auto_size(result);
        tree.set_button_background(guess, YELLOW);
        tree.update(0.5);
        tree.render_frame(root, &mut fb);
        assert_matches_full_repaint(&mut tree, root, &fb);

        tree.set_visible(clear, false);
        tree.update_layout(row);
        tree.set_image_border(sprite, WHITE, 1);
        tree.render_frame(root, &mut fb);
        assert_matches_full_repaint(&mut tree, root, &fb);

        tree.remove_child(row, guess).unwrap();
        tree.clear_canvas(canvas);
        tree.set_visible(clear, true);
        tree.update(1.0);
        tree.render_frame(root, &mut fb);
        assert_matches_full_repaint(&mut tree, root, &fb);
    }
}
