// src/ui/tree.rs
//! Widget arena: ownership, parent links, geometry and dirty propagation
//!
//! Every widget lives in a slot of the [`WidgetTree`]. Containers own their
//! children through ordered lists of [`WidgetId`]s; each widget keeps a
//! non-owning `parent` handle that is only used to walk upward when a change
//! has to be propagated.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use log::{debug, trace};

use crate::config::{CanvasConfig, UiConfig};
use crate::framebuffer::Framebuffer;
use crate::ui::components::{Button, Canvas, ImageWidget, Label};
use crate::ui::core::{Rect, WidgetId, WidgetType};
use crate::ui::layouts::Container;

/// Click handler attached to a widget.
///
/// Anything the handler needs (flags, channels, counters) is captured by the
/// closure. Handlers receive the id of the widget that was hit, never the tree.
pub type ClickHandler = Box<dyn FnMut(WidgetId)>;

/// Paint a widget's variant-specific content inside its bounds.
///
/// Implementations must not touch pixels outside `bounds`; the renderer relies
/// on that to repaint only damaged regions.
pub(crate) trait Paint {
    fn paint(&self, bounds: Rect, fb: &mut Framebuffer) -> Result<(), Infallible>;
}

/// Variant payload of a widget.
pub(crate) enum WidgetKind {
    Button(Button),
    Label(Label),
    Canvas(Canvas),
    Container(Container),
    Image(ImageWidget),
}

impl WidgetKind {
    pub(crate) fn widget_type(&self) -> WidgetType {
        match self {
            WidgetKind::Button(_) => WidgetType::Button,
            WidgetKind::Label(_) => WidgetType::Label,
            WidgetKind::Canvas(_) => WidgetType::Canvas,
            WidgetKind::Container(_) => WidgetType::Container,
            WidgetKind::Image(_) => WidgetType::Image,
        }
    }
}

pub(crate) struct Widget {
    pub(crate) kind: WidgetKind,
    pub(crate) bounds: Rect,
    /// Bounds at the last render that painted this widget
    pub(crate) prev: Rect,
    pub(crate) visible: bool,
    pub(crate) enabled: bool,
    pub(crate) dirty: bool,
    /// The widget itself changed, as opposed to being dirty only because a
    /// descendant did. Invalidated widgets erase and repaint their full bounds.
    pub(crate) invalidated: bool,
    pub(crate) parent: Option<WidgetId>,
    on_click: Option<ClickHandler>,
}

struct Slot {
    generation: u32,
    widget: Option<Widget>,
}

/// Owner of every widget and the entry point for all widget operations.
///
/// Operations on a stale handle, or variant-specific operations on a widget of
/// another type, are silent no-ops: a display loop never crashes because of a
/// bad handle.
pub struct WidgetTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    pub(crate) background: Rgb565,
    pub(crate) canvas_defaults: CanvasConfig,
    /// Footprints of destroyed widgets that still need erasing
    pub(crate) orphaned: Vec<Rect>,
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new(&UiConfig::default())
    }
}

impl WidgetTree {
    pub fn new(config: &UiConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            background: config.background_color(),
            canvas_defaults: config.canvas,
            orphaned: Vec::new(),
        }
    }

    /// Color used to erase dirty regions.
    pub fn background(&self) -> Rgb565 {
        self.background
    }

    /// Change the erase color. Call [`force_redraw`](Self::force_redraw) on the
    /// root afterwards to apply it to the whole screen.
    pub fn set_background(&mut self, color: Rgb565) {
        self.background = color;
    }

    /// Number of live widgets.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn insert(&mut self, kind: WidgetKind, bounds: Rect) -> WidgetId {
        let widget = Widget {
            kind,
            bounds,
            prev: Rect::default(),
            visible: true,
            enabled: true,
            dirty: true,
            invalidated: true,
            parent: None,
            on_click: None,
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.widget = Some(widget);
            return WidgetId {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            widget: Some(widget),
        });
        WidgetId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    pub(crate) fn get(&self, id: WidgetId) -> Option<&Widget> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.widget.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.widget.as_mut())
    }

    /// Handles of every live widget, in slot order.
    pub(crate) fn live_ids(&self) -> Vec<WidgetId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.widget.is_some())
            .map(|(index, slot)| WidgetId {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    /// Child `index` of a container, `None` past the end or for other widgets.
    pub(crate) fn child_at(&self, id: WidgetId, index: usize) -> Option<WidgetId> {
        match &self.get(id)?.kind {
            WidgetKind::Container(container) => container.children().get(index).copied(),
            _ => None,
        }
    }

    pub(crate) fn mismatch(id: WidgetId, expected: WidgetType, found: Option<WidgetType>) {
        debug!(
            "Ignoring {:?} operation on {:?} (found {:?})",
            expected, id, found
        );
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn widget_type(&self, id: WidgetId) -> Option<WidgetType> {
        self.get(id).map(|w| w.kind.widget_type())
    }

    pub fn geometry(&self, id: WidgetId) -> Option<Rect> {
        self.get(id).map(|w| w.bounds)
    }

    /// Geometry snapshot taken the last time the widget was painted.
    pub fn previous_geometry(&self, id: WidgetId) -> Option<Rect> {
        self.get(id).map(|w| w.prev)
    }

    pub fn is_dirty(&self, id: WidgetId) -> bool {
        self.get(id).is_some_and(|w| w.dirty)
    }

    pub fn is_visible(&self, id: WidgetId) -> bool {
        self.get(id).is_some_and(|w| w.visible)
    }

    pub fn is_enabled(&self, id: WidgetId) -> bool {
        self.get(id).is_some_and(|w| w.enabled)
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.get(id).and_then(|w| w.parent)
    }

    // ------------------------------------------------------------------
    // Dirty tracking
    // ------------------------------------------------------------------

    /// Mark a widget as changed and every ancestor as dirty.
    ///
    /// Propagation completes before this returns.
    pub fn mark_dirty(&mut self, id: WidgetId) {
        if let Some(widget) = self.get_mut(id) {
            widget.invalidated = true;
        }
        self.propagate_dirty(id);
    }

    /// Set the dirty flag on `id` and all of its ancestors without marking
    /// the widget itself as changed.
    pub(crate) fn propagate_dirty(&mut self, id: WidgetId) {
        let mut current = Some(id);
        while let Some(cur) = current {
            let Some(widget) = self.get_mut(cur) else {
                break;
            };
            widget.dirty = true;
            current = widget.parent;
        }
    }

    // ------------------------------------------------------------------
    // Geometry and flags
    // ------------------------------------------------------------------

    pub fn set_position(&mut self, id: WidgetId, x: i32, y: i32) {
        let Some(bounds) = self.geometry(id) else {
            return;
        };
        self.set_geometry(id, Rect::new(x, y, bounds.width, bounds.height));
    }

    pub fn set_size(&mut self, id: WidgetId, width: i32, height: i32) {
        let Some(bounds) = self.geometry(id) else {
            return;
        };
        self.set_geometry(id, Rect::new(bounds.x, bounds.y, width, height));
    }

    /// Move and resize in one step.
    ///
    /// Identical geometry is a no-op and leaves the dirty flag untouched. A
    /// resized canvas reallocates (and clears) its raster; a container re-runs
    /// its layout.
    pub fn set_geometry(&mut self, id: WidgetId, bounds: Rect) {
        let Some(widget) = self.get_mut(id) else {
            return;
        };
        if widget.bounds == bounds {
            return;
        }

        let resized = widget.bounds.width != bounds.width || widget.bounds.height != bounds.height;
        widget.bounds = bounds;
        if resized && let WidgetKind::Canvas(canvas) = &mut widget.kind {
            canvas.resize(bounds.width, bounds.height);
        }
        let is_container = matches!(widget.kind, WidgetKind::Container(_));

        self.mark_dirty(id);
        if is_container {
            self.update_layout(id);
        }
    }

    /// Show or hide a widget. Containers apply the same visibility to all
    /// descendants first.
    ///
    /// Showing repaints the whole subtree: descendants cleaned while an
    /// ancestor was hidden hold no footprint and no dirty flag.
    pub fn set_visible(&mut self, id: WidgetId, visible: bool) {
        let Some(widget) = self.get(id) else {
            return;
        };
        if widget.visible == visible {
            return;
        }

        let mut index = 0;
        while let Some(child) = self.child_at(id, index) {
            self.set_visible(child, visible);
            index += 1;
        }

        if let Some(widget) = self.get_mut(id) {
            widget.visible = visible;
        }
        if visible {
            self.force_redraw(id);
        } else {
            self.mark_dirty(id);
        }
    }

    /// Enable or disable click handling. Has no visual effect.
    pub fn set_enabled(&mut self, id: WidgetId, enabled: bool) {
        if let Some(widget) = self.get_mut(id) {
            widget.enabled = enabled;
        }
    }

    pub fn contains_point(&self, id: WidgetId, x: i32, y: i32) -> bool {
        self.get(id).is_some_and(|w| w.bounds.contains_point(x, y))
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    pub fn set_on_click<F>(&mut self, id: WidgetId, handler: F)
    where
        F: FnMut(WidgetId) + 'static,
    {
        if let Some(widget) = self.get_mut(id) {
            widget.on_click = Some(Box::new(handler));
        }
    }

    pub fn clear_on_click(&mut self, id: WidgetId) {
        if let Some(widget) = self.get_mut(id) {
            widget.on_click = None;
        }
    }

    /// Deliver a click at `(x, y)` to `id` and, for containers, to every
    /// descendant.
    ///
    /// Each visible, enabled widget containing the point fires its handler.
    /// Children are tested independently of their container, so stacked
    /// widgets can all receive the same click. Returns the number of handlers
    /// fired.
    pub fn handle_click(&mut self, id: WidgetId, x: i32, y: i32) -> usize {
        let Some(widget) = self.get_mut(id) else {
            return 0;
        };
        if !widget.visible || !widget.enabled {
            return 0;
        }

        let mut fired = 0;
        if widget.bounds.contains_point(x, y)
            && let Some(mut handler) = widget.on_click.take()
        {
            trace!("Click at ({}, {}) hit {:?}", x, y, id);
            handler(id);
            fired += 1;
            if let Some(widget) = self.get_mut(id) {
                widget.on_click = Some(handler);
            }
        }

        let mut index = 0;
        while let Some(child) = self.child_at(id, index) {
            fired += self.handle_click(child, x, y);
            index += 1;
        }
        fired
    }

    // ------------------------------------------------------------------
    // Lifetime
    // ------------------------------------------------------------------

    /// Destroy a widget and its whole subtree.
    ///
    /// The widget is detached from its parent, which is re-laid-out. Whatever
    /// the subtree last painted is erased on the next frame.
    pub fn destroy(&mut self, id: WidgetId) {
        let Some(widget) = self.get(id) else {
            return;
        };

        if let Some(parent) = widget.parent {
            if let Some(WidgetKind::Container(container)) =
                self.get_mut(parent).map(|w| &mut w.kind)
            {
                container.remove(id);
            }
            self.propagate_dirty(parent);
            self.update_layout(parent);
        }

        let footprint = self.free_subtree(id);
        if !footprint.is_empty() {
            self.orphaned.push(footprint);
        }
    }

    /// Release `id` and its descendants, returning the union of their last
    /// painted footprints.
    pub(crate) fn free_subtree(&mut self, id: WidgetId) -> Rect {
        let Some(slot) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
        else {
            return Rect::default();
        };
        let Some(widget) = slot.widget.take() else {
            return Rect::default();
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        let mut footprint = widget.prev;
        if let WidgetKind::Container(container) = widget.kind {
            for child in container.into_children() {
                footprint = footprint.union(&self.free_subtree(child));
            }
        }
        footprint
    }
}
