// src/ui/layouts/container.rs
//! Container widget: ordered children, layout parameters and the floating
//! animation

use alloc::vec::Vec;
use core::f32::consts::PI;

use log::debug;

use crate::ui::UiError;
use crate::ui::core::{Rect, WidgetId, WidgetType};
use crate::ui::layouts::engine::{Alignment, ChildSlot, LayoutParams, LayoutType, arrange};
use crate::ui::tree::{WidgetKind, WidgetTree};

/// Peak vertical displacement of the floating animation, in pixels
pub const FLOAT_AMPLITUDE: f32 = 4.0;

/// Default animation speed in degrees per second
const DEFAULT_ANIMATION_SPEED: i32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationType {
    #[default]
    None,
    /// Children bob up and down along a sine wave
    Floating,
}

#[derive(Debug, Clone, Copy)]
struct Animation {
    kind: AnimationType,
    /// Degrees, kept in `[0, 360)`
    phase: f32,
    speed: i32,
    offset: i32,
}

/// Payload of a container widget.
///
/// Containers paint nothing themselves; they own their children and decide
/// where those go.
#[derive(Debug, Clone)]
pub struct Container {
    children: Vec<WidgetId>,
    params: LayoutParams,
    animation: Animation,
}

impl Container {
    pub(crate) fn new(layout: LayoutType) -> Self {
        Self {
            children: Vec::with_capacity(8),
            params: LayoutParams {
                layout,
                ..LayoutParams::default()
            },
            animation: Animation {
                kind: AnimationType::None,
                phase: 0.0,
                speed: DEFAULT_ANIMATION_SPEED,
                offset: 0,
            },
        }
    }

    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    pub fn layout(&self) -> LayoutType {
        self.params.layout
    }

    pub fn spacing(&self) -> i32 {
        self.params.spacing
    }

    pub fn padding(&self) -> i32 {
        self.params.padding
    }

    pub fn alignment(&self) -> Alignment {
        self.params.alignment
    }

    pub fn justify(&self) -> Alignment {
        self.params.justify
    }

    pub fn grid_columns(&self) -> i32 {
        self.params.grid_columns
    }

    pub fn animation(&self) -> AnimationType {
        self.animation.kind
    }

    pub fn animation_speed(&self) -> i32 {
        self.animation.speed
    }

    /// Current vertical displacement applied to the children.
    pub fn animation_offset(&self) -> i32 {
        self.animation.offset
    }

    pub(crate) fn remove(&mut self, child: WidgetId) {
        self.children.retain(|&c| c != child);
    }

    pub(crate) fn into_children(self) -> Vec<WidgetId> {
        self.children
    }

    fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            y_offset: self.animation.offset,
            ..self.params
        }
    }

    /// Advance the phase by `dt` seconds and return the new offset.
    fn advance(&mut self, dt: f32) -> i32 {
        let phase = (self.animation.phase + self.animation.speed as f32 * dt) % 360.0;
        self.animation.phase = if phase < 0.0 { phase + 360.0 } else { phase };
        libm::roundf(libm::sinf(self.animation.phase * PI / 180.0) * FLOAT_AMPLITUDE) as i32
    }
}

impl WidgetTree {
    pub fn create_container(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        layout: LayoutType,
    ) -> WidgetId {
        self.insert(
            WidgetKind::Container(Container::new(layout)),
            Rect::new(x, y, width, height),
        )
    }

    /// Grid container with `columns` columns (at least one).
    pub fn create_grid(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        columns: i32,
    ) -> WidgetId {
        let id = self.create_container(x, y, width, height, LayoutType::Grid);
        self.set_grid_columns(id, columns);
        id
    }

    pub fn container(&self, id: WidgetId) -> Option<&Container> {
        match &self.get(id)?.kind {
            WidgetKind::Container(container) => Some(container),
            _ => None,
        }
    }

    fn container_mut(&mut self, id: WidgetId) -> Option<&mut Container> {
        let found = self.widget_type(id);
        match self.get_mut(id).map(|w| &mut w.kind) {
            Some(WidgetKind::Container(container)) => Some(container),
            _ => {
                Self::mismatch(id, WidgetType::Container, found);
                None
            }
        }
    }

    /// Append `child` to `container` and re-run the layout.
    pub fn add_child(&mut self, container: WidgetId, child: WidgetId) -> Result<(), UiError> {
        let Some(parent) = self.get(container) else {
            return Err(UiError::StaleWidget);
        };
        if !matches!(parent.kind, WidgetKind::Container(_)) {
            return Err(UiError::NotAContainer);
        }
        let Some(widget) = self.get(child) else {
            return Err(UiError::StaleWidget);
        };
        if widget.parent.is_some() {
            return Err(UiError::AlreadyParented);
        }

        let mut ancestor = Some(container);
        while let Some(current) = ancestor {
            if current == child {
                return Err(UiError::WouldCycle);
            }
            ancestor = self.parent(current);
        }

        if let Some(WidgetKind::Container(c)) = self.get_mut(container).map(|w| &mut w.kind) {
            c.children.push(child);
        }
        if let Some(widget) = self.get_mut(child) {
            widget.parent = Some(container);
        }

        self.mark_dirty(child);
        self.update_layout(container);
        Ok(())
    }

    /// Remove `child` from `container` and destroy it with its subtree.
    pub fn remove_child(&mut self, container: WidgetId, child: WidgetId) -> Result<(), UiError> {
        let Some(parent) = self.container(container) else {
            return Err(if self.contains(container) {
                UiError::NotAContainer
            } else {
                UiError::StaleWidget
            });
        };
        if !parent.children.contains(&child) {
            return Err(UiError::NotAChild);
        }

        self.destroy(child);
        Ok(())
    }

    /// Destroy every child of `container`.
    pub fn clear_children(&mut self, container: WidgetId) {
        let Some(c) = self.container_mut(container) else {
            return;
        };
        let children = core::mem::take(&mut c.children);
        if children.is_empty() {
            return;
        }

        let mut footprint = Rect::default();
        for child in children {
            footprint = footprint.union(&self.free_subtree(child));
        }
        if !footprint.is_empty() {
            self.orphaned.push(footprint);
        }
        self.propagate_dirty(container);
    }

    pub fn child_count(&self, container: WidgetId) -> usize {
        self.container(container).map_or(0, |c| c.children.len())
    }

    pub fn child(&self, container: WidgetId, index: usize) -> Option<WidgetId> {
        self.child_at(container, index)
    }

    pub fn children(&self, container: WidgetId) -> &[WidgetId] {
        self.container(container)
            .map(|c| c.children())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Layout parameters
    // ------------------------------------------------------------------

    /// Apply `f` to the layout parameters and re-run the layout if they changed.
    fn update_params<F>(&mut self, id: WidgetId, f: F)
    where
        F: FnOnce(&mut LayoutParams),
    {
        let Some(container) = self.container_mut(id) else {
            return;
        };
        let before = container.params;
        f(&mut container.params);
        if container.params != before {
            self.update_layout(id);
        }
    }

    pub fn set_layout_type(&mut self, id: WidgetId, layout: LayoutType) {
        self.update_params(id, |p| p.layout = layout);
    }

    pub fn set_spacing(&mut self, id: WidgetId, spacing: i32) {
        self.update_params(id, |p| p.spacing = spacing);
    }

    pub fn set_padding(&mut self, id: WidgetId, padding: i32) {
        self.update_params(id, |p| p.padding = padding);
    }

    pub fn set_alignment(&mut self, id: WidgetId, alignment: Alignment) {
        self.update_params(id, |p| p.alignment = alignment);
    }

    pub fn set_justify(&mut self, id: WidgetId, justify: Alignment) {
        self.update_params(id, |p| p.justify = justify);
    }

    /// Values below one are clamped to one.
    pub fn set_grid_columns(&mut self, id: WidgetId, columns: i32) {
        self.update_params(id, |p| p.grid_columns = columns.max(1));
    }

    /// Recompute child geometry from the current layout parameters.
    ///
    /// Children whose geometry changes are marked dirty, and nested
    /// containers re-run their own layout. [`LayoutType::None`] leaves the
    /// children untouched.
    pub fn update_layout(&mut self, id: WidgetId) {
        let Some(widget) = self.get(id) else {
            return;
        };
        let WidgetKind::Container(container) = &widget.kind else {
            return;
        };
        if container.params.layout == LayoutType::None {
            return;
        }

        let params = container.layout_params();
        let children = container.children.clone();
        let slots: Vec<ChildSlot> = children
            .iter()
            .map(|&child| {
                self.get(child).map_or(ChildSlot::default(), |w| ChildSlot {
                    width: w.bounds.width,
                    height: w.bounds.height,
                    visible: w.visible,
                })
            })
            .collect();

        let placements = arrange(&params, widget.bounds, &slots);
        for (child, placement) in children.into_iter().zip(placements) {
            if let Some(rect) = placement {
                self.set_geometry(child, rect);
            }
        }
    }

    // ------------------------------------------------------------------
    // Animation
    // ------------------------------------------------------------------

    /// Start or stop the floating animation. Stopping resets the phase and
    /// moves the children back to rest.
    pub fn set_animation(&mut self, id: WidgetId, kind: AnimationType) {
        let Some(container) = self.container_mut(id) else {
            return;
        };
        if container.animation.kind == kind {
            return;
        }
        container.animation.kind = kind;
        if kind == AnimationType::None {
            container.animation.phase = 0.0;
            self.apply_animation_offset(id, 0);
        }
    }

    /// Speed in degrees per second; negative values run the wave backwards.
    pub fn set_animation_speed(&mut self, id: WidgetId, speed: i32) {
        if let Some(container) = self.container_mut(id) {
            container.animation.speed = speed;
        }
    }

    /// Advance one container's animation by `dt` seconds.
    pub fn update_animation(&mut self, id: WidgetId, dt: f32) {
        let Some(WidgetKind::Container(container)) = self.get_mut(id).map(|w| &mut w.kind) else {
            return;
        };
        if container.animation.kind == AnimationType::None {
            return;
        }
        let offset = container.advance(dt);
        self.apply_animation_offset(id, offset);
    }

    fn apply_animation_offset(&mut self, id: WidgetId, offset: i32) {
        let Some(WidgetKind::Container(container)) = self.get_mut(id).map(|w| &mut w.kind) else {
            return;
        };
        let delta = offset - container.animation.offset;
        if delta == 0 {
            return;
        }
        container.animation.offset = offset;

        if container.params.layout != LayoutType::None {
            self.update_layout(id);
            return;
        }

        let children = container.children.clone();
        for child in children {
            if let Some(bounds) = self.geometry(child) {
                self.set_position(child, bounds.x, bounds.y + delta);
            }
        }
    }

    /// Advance every animated container by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for id in self.live_ids() {
            let animated = self
                .container(id)
                .is_some_and(|c| c.animation.kind != AnimationType::None);
            if animated {
                self.update_animation(id, dt);
            }
        }
        debug!("Advanced animations by {}s", dt);
    }
}
