// src/ui/layouts/engine.rs
//! Pure layout arithmetic
//!
//! [`arrange`] maps a container's bounds, its parameters and the current size
//! of each child to the rectangles the children should occupy. It never
//! touches the widget tree, which keeps the formulas testable on their own.
//!
//! All arithmetic is signed integer arithmetic with truncating division,
//! saturating at the `i32` range. Oversized padding or spacing produces
//! negative available space and therefore zero or negative child sizes;
//! those are kept as-is.

use alloc::vec;
use alloc::vec::Vec;

use crate::ui::core::Rect;

/// How a container positions its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutType {
    /// Children keep whatever geometry they were given
    #[default]
    None,
    /// Left to right
    HBox,
    /// Top to bottom
    VBox,
    /// Row-major cells of equal size
    Grid,
}

/// Placement of children along an axis.
///
/// Used both for the cross axis (`alignment`) and the main axis (`justify`).
/// On the main axis `Stretch` behaves like `Start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Align to start (left for horizontal, top for vertical)
    #[default]
    Start,
    Center,
    /// Align to end (right for horizontal, bottom for vertical)
    End,
    /// Fill the available cross-axis space
    Stretch,
}

/// Main axis of a box layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Direction {
    /// `(main origin, main length, cross origin, cross length)` of a rectangle.
    fn split(self, rect: Rect) -> (i32, i32, i32, i32) {
        match self {
            Direction::Horizontal => (rect.x, rect.width, rect.y, rect.height),
            Direction::Vertical => (rect.y, rect.height, rect.x, rect.width),
        }
    }

    fn main(self, child: &ChildSlot) -> i32 {
        match self {
            Direction::Horizontal => child.width,
            Direction::Vertical => child.height,
        }
    }

    fn cross(self, child: &ChildSlot) -> i32 {
        match self {
            Direction::Horizontal => child.height,
            Direction::Vertical => child.width,
        }
    }

    fn join(self, main_pos: i32, main_len: i32, cross_pos: i32, cross_len: i32) -> Rect {
        match self {
            Direction::Horizontal => Rect::new(main_pos, cross_pos, main_len, cross_len),
            Direction::Vertical => Rect::new(cross_pos, main_pos, cross_len, main_len),
        }
    }
}

/// Everything about a container that influences where its children go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutParams {
    pub layout: LayoutType,
    pub spacing: i32,
    pub padding: i32,
    pub alignment: Alignment,
    pub justify: Alignment,
    pub grid_columns: i32,
    /// Added to every computed `y`, used by the floating animation
    pub y_offset: i32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            layout: LayoutType::None,
            spacing: 0,
            padding: 0,
            alignment: Alignment::Start,
            justify: Alignment::Start,
            grid_columns: 2,
            y_offset: 0,
        }
    }
}

/// Current size and visibility of one child, as seen by the layout.
///
/// A size of zero or less on the main axis asks for an equal share of the
/// leftover space; on the cross axis it asks for the full available extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChildSlot {
    pub width: i32,
    pub height: i32,
    pub visible: bool,
}

/// Compute the geometry of every child.
///
/// The result is parallel to `children`. `None` means the child is left where
/// it is: every child for [`LayoutType::None`], invisible children for the box
/// layouts. Grid cells are assigned to all children, visible or not.
pub fn arrange(params: &LayoutParams, bounds: Rect, children: &[ChildSlot]) -> Vec<Option<Rect>> {
    match params.layout {
        LayoutType::None => vec![None; children.len()],
        LayoutType::HBox => arrange_box(params, bounds, children, Direction::Horizontal),
        LayoutType::VBox => arrange_box(params, bounds, children, Direction::Vertical),
        LayoutType::Grid => arrange_grid(params, bounds, children),
    }
}

fn arrange_box(
    params: &LayoutParams,
    bounds: Rect,
    children: &[ChildSlot],
    direction: Direction,
) -> Vec<Option<Rect>> {
    let mut placements = vec![None; children.len()];
    let visible_count = children.iter().filter(|c| c.visible).count() as i32;
    if visible_count == 0 {
        return placements;
    }

    let (main_origin, main_len, cross_origin, cross_len) = direction.split(bounds);
    let gaps = (visible_count - 1).saturating_mul(params.spacing);
    let both_pads = params.padding.saturating_mul(2);
    let available_main = main_len.saturating_sub(both_pads).saturating_sub(gaps);
    let available_cross = cross_len.saturating_sub(both_pads);

    let mut total_fixed: i32 = 0;
    let mut flexible_count: i32 = 0;
    for child in children.iter().filter(|c| c.visible) {
        let size = direction.main(child);
        if size > 0 {
            total_fixed = total_fixed.saturating_add(size);
        } else {
            flexible_count += 1;
        }
    }
    let flexible_size = if flexible_count > 0 {
        available_main.saturating_sub(total_fixed) / flexible_count
    } else {
        0
    };

    let total_content = total_fixed
        .saturating_add(flexible_count.saturating_mul(flexible_size))
        .saturating_add(gaps);
    let mut cursor = main_origin.saturating_add(params.padding);
    if total_content < available_main {
        match params.justify {
            Alignment::Center => {
                cursor = main_origin.saturating_add(main_len.saturating_sub(total_content) / 2)
            }
            Alignment::End => {
                cursor = main_origin
                    .saturating_add(main_len)
                    .saturating_sub(params.padding)
                    .saturating_sub(total_content)
            }
            Alignment::Start | Alignment::Stretch => {}
        }
    }

    let cross_start = cross_origin.saturating_add(params.padding);
    for (child, placement) in children.iter().zip(placements.iter_mut()) {
        if !child.visible {
            continue;
        }

        let requested_main = direction.main(child);
        let child_main = if requested_main > 0 {
            requested_main
        } else {
            flexible_size
        };

        let requested_cross = direction.cross(child);
        let child_cross = match params.alignment {
            Alignment::Stretch => available_cross,
            _ if requested_cross > 0 => requested_cross,
            _ => available_cross,
        };
        let cross_pos = match params.alignment {
            Alignment::Start | Alignment::Stretch => cross_start,
            Alignment::Center => {
                cross_start.saturating_add(available_cross.saturating_sub(child_cross) / 2)
            }
            Alignment::End => cross_start
                .saturating_add(available_cross)
                .saturating_sub(child_cross),
        };

        let rect = direction.join(cursor, child_main, cross_pos, child_cross);
        *placement = Some(rect.offset(0, params.y_offset));
        cursor = cursor.saturating_add(child_main).saturating_add(params.spacing);
    }

    placements
}

fn arrange_grid(params: &LayoutParams, bounds: Rect, children: &[ChildSlot]) -> Vec<Option<Rect>> {
    if children.is_empty() {
        return Vec::new();
    }

    let columns = params.grid_columns.max(1);
    let count = children.len() as i32;
    let rows = (count - 1) / columns + 1;

    let both_pads = params.padding.saturating_mul(2);
    let available_width = bounds
        .width
        .saturating_sub(both_pads)
        .saturating_sub((columns - 1).saturating_mul(params.spacing));
    let available_height = bounds
        .height
        .saturating_sub(both_pads)
        .saturating_sub((rows - 1).saturating_mul(params.spacing));
    let cell_width = available_width / columns;
    let cell_height = available_height / rows;

    children
        .iter()
        .enumerate()
        .map(|(i, child)| {
            let i = i as i32;
            let (row, col) = (i / columns, i % columns);
            let mut x = bounds
                .x
                .saturating_add(params.padding)
                .saturating_add(col.saturating_mul(cell_width.saturating_add(params.spacing)));
            let mut y = bounds
                .y
                .saturating_add(params.padding)
                .saturating_add(row.saturating_mul(cell_height.saturating_add(params.spacing)));
            let mut width = cell_width;
            let mut height = cell_height;

            match params.alignment {
                Alignment::Stretch => {}
                Alignment::Center => {
                    if child.width > 0 && child.width < cell_width {
                        x = x.saturating_add((cell_width - child.width) / 2);
                        width = child.width;
                    }
                    if child.height > 0 && child.height < cell_height {
                        y = y.saturating_add((cell_height - child.height) / 2);
                        height = child.height;
                    }
                }
                Alignment::Start | Alignment::End => {
                    if child.width > 0 {
                        width = child.width;
                    }
                    if child.height > 0 {
                        height = child.height;
                    }
                }
            }

            Some(Rect::new(x, y.saturating_add(params.y_offset), width, height))
        })
        .collect()
}
