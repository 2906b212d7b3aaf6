// src/ui/primitives.rs
//! Drawing helpers shared by the widgets: filled and stroked rectangles,
//! and alpha-blended sprite blits

use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, StrokeAlignment};

use crate::framebuffer::Framebuffer;
use crate::ui::components::{Argb8888, Image};
use crate::ui::core::Rect;

pub fn fill_rect<D>(target: &mut D, rect: Rect, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    if rect.is_empty() {
        return Ok(());
    }
    target.fill_solid(&rect.to_rectangle(), color)
}

/// Outline drawn entirely inside `rect`. A thickness of zero draws nothing.
pub fn stroke_rect<D>(target: &mut D, rect: Rect, color: Rgb565, thickness: i32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    if thickness <= 0 || rect.is_empty() {
        return Ok(());
    }

    let style = PrimitiveStyleBuilder::new()
        .stroke_color(color)
        .stroke_width(thickness as u32)
        .stroke_alignment(StrokeAlignment::Inside)
        .build();
    rect.to_rectangle().into_styled(style).draw(target)
}

/// Composite one sprite pixel over a framebuffer pixel.
///
/// Alpha 0 keeps `dst`, alpha 255 replaces it, anything in between mixes the
/// 8-bit channels as `(src * a + dst * (255 - a)) / 255`.
pub fn blend(src: Argb8888, dst: Rgb565) -> Rgb565 {
    let alpha = src.alpha() as u16;
    match alpha {
        0 => dst,
        255 => Rgb565::from(Rgb888::new(src.red(), src.green(), src.blue())),
        _ => {
            let dst = Rgb888::from(dst);
            let inv = 255 - alpha;
            let mix = |s: u8, d: u8| ((s as u16 * alpha + d as u16 * inv) / 255) as u8;
            Rgb565::from(Rgb888::new(
                mix(src.red(), dst.r()),
                mix(src.green(), dst.g()),
                mix(src.blue(), dst.b()),
            ))
        }
    }
}

/// Blit `image` with its top-left corner at `(x, y)`, touching only pixels
/// inside `clip`.
pub fn blit_image(fb: &mut Framebuffer, x: i32, y: i32, image: &Image, clip: Rect) {
    let area = Rect::new(x, y, image.width, image.height);
    let Some(visible) = area.intersection(&clip) else {
        return;
    };

    for py in visible.y..visible.bottom() {
        for px in visible.x..visible.right() {
            let Some(src) = image.pixel(px - x, py - y) else {
                continue;
            };
            if src.alpha() == 0 {
                continue;
            }
            if let Some(dst) = fb.pixel(px, py) {
                fb.put_pixel(px, py, blend(src, dst));
            }
        }
    }
}
