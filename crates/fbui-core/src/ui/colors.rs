//! Color definitions shared by the built-in widgets
//!
//! All widget colors are RGB565, the native format of most SPI panels.
//!
//! To convert from 8-bit RGB: R>>3, G>>2, B>>3

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

/// Default screen background used to erase dirty regions
pub const COLOR_BACKGROUND: Rgb565 = Rgb565::new(50 >> 3, 50 >> 2, 50 >> 3);

pub const BLACK: Rgb565 = Rgb565::BLACK;

pub const WHITE: Rgb565 = Rgb565::WHITE;

/// Light gray used as the default button face
pub const GRAY_75: Rgb565 = Rgb565::new(0xC0 >> 3, 0xC0 >> 2, 0xC0 >> 3);

/// Accent yellow used for titles
pub const YELLOW: Rgb565 = Rgb565::new(255 >> 3, 209 >> 2, 57 >> 3);
