//! Toolkit configuration
//!
//! A `UiConfig` describes the display and the defaults new widgets start
//! with. It is plain `serde` data and can be persisted with `postcard`, e.g.
//! to flash or an SD card.

use alloc::format;
use alloc::vec::Vec;

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use serde::{Deserialize, Serialize};

use crate::framebuffer::Orientation;
use crate::ui::UiError;
use crate::ui::colors::COLOR_BACKGROUND;
use crate::ui::components::text::truncated;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UiConfig {
    pub display: DisplayConfig,
    pub canvas: CanvasConfig,
    /// RGB565 color used to erase dirty regions
    pub background: u16,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
}

/// Defaults applied to every canvas created by a tree.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CanvasConfig {
    pub brush_size: i32,
    pub border_thickness: i32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            canvas: CanvasConfig::default(),
            background: COLOR_BACKGROUND.into_storage(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 480,
            height: 272,
            orientation: Orientation::Landscape,
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            brush_size: 3,
            border_thickness: 2,
        }
    }
}

impl UiConfig {
    pub fn background_color(&self) -> Rgb565 {
        Rgb565::from(RawU16::new(self.background))
    }

    pub fn with_background(mut self, color: Rgb565) -> Self {
        self.background = color.into_storage();
        self
    }

    pub fn with_display_size(mut self, width: u32, height: u32) -> Self {
        self.display.width = width;
        self.display.height = height;
        self
    }

    /// Decode a configuration previously written with [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, UiError> {
        postcard::from_bytes(bytes).map_err(config_error)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, UiError> {
        postcard::to_allocvec(self).map_err(config_error)
    }
}

fn config_error(err: postcard::Error) -> UiError {
    UiError::Config(truncated(&format!("{}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::*;

    #[test]
    fn test_config_survives_postcard() {
        let config = UiConfig::default()
            .with_display_size(320, 240)
            .with_background(Rgb565::BLUE);

        let bytes = config.to_bytes().unwrap();
        let decoded = UiConfig::from_bytes(&bytes).unwrap();

        assert_eq!(decoded, config);
        assert_eq!(decoded.background_color(), Rgb565::BLUE);
    }

    #[test]
    fn test_truncated_bytes_are_a_config_error() {
        let bytes = UiConfig::default().to_bytes().unwrap();

        let err = UiConfig::from_bytes(&bytes[..2]).unwrap_err();

        assert!(matches!(err, UiError::Config(ref m) if !m.is_empty()), "{:?}", err);
    }

    #[test]
    fn test_error_message_keeps_a_prefix() {
        for err in [
            postcard::Error::DeserializeUnexpectedEnd,
            postcard::Error::SerdeDeCustom,
            postcard::Error::WontImplement,
        ] {
            let full = format!("{}", err);
            let UiError::Config(message) = config_error(err) else {
                panic!("postcard errors map to UiError::Config");
            };
            assert!(!message.is_empty(), "message for {:?} was dropped", full);
            assert!(full.starts_with(message.as_str()));
        }
    }
}
