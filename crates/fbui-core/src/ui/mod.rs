// src/ui/mod.rs
//! fbui UI system - retained widget tree for framebuffer displays
//!
//! This module provides:
//! - A generational widget arena with parent back-references
//! - Layout containers (hbox, vbox, grid) with spacing, padding, alignment
//! - Thin widgets (buttons, labels, images) and a drawing canvas
//! - Dirty region tracking and an erase-then-repaint frame pipeline

pub mod colors;
pub mod components;
pub mod core;
pub mod error;
pub mod layouts;
pub mod primitives;
pub mod render;
pub mod tree;

// Re-export commonly used items
pub use components::{
    Argb8888, Button, CLASSIFIER_INPUT_LEN, CLASSIFIER_INPUT_SIDE, Canvas, ClassifierInput,
    Image, ImageWidget, Label, ResampleFilter, TextSize,
};
pub use self::core::{Rect, WidgetId, WidgetType};
pub use error::UiError;
pub use layouts::{Alignment, AnimationType, Container, LayoutType};
pub use tree::{ClickHandler, WidgetTree};
