// src/ui/components/mod.rs
//! Leaf widgets: buttons, labels, images and the drawing canvas

pub mod button;
pub mod canvas;
pub mod image;
pub mod label;
pub mod text;

pub use button::{BUTTON_TEXT_CAPACITY, Button};
pub use canvas::{
    CLASSIFIER_INPUT_LEN, CLASSIFIER_INPUT_SIDE, Canvas, ClassifierInput, ResampleFilter,
};
pub use image::{Argb8888, Image, ImageWidget};
pub use label::{LABEL_TEXT_CAPACITY, Label};
pub use text::{TextSize, draw_text};

/// Store `value` in `slot`, reporting whether it differed.
pub(crate) fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
