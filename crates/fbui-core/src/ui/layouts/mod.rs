// src/ui/layouts/mod.rs
//! Layout containers and the arithmetic that places their children

pub mod container;
pub mod engine;

pub use container::{AnimationType, Container, FLOAT_AMPLITUDE};
pub use engine::{Alignment, ChildSlot, Direction, LayoutParams, LayoutType, arrange};
