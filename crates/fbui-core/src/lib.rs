//! Hardware-independent core of the fbui widget toolkit
//!
//! This crate contains a small retained-mode UI system for pixel framebuffers:
//! a widget tree, pluggable container layouts, dirty-rectangle tracking, and an
//! incremental renderer that repaints only the regions that changed since the
//! previous frame.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (panel framebuffers) and desktop hosts (for the simulator
//! and tests).

#![no_std]

extern crate alloc;

pub mod config;
pub mod framebuffer;
pub mod ui;

pub use config::UiConfig;
pub use framebuffer::{Framebuffer, MAX_DIRTY_RECTS, Orientation};
