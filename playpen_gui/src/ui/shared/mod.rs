//! Shared UI components
//!
//! Contains:
//! - `divider` - Draggable divider between the two home panels
//! - `sketch_canvas` - Canvas program that renders and records strokes

pub mod divider;
pub mod sketch_canvas;
