//! UI module for Playpen GUI
//!
//! # Page Structure
//! - `layout` - Header with navigation and account links, content slot, not-found page
//! - `home` - Code panel and canvas panel split by the divider
//! - `code_panel` - Editor, language selector, Run button, console
//! - `canvas_panel` - Palette, drawing toggle, clear, drawing surface
//! - `about` - Static description
//! - `report` - Bug report form with clipboard copy
//!
//! # Shared Components
//! - `shared/divider` - Draggable vertical divider
//! - `shared/sketch_canvas` - Canvas program for freehand strokes

pub mod layout;
pub mod home;
pub mod code_panel;
pub mod canvas_panel;
pub mod about;
pub mod report;

pub mod shared;

use iced::Color;
use playpen_core::Rgb;

/// Convert a config color for rendering
pub fn to_color(rgb: Rgb) -> Color {
    Color::from_rgb8(rgb.r, rgb.g, rgb.b)
}
