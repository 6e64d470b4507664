//! # Split Layout
//!
//! Two panels side by side, sized by a single percentage: the left panel's
//! share of the container width. The divider between them is dragged with the
//! pointer; [`SplitLayout`] turns pointer positions into a new ratio.
//!
//! The ratio never leaves `[min, max]` (10..=90 by default), whatever the
//! pointer does.
//!
//! ```rust
//! use playpen_core::split::{SplitBounds, SplitLayout};
//!
//! let mut split = SplitLayout::new(50.0, SplitBounds::default());
//!
//! // Divider sits at 500px in a 1000px container; drag it 900px to the right
//! split.begin_drag(500.0, 500.0);
//! split.on_pointer_move(1400.0, 1000.0);
//! assert_eq!(split.ratio(), 90.0);
//!
//! split.end_drag();
//! assert!(!split.is_dragging());
//! ```

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;

/// Inclusive percentage bounds for the left panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitBounds {
    pub min: f32,
    pub max: f32,
}

impl Default for SplitBounds {
    fn default() -> Self {
        SplitBounds { min: 10.0, max: 90.0 }
    }
}

impl SplitBounds {
    pub fn clamp(&self, percent: f32) -> f32 {
        percent.clamp(self.min, self.max)
    }
}

/// Where a drag started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub start_pointer_x: f32,
    pub start_left_px: f32,
}

/// Split ratio plus the transient drag record.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitLayout {
    ratio: f32,
    bounds: SplitBounds,
    drag: Option<DragState>,
}

impl SplitLayout {
    /// Create a layout; `initial` is clamped into `bounds` (NaN falls back to the midpoint).
    pub fn new(initial: f32, bounds: SplitBounds) -> Self {
        let initial = if initial.is_finite() {
            initial
        } else {
            (bounds.min + bounds.max) / 2.0
        };
        SplitLayout {
            ratio: bounds.clamp(initial),
            bounds,
            drag: None,
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(
            config.initial_split,
            SplitBounds {
                min: config.min_split,
                max: config.max_split,
            },
        )
    }

    /// Left panel share in percent
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn bounds(&self) -> SplitBounds {
        self.bounds
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_state(&self) -> Option<DragState> {
        self.drag
    }

    /// Left panel width in pixels for a container of `container_px`
    pub fn left_pixel_width(&self, container_px: f32) -> f32 {
        self.ratio * container_px.max(0.0) / 100.0
    }

    /// Record the pointer position and the current left width; enter dragging.
    ///
    /// A second call while already dragging restarts the drag from the new
    /// position.
    pub fn begin_drag(&mut self, pointer_x: f32, current_left_px: f32) {
        tracing::debug!(pointer_x, current_left_px, "divider drag started");
        self.drag = Some(DragState {
            start_pointer_x: pointer_x,
            start_left_px: current_left_px,
        });
    }

    /// Recompute the ratio from the pointer position.
    ///
    /// Returns the new ratio, or `None` when not dragging or when the
    /// container width is unusable (zero, negative, NaN).
    pub fn on_pointer_move(&mut self, pointer_x: f32, container_px: f32) -> Option<f32> {
        let drag = self.drag?;
        if !(container_px.is_finite() && container_px > 0.0) || !pointer_x.is_finite() {
            return None;
        }

        let left_px = drag.start_left_px + (pointer_x - drag.start_pointer_x);
        let percent = left_px * 100.0 / container_px;
        if !percent.is_finite() {
            return None;
        }

        self.ratio = self.bounds.clamp(percent);
        Some(self.ratio)
    }

    /// Leave dragging; returns whether a drag was active.
    pub fn end_drag(&mut self) -> bool {
        let was_dragging = self.drag.take().is_some();
        if was_dragging {
            tracing::debug!(ratio = self.ratio, "divider drag ended");
        }
        was_dragging
    }
}

impl Default for SplitLayout {
    fn default() -> Self {
        Self::new(50.0, SplitBounds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_bounds(split: &SplitLayout) -> bool {
        (10.0..=90.0).contains(&split.ratio())
    }

    #[test]
    fn test_initial_ratio_is_clamped() {
        assert_eq!(SplitLayout::new(2.0, SplitBounds::default()).ratio(), 10.0);
        assert_eq!(SplitLayout::new(99.0, SplitBounds::default()).ratio(), 90.0);
        assert_eq!(SplitLayout::new(f32::NAN, SplitBounds::default()).ratio(), 50.0);
    }

    #[test]
    fn test_drag_moves_ratio() {
        let mut split = SplitLayout::default();
        split.begin_drag(400.0, 400.0);
        assert!(split.is_dragging());

        assert_eq!(split.on_pointer_move(600.0, 800.0), Some(75.0));
        assert_eq!(split.on_pointer_move(200.0, 800.0), Some(25.0));
        assert!(split.end_drag());
        assert_eq!(split.ratio(), 25.0);
    }

    #[test]
    fn test_drag_clamps_at_both_bounds() {
        let mut split = SplitLayout::default();
        split.begin_drag(500.0, 500.0);

        assert_eq!(split.on_pointer_move(-5000.0, 1000.0), Some(10.0));
        assert_eq!(split.on_pointer_move(5000.0, 1000.0), Some(90.0));
        // Coming back inside the bounds tracks the pointer again
        assert_eq!(split.on_pointer_move(700.0, 1000.0), Some(70.0));
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let mut split = SplitLayout::default();
        assert_eq!(split.on_pointer_move(900.0, 1000.0), None);
        assert_eq!(split.ratio(), 50.0);
        assert!(!split.end_drag());
    }

    #[test]
    fn test_unusable_container_width_is_ignored() {
        let mut split = SplitLayout::default();
        split.begin_drag(100.0, 100.0);
        assert_eq!(split.on_pointer_move(300.0, 0.0), None);
        assert_eq!(split.on_pointer_move(300.0, -10.0), None);
        assert_eq!(split.on_pointer_move(300.0, f32::NAN), None);
        assert_eq!(split.on_pointer_move(f32::INFINITY, 500.0), None);
        assert_eq!(split.ratio(), 50.0);
    }

    #[test]
    fn test_end_drag_stops_updates() {
        let mut split = SplitLayout::default();
        split.begin_drag(500.0, 500.0);
        split.on_pointer_move(600.0, 1000.0);
        split.end_drag();

        assert_eq!(split.on_pointer_move(100.0, 1000.0), None);
        assert_eq!(split.ratio(), 60.0);
    }

    #[test]
    fn test_any_drag_sequence_stays_in_bounds() {
        // Deterministic pseudo-random walk over pointer and container sizes
        let mut seed: u32 = 0x2545_f491;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            seed
        };

        let mut split = SplitLayout::default();
        for _ in 0..200 {
            let container = 100.0 + (next() % 3000) as f32;
            let start = (next() % 4000) as f32 - 1000.0;
            split.begin_drag(start, split.left_pixel_width(container));
            for _ in 0..20 {
                let pointer = (next() % 8000) as f32 - 4000.0;
                split.on_pointer_move(pointer, container);
                assert!(in_bounds(&split), "ratio {} escaped", split.ratio());
            }
            split.end_drag();
        }
    }

    #[test]
    fn test_left_pixel_width() {
        let split = SplitLayout::new(25.0, SplitBounds::default());
        assert_eq!(split.left_pixel_width(800.0), 200.0);
        assert_eq!(split.left_pixel_width(-1.0), 0.0);
    }

    #[test]
    fn test_from_config_uses_custom_bounds() {
        let config = LayoutConfig {
            initial_split: 5.0,
            min_split: 20.0,
            max_split: 60.0,
            ..LayoutConfig::default()
        };
        let mut split = SplitLayout::from_config(&config);
        assert_eq!(split.ratio(), 20.0);

        split.begin_drag(0.0, 0.0);
        assert_eq!(split.on_pointer_move(1000.0, 1000.0), Some(60.0));
    }
}
