//! Freehand drawing state behind the Canvas Panel.
//!
//! Strokes copy the brush color and width when they begin, so changing the
//! brush later never alters what is already on the canvas.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::Rgb;
use crate::config::CanvasConfig;
use crate::errors::{PlaypenError, PlaypenResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: Uuid,
    pub color: Rgb,
    pub width: f32,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub color: Rgb,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sketch {
    palette: Vec<Rgb>,
    brush: Brush,
    initial_background: Rgb,
    background: Rgb,
    width: f32,
    height: f32,
    drawing_enabled: bool,
    strokes: Vec<Stroke>,
    pending: Option<Stroke>,
}

impl Sketch {
    pub fn new(config: &CanvasConfig) -> Self {
        Sketch {
            palette: config.palette.clone(),
            brush: Brush {
                color: config.initial_color,
                width: config.brush_width,
            },
            initial_background: config.background,
            background: config.background,
            width: 0.0,
            height: config.height,
            drawing_enabled: config.drawing_enabled,
            strokes: Vec::new(),
            pending: None,
        }
    }

    pub fn palette(&self) -> &[Rgb] {
        &self.palette
    }

    pub fn brush(&self) -> Brush {
        self.brush
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    /// Surface size as `(width, height)`
    pub fn dimensions(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn is_drawing_enabled(&self) -> bool {
        self.drawing_enabled
    }

    /// Committed strokes, oldest first
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// The stroke under the pointer, if any
    pub fn pending(&self) -> Option<&Stroke> {
        self.pending.as_ref()
    }

    /// Flip freehand mode and return the new state.
    pub fn toggle_drawing(&mut self) -> bool {
        self.set_drawing_enabled(!self.drawing_enabled);
        self.drawing_enabled
    }

    pub fn set_drawing_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.end_stroke();
        }
        self.drawing_enabled = enabled;
        tracing::debug!(enabled, "drawing mode changed");
    }

    /// Erase everything and restore the initial background.
    pub fn clear(&mut self) {
        tracing::debug!(strokes = self.strokes.len(), "clearing sketch");
        self.strokes.clear();
        self.pending = None;
        self.background = self.initial_background;
    }

    /// Use a palette color for subsequent strokes.
    pub fn select_color(&mut self, color: Rgb) -> PlaypenResult<()> {
        if !self.palette.contains(&color) {
            return Err(PlaypenError::color_not_in_palette(color.to_string()));
        }
        self.brush.color = color;
        Ok(())
    }

    pub fn set_background(&mut self, color: Rgb) {
        self.background = color;
    }

    /// Resize the surface. Negative or non-finite sizes become zero.
    pub fn set_dimensions(&mut self, width: f32, height: f32) {
        let sanitize = |value: f32| if value.is_finite() { value.max(0.0) } else { 0.0 };
        self.width = sanitize(width);
        self.height = sanitize(height);
    }

    pub fn set_brush_width(&mut self, width: f32) -> PlaypenResult<()> {
        if !width.is_finite() || width <= 0.0 {
            return Err(PlaypenError::invalid_config(
                "brush.width",
                width.to_string(),
                "Brush width must be positive",
            ));
        }
        self.brush.width = width;
        Ok(())
    }

    /// Start a stroke at `point`. Returns `false` when drawing is disabled.
    pub fn begin_stroke(&mut self, point: Point) -> bool {
        if !self.drawing_enabled {
            return false;
        }
        self.end_stroke();
        self.pending = Some(Stroke {
            id: Uuid::new_v4(),
            color: self.brush.color,
            width: self.brush.width,
            points: vec![point],
        });
        true
    }

    pub fn extend_stroke(&mut self, point: Point) {
        if let Some(stroke) = &mut self.pending {
            if stroke.points.last() != Some(&point) {
                stroke.points.push(point);
            }
        }
    }

    /// Commit the pending stroke, returning its id.
    pub fn end_stroke(&mut self) -> Option<Uuid> {
        let stroke = self.pending.take()?;
        let id = stroke.id;
        self.strokes.push(stroke);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(0xff, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 0xff);

    fn sketch() -> Sketch {
        Sketch::new(&CanvasConfig::default())
    }

    fn draw_line(sketch: &mut Sketch, from: (f32, f32), to: (f32, f32)) {
        assert!(sketch.begin_stroke(Point::new(from.0, from.1)));
        sketch.extend_stroke(Point::new(to.0, to.1));
        sketch.end_stroke();
    }

    #[test]
    fn test_defaults_from_config() {
        let sketch = sketch();
        assert_eq!(sketch.palette().len(), 6);
        assert_eq!(sketch.brush().color, Rgb::WHITE);
        assert_eq!(sketch.brush().width, 5.0);
        assert_eq!(sketch.background(), Rgb::new(0x1e, 0x1e, 0x1e));
        assert_eq!(sketch.dimensions().1, 350.0);
        assert!(sketch.is_drawing_enabled());
    }

    #[test]
    fn test_clear_removes_strokes_and_resets_background() {
        let mut sketch = sketch();
        draw_line(&mut sketch, (0.0, 0.0), (10.0, 10.0));
        sketch.begin_stroke(Point::new(1.0, 1.0));
        sketch.set_background(BLUE);

        sketch.clear();
        assert!(sketch.strokes().is_empty());
        assert!(sketch.pending().is_none());
        assert_eq!(sketch.background(), Rgb::new(0x1e, 0x1e, 0x1e));
    }

    #[test]
    fn test_color_change_does_not_alter_drawn_strokes() {
        let mut sketch = sketch();
        sketch.select_color(RED).unwrap();
        draw_line(&mut sketch, (0.0, 0.0), (5.0, 5.0));

        sketch.select_color(BLUE).unwrap();
        draw_line(&mut sketch, (5.0, 5.0), (9.0, 9.0));

        let colors: Vec<Rgb> = sketch.strokes().iter().map(|s| s.color).collect();
        assert_eq!(colors, vec![RED, BLUE]);
    }

    #[test]
    fn test_color_outside_palette_is_rejected() {
        let mut sketch = sketch();
        let err = sketch.select_color(Rgb::new(1, 2, 3)).unwrap_err();
        assert_eq!(err.error_code(), "COLOR_NOT_IN_PALETTE");
        assert_eq!(sketch.brush().color, Rgb::WHITE);
    }

    #[test]
    fn test_disabled_drawing_ignores_input() {
        let mut sketch = sketch();
        assert!(!sketch.toggle_drawing());
        assert!(!sketch.begin_stroke(Point::new(0.0, 0.0)));
        sketch.extend_stroke(Point::new(1.0, 1.0));
        assert_eq!(sketch.end_stroke(), None);
        assert!(sketch.strokes().is_empty());

        assert!(sketch.toggle_drawing());
        draw_line(&mut sketch, (0.0, 0.0), (1.0, 1.0));
        assert_eq!(sketch.strokes().len(), 1);
    }

    #[test]
    fn test_toggle_off_commits_pending_stroke() {
        let mut sketch = sketch();
        sketch.begin_stroke(Point::new(0.0, 0.0));
        sketch.extend_stroke(Point::new(3.0, 4.0));
        sketch.toggle_drawing();
        assert!(sketch.pending().is_none());
        assert_eq!(sketch.strokes()[0].points.len(), 2);
    }

    #[test]
    fn test_repeated_points_are_collapsed() {
        let mut sketch = sketch();
        sketch.begin_stroke(Point::new(2.0, 2.0));
        sketch.extend_stroke(Point::new(2.0, 2.0));
        sketch.extend_stroke(Point::new(2.0, 3.0));
        sketch.extend_stroke(Point::new(2.0, 3.0));
        let id = sketch.end_stroke().unwrap();
        assert_eq!(sketch.strokes()[0].id, id);
        assert_eq!(sketch.strokes()[0].points.len(), 2);
    }

    #[test]
    fn test_brush_width_applies_to_new_strokes_only() {
        let mut sketch = sketch();
        draw_line(&mut sketch, (0.0, 0.0), (1.0, 0.0));
        sketch.set_brush_width(12.0).unwrap();
        draw_line(&mut sketch, (0.0, 1.0), (1.0, 1.0));
        assert!(sketch.set_brush_width(0.0).is_err());

        let widths: Vec<f32> = sketch.strokes().iter().map(|s| s.width).collect();
        assert_eq!(widths, vec![5.0, 12.0]);
    }

    #[test]
    fn test_dimensions_are_sanitized() {
        let mut sketch = sketch();
        sketch.set_dimensions(640.0, -3.0);
        assert_eq!(sketch.dimensions(), (640.0, 0.0));
        sketch.set_dimensions(f32::NAN, 200.0);
        assert_eq!(sketch.dimensions(), (0.0, 200.0));
    }
}
