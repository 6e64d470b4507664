//! Canvas program for the drawing surface
//!
//! Committed strokes are drawn through a [`Cache`] owned by the app; the
//! stroke under the pointer is drawn fresh every frame.

use iced::widget::canvas::{self, Cache, Frame, Geometry, LineCap, LineJoin, Path, Stroke};
use iced::{mouse, Point, Rectangle, Renderer, Theme};

use playpen_core::sketch::{Point as SketchPoint, Sketch, Stroke as SketchStroke};

use crate::ui::to_color;
use crate::Message;

pub struct SketchCanvas<'a> {
    sketch: &'a Sketch,
    cache: &'a Cache,
}

impl<'a> SketchCanvas<'a> {
    pub fn new(sketch: &'a Sketch, cache: &'a Cache) -> Self {
        Self { sketch, cache }
    }
}

fn to_point(point: SketchPoint) -> Point {
    Point::new(point.x, point.y)
}

fn draw_stroke(frame: &mut Frame, stroke: &SketchStroke) {
    let color = to_color(stroke.color);
    let Some((first, rest)) = stroke.points.split_first() else {
        return;
    };

    // A click without movement still leaves a dot
    if rest.is_empty() {
        frame.fill(&Path::circle(to_point(*first), stroke.width / 2.0), color);
        return;
    }

    let path = Path::new(|builder| {
        builder.move_to(to_point(*first));
        for point in rest {
            builder.line_to(to_point(*point));
        }
    });
    frame.stroke(
        &path,
        Stroke::default()
            .with_color(color)
            .with_width(stroke.width)
            .with_line_cap(LineCap::Round)
            .with_line_join(LineJoin::Round),
    );
}

impl canvas::Program<Message> for SketchCanvas<'_> {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: &canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        let drawing = self.sketch.pending().is_some();

        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if !self.sketch.is_drawing_enabled() {
                    return None;
                }
                let position = cursor.position_in(bounds)?;
                let point = SketchPoint::new(position.x, position.y);
                Some(canvas::Action::publish(Message::StrokeStarted(point)).and_capture())
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if drawing => {
                // Strokes may leave the surface; the frame clips them
                let position = cursor.position_from(bounds.position())?;
                let point = SketchPoint::new(position.x, position.y);
                Some(canvas::Action::publish(Message::StrokeExtended(point)).and_capture())
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) if drawing => {
                Some(canvas::Action::publish(Message::StrokeFinished).and_capture())
            }
            _ => None,
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let committed = self.cache.draw(renderer, bounds.size(), |frame| {
            frame.fill_rectangle(Point::ORIGIN, frame.size(), to_color(self.sketch.background()));
            for stroke in self.sketch.strokes() {
                draw_stroke(frame, stroke);
            }
        });

        let mut pending = Frame::new(renderer, bounds.size());
        if let Some(stroke) = self.sketch.pending() {
            draw_stroke(&mut pending, stroke);
        }

        vec![committed, pending.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if self.sketch.is_drawing_enabled() && cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}
