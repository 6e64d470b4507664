//! Canvas Panel (Right Side)
//!
//! Palette swatches, the drawing toggle, Clear, and the drawing surface.

use iced::widget::{button, canvas, column, row, text, Row, Space};
use iced::{Alignment, Border, Color, Element, Length, Padding, Shadow};

use playpen_core::session::HomePage;
use playpen_core::Rgb;

use super::shared::sketch_canvas::SketchCanvas;
use super::to_color;
use crate::Message;

const SWATCH_SIZE: f32 = 22.0;

fn view_swatch(color: Rgb, is_selected: bool) -> Element<'static, Message> {
    let fill = to_color(color);

    button(Space::new().width(SWATCH_SIZE).height(SWATCH_SIZE))
        .on_press(Message::ColorSelected(color))
        .padding(0)
        .style(move |_theme: &iced::Theme, status| {
            let is_hovered = matches!(status, button::Status::Hovered | button::Status::Pressed);
            let border_color = if is_selected {
                Color::WHITE
            } else if is_hovered {
                Color::from_rgba(1.0, 1.0, 1.0, 0.4)
            } else {
                Color::TRANSPARENT
            };

            button::Style {
                background: Some(fill.into()),
                border: Border {
                    color: border_color,
                    width: 2.0,
                    radius: (SWATCH_SIZE / 2.0).into(),
                },
                text_color: Color::WHITE,
                shadow: Shadow::default(),
                snap: false,
            }
        })
        .into()
}

/// Render the canvas panel
pub fn view<'a>(home: &'a HomePage, cache: &'a canvas::Cache) -> Element<'a, Message> {
    let sketch = &home.sketch;
    let brush = sketch.brush();

    let swatches = sketch
        .palette()
        .iter()
        .fold(Row::new().spacing(6), |row, &color| {
            row.push(view_swatch(color, color == brush.color))
        });

    let toggle_label = if sketch.is_drawing_enabled() {
        "Disable Drawing"
    } else {
        "Enable Drawing"
    };

    let controls = row![
        swatches,
        Space::new().width(Length::Fill),
        button(text(toggle_label).size(12))
            .on_press(Message::ToggleDrawing)
            .padding(Padding::from([4, 10]))
            .style(button::secondary),
        button(text("Clear").size(12))
            .on_press(Message::ClearCanvas)
            .padding(Padding::from([4, 10]))
            .style(button::danger),
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    let surface = canvas(SketchCanvas::new(sketch, cache))
        .width(Length::Fill)
        .height(Length::Fixed(sketch.dimensions().1));

    column![text("Canvas").size(16), controls, surface]
        .spacing(8)
        .into()
}
