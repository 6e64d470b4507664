//! Resizable Panel Divider
//!
//! A draggable vertical divider between the code panel and the canvas panel.

use iced::widget::{container, mouse_area, rule};
use iced::{mouse, Element, Length};

use crate::Message;

/// Create the divider.
///
/// A 1px line centered in a `width`-wide hit area. Pressing it starts a drag;
/// the pointer offset inside the hit area is reported while hovering so the
/// drag starts exactly where the pointer is.
pub fn view_divider(is_dragging: bool, width: f32) -> Element<'static, Message> {
    let gap = ((width - 1.0) / 2.0).max(0.0);

    let divider_content = container(rule::vertical(1))
        .padding(iced::Padding {
            top: 0.0,
            right: gap,
            bottom: 0.0,
            left: gap,
        })
        .height(Length::Fill)
        .style(move |theme: &iced::Theme| {
            let palette = theme.extended_palette();
            container::Style {
                background: is_dragging.then(|| palette.primary.weak.color.into()),
                ..container::Style::default()
            }
        });

    mouse_area(divider_content)
        .on_press(Message::DividerDragStart)
        .on_move(|point| Message::DividerHovered(point.x))
        .interaction(mouse::Interaction::ResizingHorizontally)
        .into()
}
