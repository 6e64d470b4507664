//! Home page: code panel | divider | canvas panel
//!
//! Panel widths follow the split ratio through `FillPortion`, so the two
//! panels always add up to the space left beside the divider.

use iced::widget::{container, row};
use iced::{Element, Length};

use playpen_core::session::HomePage;

use super::shared::divider;
use super::{canvas_panel, code_panel};
use crate::{App, Message};

pub fn view<'a>(app: &'a App, home: &'a HomePage) -> Element<'a, Message> {
    let ratio = home.split.ratio();
    // Tenths of a percent keep the drag smooth
    let left_portion = (ratio * 10.0).round() as u16;
    let right_portion = ((100.0 - ratio) * 10.0).round() as u16;
    let divider_width = app.playground.config().layout.divider_width;

    row![
        container(code_panel::view(app, home))
            .width(Length::FillPortion(left_portion))
            .height(Length::Fill),
        divider::view_divider(home.split.is_dragging(), divider_width),
        container(canvas_panel::view(home, &app.sketch_cache))
            .width(Length::FillPortion(right_portion))
            .height(Length::Fill),
    ]
    .height(Length::Fill)
    .into()
}
