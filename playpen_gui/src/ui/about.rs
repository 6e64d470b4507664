//! About page

use iced::widget::{column, text};
use iced::Element;

use playpen_core::VERSION;

use crate::Message;

pub fn view() -> Element<'static, Message> {
    column![
        text("About Playpen").size(24),
        text(
            "Playpen is a scratch space: write a little JavaScript on the left and run it, \
             sketch on the right, and drag the divider to give either side more room."
        )
        .size(14),
        text(
            "Only JavaScript runs locally. Scripts are interpreted in-process with a step \
             budget, so a runaway loop ends with an error instead of a frozen window."
        )
        .size(14),
        text(format!("Version {VERSION}")).size(12).color([0.6, 0.6, 0.6]),
    ]
    .spacing(12)
    .into()
}
