//! Bug Report page
//!
//! Summary and details fields, a live preview, and a button that copies the
//! rendered report to the clipboard.

use iced::widget::{button, column, container, row, scrollable, text, text_input, Space};
use iced::{Alignment, Element, Font, Length, Padding};

use playpen_core::report::ReportDraft;

use crate::Message;

fn labeled<'a>(label: &'a str, field: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    column![text(label).size(12), field.into()].spacing(4).into()
}

pub fn view<'a>(draft: &'a ReportDraft, notice: Option<&'a str>) -> Element<'a, Message> {
    let summary = text_input("What went wrong?", draft.summary())
        .on_input(Message::ReportSummaryChanged)
        .size(13)
        .padding(6);
    let details = text_input("Steps to reproduce", draft.details())
        .on_input(Message::ReportDetailsChanged)
        .size(13)
        .padding(6);

    let preview = match draft.render() {
        Ok(report) => report,
        Err(_) => "Add a summary to preview the report.".to_string(),
    };

    let actions = row![
        button(text("Copy Report").size(12))
            .on_press(Message::CopyReport)
            .padding(Padding::from([4, 12]))
            .style(button::primary),
        Space::new().width(12),
        text(notice.unwrap_or_default()).size(12),
    ]
    .align_y(Alignment::Center);

    column![
        text("Bug Report").size(24),
        labeled("Summary", summary),
        labeled("Details", details),
        actions,
        container(scrollable(text(preview).font(Font::MONOSPACE).size(12)))
            .width(Length::Fill)
            .padding(8)
            .style(container::bordered_box),
    ]
    .spacing(12)
    .max_width(720)
    .into()
}
