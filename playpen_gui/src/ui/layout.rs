//! Page Layout
//!
//! Indigo header with the site name, main navigation on the left and account
//! links on the right; the routed page renders below it.

use iced::widget::{button, column, container, row, text, Row, Space};
use iced::{Alignment, Color, Element, Length, Padding};

use playpen_core::routes::{NavLink, Route, ACCOUNT_LINKS, NAVIGATION};

use crate::{Message, PAGE_PADDING};

const HEADER_BACKGROUND: Color = Color::from_rgb(0.19, 0.18, 0.51);

fn nav_button(link: &NavLink, current: Option<Route>) -> Element<'static, Message> {
    let is_active = current.is_some() && link.route() == current;

    button(text(link.label).size(14))
        .on_press(Message::Navigate(link.href))
        .padding(Padding::from([6, 12]))
        .style(if is_active { button::primary } else { button::text })
        .into()
}

fn account_button(link: &NavLink) -> Element<'static, Message> {
    button(text(link.label).size(13))
        .on_press(Message::Navigate(link.href))
        .padding(Padding::from([6, 12]))
        .style(button::secondary)
        .into()
}

/// Render the header
pub fn view_header(current: Option<Route>) -> Element<'static, Message> {
    let navigation = NAVIGATION
        .iter()
        .fold(Row::new().spacing(4), |row, link| row.push(nav_button(link, current)));
    let account = ACCOUNT_LINKS
        .iter()
        .fold(Row::new().spacing(8), |row, link| row.push(account_button(link)));

    let header = row![
        text("Playpen").size(22).color(Color::WHITE),
        Space::new().width(24),
        navigation,
        Space::new().width(Length::Fill),
        account,
    ]
    .align_y(Alignment::Center);

    container(header)
        .width(Length::Fill)
        .padding(Padding::from([10.0, PAGE_PADDING]))
        .style(|_theme: &iced::Theme| container::Style {
            background: Some(HEADER_BACKGROUND.into()),
            text_color: Some(Color::WHITE),
            ..container::Style::default()
        })
        .into()
}

/// Header plus the page content
pub fn view_layout(current: Option<Route>, content: Element<'_, Message>) -> Element<'_, Message> {
    column![
        view_header(current),
        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(Padding::from([12.0, PAGE_PADDING])),
    ]
    .into()
}

/// Shown for paths without a page
pub fn view_not_found(path: &str) -> Element<'_, Message> {
    column![
        text("Page not found").size(24),
        text(format!("Nothing lives at {path}.")).size(14),
        button(text("Back to Home").size(13))
            .on_press(Message::Navigate(Route::Home.path()))
            .padding(Padding::from([6, 12]))
            .style(button::primary),
    ]
    .spacing(12)
    .into()
}
