//! Code Panel (Left Side)
//!
//! Displays:
//! - Language selector, Run and Clear buttons
//! - Syntax highlighted editor
//! - Console lines from the last run, tinted by level

use iced::highlighter;
use iced::keyboard::{self, key};
use iced::widget::text_editor::{Binding, KeyPress};
use iced::widget::text_editor;
use iced::widget::{button, column, container, pick_list, row, scrollable, text, Column, Space};
use iced::{Alignment, Element, Font, Length, Padding};

use playpen_core::config::EditorTheme;
use playpen_core::console::{ConsoleLevel, ConsoleLine};
use playpen_core::session::HomePage;

use crate::{App, Message};

const CONSOLE_HEIGHT: f32 = 180.0;

fn highlighter_theme(theme: EditorTheme) -> highlighter::Theme {
    match theme {
        EditorTheme::SolarizedDark => highlighter::Theme::SolarizedDark,
        EditorTheme::Base16Mocha => highlighter::Theme::Base16Mocha,
        EditorTheme::Base16Ocean => highlighter::Theme::Base16Ocean,
        EditorTheme::Base16Eighties => highlighter::Theme::Base16Eighties,
        EditorTheme::InspiredGithub => highlighter::Theme::InspiredGitHub,
    }
}

/// Tab inserts `tab_size` spaces; every other key keeps its default binding.
fn key_binding(key_press: KeyPress, tab_size: usize) -> Option<Binding<Message>> {
    let is_tab = matches!(key_press.key, keyboard::Key::Named(key::Named::Tab))
        && !key_press.modifiers.shift();

    if is_tab && matches!(key_press.status, text_editor::Status::Focused { .. }) {
        return Some(Binding::Sequence(
            (0..tab_size).map(|_| Binding::Insert(' ')).collect(),
        ));
    }

    Binding::from_key_press(key_press)
}

fn level_color(level: ConsoleLevel) -> [f32; 3] {
    match level {
        ConsoleLevel::Log => [0.85, 0.85, 0.85],
        ConsoleLevel::Info => [0.45, 0.7, 0.95],
        ConsoleLevel::Warn => [0.95, 0.75, 0.3],
        ConsoleLevel::Error => [0.95, 0.35, 0.35],
        ConsoleLevel::Debug => [0.6, 0.6, 0.6],
    }
}

fn view_console_line(line: &ConsoleLine) -> Element<'_, Message> {
    text(&line.text)
        .font(Font::MONOSPACE)
        .size(13)
        .color(level_color(line.level))
        .into()
}

fn view_console(home: &HomePage) -> Element<'_, Message> {
    let lines = home.runner.console().lines();

    let content: Column<'_, Message> = if lines.is_empty() {
        column![text("Console output appears here").size(12).color([0.5, 0.5, 0.5])]
    } else {
        Column::with_children(lines.iter().map(view_console_line)).spacing(2)
    };

    container(scrollable(content.padding(8)).width(Length::Fill))
        .width(Length::Fill)
        .height(Length::Fixed(CONSOLE_HEIGHT))
        .style(container::bordered_box)
        .into()
}

/// Render the code panel
pub fn view<'a>(app: &'a App, home: &'a HomePage) -> Element<'a, Message> {
    let config = &app.playground.config().editor;
    let tab_size = config.tab_size;

    let toolbar = row![
        text("Code").size(16),
        Space::new().width(Length::Fill),
        pick_list(
            home.runner.languages(),
            Some(home.runner.selected()),
            Message::LanguageSelected
        )
        .text_size(12),
        button(text("Clear").size(12))
            .on_press(Message::ClearConsole)
            .padding(Padding::from([4, 10]))
            .style(button::secondary),
        button(text("Run").size(12))
            .on_press(Message::RunCode)
            .padding(Padding::from([4, 14]))
            .style(button::success),
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    let editor = text_editor(&app.editor)
        .placeholder("Type some code...")
        .on_action(Message::EditorAction)
        .font(Font::MONOSPACE)
        .size(config.font_size)
        .height(Length::Fill)
        .padding(10)
        .highlight(&config.syntax, highlighter_theme(config.theme))
        .key_binding(move |key_press| key_binding(key_press, tab_size));

    column![toolbar, editor, view_console(home)]
        .spacing(8)
        .height(Length::Fill)
        .into()
}
