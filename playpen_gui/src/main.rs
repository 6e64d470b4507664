//! # Playpen GUI Application
//!
//! A code editor and a drawing canvas side by side, separated by a draggable
//! divider, inside a small routed site (Home, About, Bug Report).
//! Built with Iced for native targets and WASM.
//!
//! All page state lives in [`playpen_core::Playground`]; this crate renders it
//! and turns widget events into calls on it.

mod logging;
mod platform;
mod ui;

use iced::widget::{canvas, text_editor};
use iced::{event, mouse, window, Element, Event, Size, Subscription, Task, Theme};

use playpen_core::config::PlaypenConfig;
use playpen_core::routes::normalize_path;
use playpen_core::runner::Language;
use playpen_core::session::HomePage;
use playpen_core::sketch::Point;
use playpen_core::{Page, Playground, Rgb};

/// Horizontal padding around the page content, in logical pixels
pub const PAGE_PADDING: f32 = 16.0;

fn main() -> iced::Result {
    logging::init();

    let config = platform::load_config();
    let window_size = Size::new(config.layout.window_width, config.layout.window_height);
    let initial_path = platform::initial_path();
    tracing::info!(path = %initial_path, "starting Playpen");

    iced::application(
        move || App::new(config.clone(), &initial_path),
        App::update,
        App::view,
    )
    .title(App::title)
    .theme(App::theme)
    .subscription(App::subscription)
    .window_size(window_size)
    .run()
}

pub struct App {
    pub playground: Playground,
    /// Editor buffer of the Home page, rebuilt on every mount
    pub editor: text_editor::Content,
    /// Committed strokes; cleared whenever the sketch changes
    pub sketch_cache: canvas::Cache,
    pub window_width: f32,
    /// Last pointer x inside the divider, relative to the divider
    pub divider_hover_x: f32,
    /// One-line feedback shown on the report page
    pub notice: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Message {
    Navigate(&'static str),
    WindowResized(Size),

    // Divider
    DividerHovered(f32),
    DividerDragStart,
    DividerDragged(f32),
    DividerReleased,

    // Code panel
    EditorAction(text_editor::Action),
    LanguageSelected(Language),
    RunCode,
    ClearConsole,

    // Canvas panel
    ColorSelected(Rgb),
    ToggleDrawing,
    ClearCanvas,
    StrokeStarted(Point),
    StrokeExtended(Point),
    StrokeFinished,

    // Bug report
    ReportSummaryChanged(String),
    ReportDetailsChanged(String),
    CopyReport,
}

impl App {
    fn new(config: PlaypenConfig, initial_path: &str) -> Self {
        let window_width = config.layout.window_width;
        let editor = text_editor::Content::with_text(&config.editor.initial_text);
        let mut app = App {
            playground: Playground::new(config, initial_path),
            editor,
            sketch_cache: canvas::Cache::new(),
            window_width,
            divider_hover_x: 0.0,
            notice: None,
        };
        app.sync_sketch_size();
        app
    }

    fn title(&self) -> String {
        match self.playground.route() {
            Some(route) => format!("Playpen - {}", route.title()),
            None => "Playpen - Not Found".to_string(),
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    /// Width of the split container: the window minus page padding
    pub fn content_width(&self) -> f32 {
        (self.window_width - 2.0 * PAGE_PADDING).max(0.0)
    }

    /// Width the two panels share: the content minus the divider
    pub fn split_width(&self) -> f32 {
        let divider = self.playground.config().layout.divider_width;
        (self.content_width() - divider).max(0.0)
    }

    fn home(&self) -> Option<&HomePage> {
        match self.playground.page() {
            Page::Home(home) => Some(home),
            _ => None,
        }
    }

    fn home_mut(&mut self) -> Option<&mut HomePage> {
        match self.playground.page_mut() {
            Page::Home(home) => Some(home),
            _ => None,
        }
    }

    fn is_dragging(&self) -> bool {
        self.home().is_some_and(|home| home.split.is_dragging())
    }

    /// The canvas fills the right panel; keep the sketch's surface size in step.
    fn sync_sketch_size(&mut self) {
        let container = self.split_width();
        let Some(home) = self.home_mut() else {
            return;
        };
        let left = home.split.left_pixel_width(container);
        let height = home.sketch.dimensions().1;
        home.sketch.set_dimensions(container - left, height);
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Navigate(path) => {
                let route = self.playground.navigate(path);
                platform::push_path(&normalize_path(path));

                // Fresh page: rebuild everything the widgets hold outside the core
                let initial_text = self.playground.config().editor.initial_text.clone();
                self.editor = text_editor::Content::with_text(&initial_text);
                self.sketch_cache.clear();
                self.notice = None;
                self.sync_sketch_size();
                tracing::debug!(?route, "page mounted");
            }
            Message::WindowResized(size) => {
                self.window_width = size.width;
                self.sync_sketch_size();
                self.sketch_cache.clear();
            }

            Message::DividerHovered(x) => {
                self.divider_hover_x = x;
            }
            Message::DividerDragStart => {
                let container = self.split_width();
                let hover_x = self.divider_hover_x;
                if let Some(home) = self.home_mut() {
                    let left = home.split.left_pixel_width(container);
                    home.split.begin_drag(left + hover_x, left);
                }
            }
            Message::DividerDragged(window_x) => {
                let container = self.split_width();
                let moved = self
                    .home_mut()
                    .and_then(|home| home.split.on_pointer_move(window_x - PAGE_PADDING, container));
                if moved.is_some() {
                    self.sync_sketch_size();
                    self.sketch_cache.clear();
                }
            }
            Message::DividerReleased => {
                if let Some(home) = self.home_mut() {
                    home.split.end_drag();
                }
            }

            Message::EditorAction(action) => {
                self.editor.perform(action);
            }
            Message::LanguageSelected(language) => {
                if let Some(home) = self.home_mut() {
                    if let Err(err) = home.runner.select_language(language.as_str()) {
                        tracing::warn!(%err, "language rejected");
                    }
                }
            }
            Message::RunCode => {
                let source = self.editor.text();
                if let Some(home) = self.home_mut() {
                    home.set_source(source);
                    match home.run() {
                        Ok(()) => tracing::debug!("run finished"),
                        Err(err) => tracing::debug!(%err, "run finished with error"),
                    }
                }
            }
            Message::ClearConsole => {
                if let Some(home) = self.home_mut() {
                    home.runner.clear_console();
                }
            }

            Message::ColorSelected(color) => {
                if let Some(home) = self.home_mut() {
                    if let Err(err) = home.sketch.select_color(color) {
                        tracing::warn!(%err, "color rejected");
                    }
                }
            }
            Message::ToggleDrawing => {
                if let Some(home) = self.home_mut() {
                    home.sketch.toggle_drawing();
                }
                self.sketch_cache.clear();
            }
            Message::ClearCanvas => {
                if let Some(home) = self.home_mut() {
                    home.sketch.clear();
                }
                self.sketch_cache.clear();
            }
            Message::StrokeStarted(point) => {
                if let Some(home) = self.home_mut() {
                    home.sketch.begin_stroke(point);
                }
            }
            Message::StrokeExtended(point) => {
                if let Some(home) = self.home_mut() {
                    home.sketch.extend_stroke(point);
                }
            }
            Message::StrokeFinished => {
                if let Some(home) = self.home_mut() {
                    home.sketch.end_stroke();
                }
                self.sketch_cache.clear();
            }

            Message::ReportSummaryChanged(value) => {
                if let Page::Report(draft) = self.playground.page_mut() {
                    draft.set_summary(value);
                }
            }
            Message::ReportDetailsChanged(value) => {
                if let Page::Report(draft) = self.playground.page_mut() {
                    draft.set_details(value);
                }
            }
            Message::CopyReport => {
                let Page::Report(draft) = self.playground.page() else {
                    return Task::none();
                };
                match draft.render() {
                    Ok(report) => {
                        self.notice = Some("Report copied to clipboard".to_string());
                        return iced::clipboard::write(report);
                    }
                    Err(err) => {
                        self.notice = Some(err.to_string());
                    }
                }
            }
        }

        Task::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let content = match self.playground.page() {
            Page::Home(home) => ui::home::view(self, home),
            Page::About => ui::about::view(),
            Page::Report(draft) => ui::report::view(draft, self.notice.as_deref()),
            Page::NotFound { path } => ui::layout::view_not_found(path),
        };

        ui::layout::view_layout(self.playground.route(), content)
    }

    fn subscription(&self) -> Subscription<Message> {
        let resize = window::resize_events().map(|(_id, size)| Message::WindowResized(size));

        // Pointer tracking only exists while the divider is held
        if self.is_dragging() {
            Subscription::batch([resize, event::listen_with(drag_events)])
        } else {
            resize
        }
    }
}

fn drag_events(event: Event, _status: event::Status, _window: window::Id) -> Option<Message> {
    match event {
        Event::Mouse(mouse::Event::CursorMoved { position }) => Some(Message::DividerDragged(position.x)),
        Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => Some(Message::DividerReleased),
        Event::Mouse(mouse::Event::CursorLeft) => Some(Message::DividerReleased),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(path: &str) -> App {
        App::new(PlaypenConfig::default(), path)
    }

    fn split_ratio(app: &App) -> f32 {
        app.home().map(|home| home.split.ratio()).unwrap_or_default()
    }

    #[test]
    fn test_divider_drag_updates_ratio_within_bounds() {
        let mut app = app("/");
        let _ = app.update(Message::DividerHovered(2.0));
        let _ = app.update(Message::DividerDragStart);
        assert!(app.is_dragging());

        let _ = app.update(Message::DividerDragged(10_000.0));
        assert_eq!(split_ratio(&app), 90.0);
        let _ = app.update(Message::DividerDragged(-500.0));
        assert_eq!(split_ratio(&app), 10.0);

        let _ = app.update(Message::DividerReleased);
        assert!(!app.is_dragging());
    }

    #[test]
    fn test_drag_move_without_press_is_ignored() {
        let mut app = app("/");
        let _ = app.update(Message::DividerDragged(100.0));
        assert_eq!(split_ratio(&app), 50.0);
    }

    #[test]
    fn test_run_code_uses_editor_text() {
        let mut app = app("/");
        app.editor = text_editor::Content::with_text("console.log('from editor')");
        let _ = app.update(Message::RunCode);
        let texts: Vec<String> = app
            .home()
            .map(|home| home.runner.console().texts().iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        assert_eq!(texts, vec!["from editor"]);
    }

    #[test]
    fn test_navigation_resets_editor_and_notice() {
        let mut app = app("/report");
        let _ = app.update(Message::CopyReport);
        assert!(app.notice.is_some());

        let _ = app.update(Message::Navigate("/"));
        assert!(app.notice.is_none());
        assert_eq!(app.editor.text().trim_end(), "// Start coding here...");
        assert_eq!(app.title(), "Playpen - Home");
    }

    #[test]
    fn test_sketch_tracks_right_panel_width() {
        let mut app = app("/");
        let _ = app.update(Message::WindowResized(Size::new(1032.0, 800.0)));
        let width = app.home().map(|home| home.sketch.dimensions().0).unwrap_or_default();
        // 1000px of content, 5px of divider, half of the rest
        assert_eq!(width, 497.5);
    }

    #[test]
    fn test_drag_without_pointer_motion_keeps_ratio() {
        let mut app = app("/");
        let _ = app.update(Message::WindowResized(Size::new(1032.0, 800.0)));
        let _ = app.update(Message::DividerHovered(2.0));
        let _ = app.update(Message::DividerDragStart);

        // Divider's left edge is at PAGE_PADDING + 497.5 in window coordinates
        let _ = app.update(Message::DividerDragged(PAGE_PADDING + 497.5 + 2.0));
        assert_eq!(split_ratio(&app), 50.0);

        let _ = app.update(Message::DividerDragged(PAGE_PADDING + 497.5 + 2.0 + 99.5));
        assert_eq!(split_ratio(&app), 60.0);
    }
}
