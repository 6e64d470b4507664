//! Page state and navigation.
//!
//! A [`Playground`] holds the state of exactly one page. Navigating always
//! builds a fresh page from configuration, so nothing survives a route change,
//! not even a navigation to the page already shown.

use crate::config::PlaypenConfig;
use crate::report::ReportDraft;
use crate::routes::{normalize_path, Route};
use crate::runner::{CodeRunner, RunError};
use crate::sketch::Sketch;
use crate::split::SplitLayout;

/// State of the main playground page
#[derive(Debug)]
pub struct HomePage {
    pub split: SplitLayout,
    pub runner: CodeRunner,
    pub sketch: Sketch,
    source: String,
}

impl HomePage {
    pub fn new(config: &PlaypenConfig) -> Self {
        HomePage {
            split: SplitLayout::from_config(&config.layout),
            runner: CodeRunner::new(&config.runner),
            sketch: Sketch::new(&config.canvas),
            source: config.editor.initial_text.clone(),
        }
    }

    /// Editor text as of the last sync
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    /// Run the current editor text.
    pub fn run(&mut self) -> Result<(), RunError> {
        self.runner.run(&self.source)
    }
}

#[derive(Debug)]
pub enum Page {
    Home(Box<HomePage>),
    About,
    Report(ReportDraft),
    NotFound { path: String },
}

impl Page {
    pub fn route(&self) -> Option<Route> {
        match self {
            Page::Home(_) => Some(Route::Home),
            Page::About => Some(Route::About),
            Page::Report(_) => Some(Route::Report),
            Page::NotFound { .. } => None,
        }
    }

    fn mount(config: &PlaypenConfig, path: &str) -> Page {
        match Route::from_path(path) {
            Some(Route::Home) => Page::Home(Box::new(HomePage::new(config))),
            Some(Route::About) => Page::About,
            Some(Route::Report) => Page::Report(ReportDraft::new()),
            None => Page::NotFound {
                path: path.to_string(),
            },
        }
    }
}

#[derive(Debug)]
pub struct Playground {
    config: PlaypenConfig,
    path: String,
    page: Page,
}

impl Playground {
    pub fn new(config: PlaypenConfig, initial_path: &str) -> Self {
        let path = normalize_path(initial_path);
        let page = Page::mount(&config, &path);
        Playground { config, path, page }
    }

    pub fn config(&self) -> &PlaypenConfig {
        &self.config
    }

    /// Normalized path of the current page
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn route(&self) -> Option<Route> {
        self.page.route()
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    /// Mount a fresh page for `path` and return its route.
    ///
    /// ```rust
    /// use playpen_core::config::PlaypenConfig;
    /// use playpen_core::routes::Route;
    /// use playpen_core::session::Playground;
    ///
    /// let mut playground = Playground::new(PlaypenConfig::default(), "/");
    /// assert_eq!(playground.navigate("/report/"), Some(Route::Report));
    /// assert_eq!(playground.path(), "/report");
    /// assert_eq!(playground.navigate("/signin"), None);
    /// ```
    pub fn navigate(&mut self, path: &str) -> Option<Route> {
        let path = normalize_path(path);
        tracing::info!(from = %self.path, to = %path, "navigate");
        self.page = Page::mount(&self.config, &path);
        self.path = path;
        self.page.route()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::sketch::Point;

    fn home(playground: &mut Playground) -> &mut HomePage {
        match playground.page_mut() {
            Page::Home(home) => home,
            other => panic!("expected home page, got {other:?}"),
        }
    }

    #[test]
    fn test_initial_path_selects_page() {
        let playground = Playground::new(PlaypenConfig::default(), "/about");
        assert!(matches!(playground.page(), Page::About));
        assert_eq!(playground.route(), Some(Route::About));
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let playground = Playground::new(PlaypenConfig::default(), "/register?next=/");
        match playground.page() {
            Page::NotFound { path } => assert_eq!(path, "/register"),
            other => panic!("expected not found, got {other:?}"),
        }
        assert_eq!(playground.route(), None);
    }

    #[test]
    fn test_navigation_preserves_no_state() {
        let mut playground = Playground::new(PlaypenConfig::default(), "/");
        {
            let page = home(&mut playground);
            page.split.begin_drag(100.0, 640.0);
            page.split.on_pointer_move(300.0, 1280.0);
            page.set_source("console.log('kept?')");
            page.run().unwrap();
            page.sketch.select_color(Rgb::new(0xff, 0, 0)).unwrap();
            page.sketch.begin_stroke(Point::new(1.0, 1.0));
            page.sketch.end_stroke();
        }

        for path in ["/about", "/report", "/"] {
            playground.navigate(path);
        }

        let config = PlaypenConfig::default();
        let page = home(&mut playground);
        assert_eq!(page.split.ratio(), 50.0);
        assert!(!page.split.is_dragging());
        assert!(page.runner.console().is_empty());
        assert_eq!(page.source(), config.editor.initial_text);
        assert!(page.sketch.strokes().is_empty());
        assert_eq!(page.sketch.brush().color, config.canvas.initial_color);
    }

    #[test]
    fn test_navigating_to_same_route_remounts() {
        let mut playground = Playground::new(PlaypenConfig::default(), "/report");
        if let Page::Report(draft) = playground.page_mut() {
            draft.set_summary("typed");
        }
        playground.navigate("/report");
        match playground.page() {
            Page::Report(draft) => assert!(draft.summary().is_empty()),
            other => panic!("expected report page, got {other:?}"),
        }
    }

    #[test]
    fn test_home_run_uses_synced_source() {
        let mut playground = Playground::new(PlaypenConfig::default(), "/");
        let page = home(&mut playground);
        page.set_source("console.log(6 * 7)");
        page.run().unwrap();
        assert_eq!(page.runner.console().texts(), vec!["42"]);
    }
}
