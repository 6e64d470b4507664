//! # playpen_core - Playground Engine
//!
//! `playpen_core` holds everything in Playpen that does not need a window:
//! the split-pane drag controller, the console buffer, the script runner and
//! its interpreter, the sketch model behind the drawing canvas, and the
//! route table. The GUI and CLI crates are thin shells around it.
//!
//! ## Quick Start
//!
//! ```rust
//! use playpen_core::config::PlaypenConfig;
//! use playpen_core::runner::CodeRunner;
//!
//! let config = PlaypenConfig::default();
//! let mut runner = CodeRunner::new(&config.runner);
//!
//! runner.run("console.log('hello', 40 + 2)").unwrap();
//! assert_eq!(runner.console().texts(), vec!["hello 42"]);
//! ```
//!
//! ## Modules
//!
//! - [`split`] - Divider drag controller and split ratio
//! - [`console`] - Console log buffer and output sinks
//! - [`runner`] - The "Run" action: language gate plus evaluation
//! - [`script`] - Interpreter for a JavaScript subset
//! - [`sketch`] - Freehand drawing state (strokes, palette, brush)
//! - [`routes`] - Route table and navigation links
//! - [`session`] - Page state, remounted on every navigation
//! - [`report`] - Bug report draft
//! - [`config`] - TOML configuration
//! - [`errors`] - Structured error types

/// Crate version, shown on the About page and in bug reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod color;
pub mod config;
pub mod console;
pub mod errors;
pub mod report;
pub mod routes;
pub mod runner;
pub mod script;
pub mod session;
pub mod sketch;
pub mod split;

// Re-export commonly used types at crate root for convenience
pub use color::Rgb;
pub use config::PlaypenConfig;
pub use errors::{PlaypenError, PlaypenResult};
pub use routes::Route;
pub use session::{Page, Playground};
