//! # Configuration
//!
//! The page constants (palette, language list, the
//! placeholder message, panel bounds) are configuration data here. Every field
//! has a default, so an empty file or a partial one is valid.
//!
//! ```toml
//! [runner]
//! languages = ["JavaScript", "Python"]
//! default_language = "JavaScript"
//!
//! [canvas]
//! palette = ["#ff0000", "#00ff00"]
//! brush_width = 3.0
//!
//! [layout]
//! initial_split = 60.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::errors::{PlaypenError, PlaypenResult};

/// Environment variable the native GUI reads the config path from
pub const CONFIG_ENV_VAR: &str = "PLAYPEN_CONFIG";

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlaypenConfig {
    pub editor: EditorConfig,
    pub runner: RunnerConfig,
    pub canvas: CanvasConfig,
    pub layout: LayoutConfig,
}

/// Code editor surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Text shown in a freshly mounted editor
    pub initial_text: String,
    /// Syntax highlighting mode, given as a file extension (e.g. "js")
    pub syntax: String,
    /// Highlighting theme name
    pub theme: EditorTheme,
    pub font_size: f32,
    /// Spaces inserted for a tab key press
    pub tab_size: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            initial_text: "// Start coding here...".to_string(),
            syntax: "js".to_string(),
            theme: EditorTheme::default(),
            font_size: 16.0,
            tab_size: 2,
        }
    }
}

/// Highlighting themes the editor widget ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EditorTheme {
    #[default]
    SolarizedDark,
    Base16Mocha,
    Base16Ocean,
    Base16Eighties,
    InspiredGithub,
}

/// The "Run" action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Choices offered by the language selector
    pub languages: Vec<String>,
    /// The only language that is actually evaluated
    pub default_language: String,
    /// Console line shown when any other language is run
    pub unsupported_message: String,
    /// Interpreter step budget per run
    pub max_steps: u64,
    /// Maximum nested function calls per run
    pub max_call_depth: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            languages: ["JavaScript", "C++", "Python", "Java", "C#"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_language: "JavaScript".to_string(),
            unsupported_message: "Oops... Server Side Error".to_string(),
            max_steps: 1_000_000,
            max_call_depth: 64,
        }
    }
}

/// Drawing canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub palette: Vec<Rgb>,
    /// Brush color before any palette button is pressed
    pub initial_color: Rgb,
    pub background: Rgb,
    pub brush_width: f32,
    pub height: f32,
    pub drawing_enabled: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        CanvasConfig {
            palette: vec![
                Rgb::new(0xff, 0x00, 0x00),
                Rgb::new(0x00, 0xff, 0x00),
                Rgb::new(0x00, 0x00, 0xff),
                Rgb::new(0xff, 0xff, 0x00),
                Rgb::new(0xff, 0x00, 0xff),
                Rgb::new(0x00, 0xff, 0xff),
            ],
            initial_color: Rgb::WHITE,
            background: Rgb::new(0x1e, 0x1e, 0x1e),
            brush_width: 5.0,
            height: 350.0,
            drawing_enabled: true,
        }
    }
}

/// Split-pane layout of the main page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Left panel share in percent
    pub initial_split: f32,
    pub min_split: f32,
    pub max_split: f32,
    pub divider_width: f32,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            initial_split: 50.0,
            min_split: 10.0,
            max_split: 90.0,
            divider_width: 5.0,
            window_width: 1280.0,
            window_height: 820.0,
        }
    }
}

impl PlaypenConfig {
    /// Parse and validate a TOML document.
    ///
    /// ```rust
    /// use playpen_core::config::PlaypenConfig;
    ///
    /// let config = PlaypenConfig::from_toml_str("[layout]\ninitial_split = 30.0\n").unwrap();
    /// assert_eq!(config.layout.initial_split, 30.0);
    /// assert_eq!(config.runner.default_language, "JavaScript");
    /// ```
    pub fn from_toml_str(source: &str) -> PlaypenResult<Self> {
        let config: PlaypenConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> PlaypenResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| PlaypenError::file_error("read", path.display().to_string(), e.to_string()))?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load from `path` when given, otherwise from `$PLAYPEN_CONFIG` when set,
    /// otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> PlaypenResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> PlaypenResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> PlaypenResult<()> {
        let runner = &self.runner;
        if runner.languages.is_empty() {
            return Err(PlaypenError::invalid_config("runner.languages", "[]", "At least one language is required"));
        }
        if !runner.languages.contains(&runner.default_language) {
            return Err(PlaypenError::invalid_config(
                "runner.default_language",
                &runner.default_language,
                "Default language must be listed in runner.languages",
            ));
        }
        if runner.max_steps == 0 {
            return Err(PlaypenError::invalid_config("runner.max_steps", "0", "Step budget must be positive"));
        }
        if runner.max_call_depth == 0 {
            return Err(PlaypenError::invalid_config("runner.max_call_depth", "0", "Call depth must be positive"));
        }

        let canvas = &self.canvas;
        if canvas.palette.is_empty() {
            return Err(PlaypenError::invalid_config("canvas.palette", "[]", "Palette must not be empty"));
        }
        if !(canvas.brush_width > 0.0) {
            return Err(PlaypenError::invalid_config(
                "canvas.brush_width",
                canvas.brush_width.to_string(),
                "Brush width must be positive",
            ));
        }
        if !(canvas.height > 0.0) {
            return Err(PlaypenError::invalid_config(
                "canvas.height",
                canvas.height.to_string(),
                "Canvas height must be positive",
            ));
        }

        let layout = &self.layout;
        if !(layout.min_split > 0.0 && layout.min_split < layout.max_split && layout.max_split < 100.0) {
            return Err(PlaypenError::invalid_config(
                "layout.min_split/max_split",
                format!("{}/{}", layout.min_split, layout.max_split),
                "Expected 0 < min_split < max_split < 100",
            ));
        }
        if !(layout.divider_width >= 0.0) {
            return Err(PlaypenError::invalid_config(
                "layout.divider_width",
                layout.divider_width.to_string(),
                "Divider width must not be negative",
            ));
        }

        if self.editor.font_size <= 0.0 {
            return Err(PlaypenError::invalid_config(
                "editor.font_size",
                self.editor.font_size.to_string(),
                "Font size must be positive",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = PlaypenConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.canvas.palette.len(), 6);
        assert_eq!(config.runner.languages.len(), 5);
        assert_eq!(config.layout.initial_split, 50.0);
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = PlaypenConfig::from_toml_str("").unwrap();
        assert_eq!(config, PlaypenConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = PlaypenConfig::from_toml_str(
            r##"
            [editor]
            theme = "base16-ocean"

            [canvas]
            palette = ["#000000", "#ffffff"]
            background = "#101010"
            "##,
        )
        .unwrap();

        assert_eq!(config.editor.theme, EditorTheme::Base16Ocean);
        assert_eq!(config.canvas.palette, vec![Rgb::new(0, 0, 0), Rgb::WHITE]);
        assert_eq!(config.canvas.background, Rgb::new(0x10, 0x10, 0x10));
        assert_eq!(config.canvas.brush_width, 5.0);
    }

    #[test]
    fn test_rejects_missing_default_language() {
        let err = PlaypenConfig::from_toml_str(
            r#"
            [runner]
            languages = ["Python"]
            default_language = "JavaScript"
            "#,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_rejects_inverted_split_bounds() {
        let err = PlaypenConfig::from_toml_str("[layout]\nmin_split = 80.0\nmax_split = 20.0\n").unwrap_err();
        assert!(matches!(err, PlaypenError::InvalidConfig { .. }));
    }

    #[test]
    fn test_rejects_bad_color() {
        let err = PlaypenConfig::from_toml_str("[canvas]\nbackground = \"dark\"\n").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runner]\nunsupported_message = \"nope\"").unwrap();

        let config = PlaypenConfig::load(file.path()).unwrap();
        assert_eq!(config.runner.unsupported_message, "nope");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlaypenConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = PlaypenConfig::default();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("default_language = \"JavaScript\""));
        assert_eq!(PlaypenConfig::from_toml_str(&text).unwrap(), config);
    }
}
