//! # Error Types
//!
//! Structured error types for playpen_core. Script failures are not here:
//! they are values of [`crate::script::EvalError`] and end up as console
//! lines, never as a `PlaypenError`.
//!
//! ## Example
//!
//! ```rust
//! use playpen_core::errors::{PlaypenError, PlaypenResult};
//!
//! fn validate_width(width: f32) -> PlaypenResult<()> {
//!     if width <= 0.0 {
//!         return Err(PlaypenError::invalid_config(
//!             "canvas.brush_width",
//!             width.to_string(),
//!             "Brush width must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for playpen_core operations
pub type PlaypenResult<T> = Result<T, PlaypenError>;

/// Structured error type for playground operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum PlaypenError {
    /// A configuration value is out of range or inconsistent
    #[error("Invalid config value for '{field}': {value} - {reason}")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    /// A color string could not be parsed as `#rrggbb`
    #[error("Invalid color '{value}': {reason}")]
    InvalidColor { value: String, reason: String },

    /// A color was requested that is not part of the palette
    #[error("Color {color} is not in the palette")]
    ColorNotInPalette { color: String },

    /// A language was selected that is not configured
    #[error("Unknown language: {language}")]
    UnknownLanguage { language: String },

    /// A required form field is empty
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// TOML/JSON (de)serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl PlaypenError {
    /// Create an InvalidConfig error
    pub fn invalid_config(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        PlaypenError::InvalidConfig {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidColor error
    pub fn invalid_color(value: impl Into<String>, reason: impl Into<String>) -> Self {
        PlaypenError::InvalidColor {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a ColorNotInPalette error
    pub fn color_not_in_palette(color: impl Into<String>) -> Self {
        PlaypenError::ColorNotInPalette { color: color.into() }
    }

    /// Create an UnknownLanguage error
    pub fn unknown_language(language: impl Into<String>) -> Self {
        PlaypenError::UnknownLanguage {
            language: language.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        PlaypenError::MissingField { field: field.into() }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        PlaypenError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PlaypenError::InvalidConfig { .. } => "INVALID_CONFIG",
            PlaypenError::InvalidColor { .. } => "INVALID_COLOR",
            PlaypenError::ColorNotInPalette { .. } => "COLOR_NOT_IN_PALETTE",
            PlaypenError::UnknownLanguage { .. } => "UNKNOWN_LANGUAGE",
            PlaypenError::MissingField { .. } => "MISSING_FIELD",
            PlaypenError::FileError { .. } => "FILE_ERROR",
            PlaypenError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<toml::de::Error> for PlaypenError {
    fn from(err: toml::de::Error) -> Self {
        PlaypenError::SerializationError {
            reason: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for PlaypenError {
    fn from(err: toml::ser::Error) -> Self {
        PlaypenError::SerializationError {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PlaypenError {
    fn from(err: serde_json::Error) -> Self {
        PlaypenError::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = PlaypenError::unknown_language("Cobol");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"UnknownLanguage\""));
        let roundtrip: PlaypenError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(PlaypenError::missing_field("summary").error_code(), "MISSING_FIELD");
        assert_eq!(PlaypenError::color_not_in_palette("#123456").error_code(), "COLOR_NOT_IN_PALETTE");
    }

    #[test]
    fn test_error_display() {
        let error = PlaypenError::invalid_color("red", "expected #rrggbb");
        assert_eq!(error.to_string(), "Invalid color 'red': expected #rrggbb");
    }
}
