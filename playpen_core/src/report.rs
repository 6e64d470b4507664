//! Bug report draft shown on the Report page.
//!
//! Nothing is sent anywhere; the rendered text is meant to be copied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{PlaypenError, PlaypenResult};
use crate::VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDraft {
    summary: String,
    details: String,
    created: DateTime<Utc>,
}

impl Default for ReportDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportDraft {
    pub fn new() -> Self {
        Self::with_timestamp(Utc::now())
    }

    pub fn with_timestamp(created: DateTime<Utc>) -> Self {
        ReportDraft {
            summary: String::new(),
            details: String::new(),
            created,
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = summary.into();
    }

    pub fn set_details(&mut self, details: impl Into<String>) {
        self.details = details.into();
    }

    pub fn validate(&self) -> PlaypenResult<()> {
        if self.summary.trim().is_empty() {
            return Err(PlaypenError::missing_field("summary"));
        }
        Ok(())
    }

    /// Plain-text report for the clipboard.
    ///
    /// ```rust
    /// use playpen_core::report::ReportDraft;
    ///
    /// let mut draft = ReportDraft::new();
    /// assert!(draft.render().is_err());
    ///
    /// draft.set_summary("Divider sticks");
    /// assert!(draft.render().unwrap().starts_with("Bug report: Divider sticks\n"));
    /// ```
    pub fn render(&self) -> PlaypenResult<String> {
        self.validate()?;

        let mut text = format!(
            "Bug report: {}\nCreated: {}\nVersion: playpen {}\n",
            self.summary.trim(),
            self.created.format("%Y-%m-%d %H:%M:%S UTC"),
            VERSION,
        );
        let details = self.details.trim();
        if !details.is_empty() {
            text.push('\n');
            text.push_str(details);
            text.push('\n');
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> ReportDraft {
        let created = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();
        ReportDraft::with_timestamp(created)
    }

    #[test]
    fn test_empty_summary_is_rejected() {
        let mut draft = draft();
        draft.set_details("steps to reproduce");
        draft.set_summary("   ");
        let err = draft.render().unwrap_err();
        assert_eq!(err, PlaypenError::missing_field("summary"));
    }

    #[test]
    fn test_render_layout() {
        let mut draft = draft();
        draft.set_summary(" Canvas clears on resize ");
        draft.set_details("1. draw\n2. resize window\n");

        let expected = format!(
            "Bug report: Canvas clears on resize\nCreated: 2024-05-17 09:30:00 UTC\nVersion: playpen {VERSION}\n\n1. draw\n2. resize window\n"
        );
        assert_eq!(draft.render().unwrap(), expected);
    }

    #[test]
    fn test_render_without_details() {
        let mut draft = draft();
        draft.set_summary("Run button");
        assert!(draft.render().unwrap().ends_with(&format!("playpen {VERSION}\n")));
    }
}
