//! The Code Panel's "Run" action.
//!
//! A [`CodeRunner`] owns the language selection and the console buffer.
//! Every run starts from an empty console. Only the default language is
//! evaluated; any other selection produces the configured placeholder line.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RunnerConfig;
use crate::console::{ConsoleLevel, ConsoleLog};
use crate::errors::{PlaypenError, PlaypenResult};
use crate::script::{EvalError, Limits, ScriptEngine};

/// A language selector entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn new(name: impl Into<String>) -> Self {
        Language(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a run did not complete normally. The console already shows the
/// corresponding line when this is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    #[error("{language} is not evaluated locally")]
    UnsupportedLanguage { language: Language },

    #[error(transparent)]
    Evaluation(#[from] EvalError),
}

#[derive(Debug)]
pub struct CodeRunner {
    languages: Vec<Language>,
    default_language: Language,
    selected: Language,
    unsupported_message: String,
    engine: ScriptEngine,
    console: ConsoleLog,
}

impl CodeRunner {
    pub fn new(config: &RunnerConfig) -> Self {
        let default_language = Language::new(config.default_language.clone());
        CodeRunner {
            languages: config.languages.iter().cloned().map(Language::new).collect(),
            selected: default_language.clone(),
            default_language,
            unsupported_message: config.unsupported_message.clone(),
            engine: ScriptEngine::new(Limits::from(config)),
            console: ConsoleLog::new(),
        }
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn default_language(&self) -> &Language {
        &self.default_language
    }

    pub fn selected(&self) -> &Language {
        &self.selected
    }

    /// Change the selector. Only configured languages can be chosen.
    pub fn select_language(&mut self, name: &str) -> PlaypenResult<()> {
        let language = self
            .languages
            .iter()
            .find(|language| language.as_str() == name)
            .cloned()
            .ok_or_else(|| PlaypenError::unknown_language(name))?;
        tracing::debug!(%language, "language selected");
        self.selected = language;
        Ok(())
    }

    pub fn console(&self) -> &ConsoleLog {
        &self.console
    }

    pub fn clear_console(&mut self) {
        self.console.clear();
    }

    /// Run `source` with the selected language.
    ///
    /// ```rust
    /// use playpen_core::config::RunnerConfig;
    /// use playpen_core::runner::{CodeRunner, RunError};
    ///
    /// let mut runner = CodeRunner::new(&RunnerConfig::default());
    /// runner.select_language("Python").unwrap();
    /// assert!(matches!(runner.run("print(1)"), Err(RunError::UnsupportedLanguage { .. })));
    /// assert_eq!(runner.console().texts(), vec!["Oops... Server Side Error"]);
    /// ```
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        self.console.clear();

        if self.selected != self.default_language {
            tracing::info!(language = %self.selected, "skipping evaluation for non-default language");
            self.console.push(ConsoleLevel::Error, self.unsupported_message.clone());
            return Err(RunError::UnsupportedLanguage {
                language: self.selected.clone(),
            });
        }

        match self.engine.evaluate(source, &mut self.console) {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::info!(kind = %err.kind, line = ?err.line, "script run failed");
                self.console.push(ConsoleLevel::Error, format!("Error: {}", err.message()));
                Err(RunError::Evaluation(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ErrorKind;

    fn runner() -> CodeRunner {
        CodeRunner::new(&RunnerConfig::default())
    }

    #[test]
    fn test_console_log_one() {
        let mut runner = runner();
        runner.run("console.log(1)").unwrap();
        assert_eq!(runner.console().texts(), vec!["1"]);
    }

    #[test]
    fn test_non_default_language_always_gives_placeholder() {
        let mut runner = runner();
        for language in ["C++", "Python", "Java", "C#"] {
            runner.select_language(language).unwrap();
            for source in ["console.log(1)", "", "this is not code {"] {
                let result = runner.run(source);
                assert!(matches!(result, Err(RunError::UnsupportedLanguage { .. })));
                assert_eq!(runner.console().texts(), vec!["Oops... Server Side Error"]);
            }
        }
    }

    #[test]
    fn test_invalid_syntax_gives_single_error_line() {
        let mut runner = runner();
        let result = runner.run("console.log('a');\nconst = 5");
        assert!(matches!(result, Err(RunError::Evaluation(ref e)) if e.kind == ErrorKind::SyntaxError));
        let texts = runner.console().texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Error:"));
    }

    #[test]
    fn test_output_before_runtime_error_is_kept() {
        let mut runner = runner();
        let result = runner.run("console.log('first'); undefinedFunction(); console.log('never');");
        assert!(result.is_err());
        assert_eq!(runner.console().texts(), vec![
            "first",
            "Error: undefinedFunction is not defined"
        ]);
    }

    #[test]
    fn test_infinite_loop_ends_with_range_error() {
        let config = RunnerConfig {
            max_steps: 10_000,
            ..RunnerConfig::default()
        };
        let mut runner = CodeRunner::new(&config);
        let result = runner.run("let i = 0; while (true) { i++; }");
        match result {
            Err(RunError::Evaluation(err)) => assert_eq!(err.kind, ErrorKind::RangeError),
            other => panic!("expected a RangeError, got {other:?}"),
        }
        let last = runner.console().lines().last().unwrap();
        assert_eq!(last.level, ConsoleLevel::Error);
        assert!(last.text.starts_with("Error: "));
    }

    #[test]
    fn test_unbounded_recursion_reports_range_error() {
        let mut runner = runner();
        let result = runner.run("function f(n) { return f(n + 1); } f(0)");
        match result {
            Err(RunError::Evaluation(err)) => assert_eq!(err.kind, ErrorKind::RangeError),
            other => panic!("expected a RangeError, got {other:?}"),
        }
        assert_eq!(runner.console().texts(), vec!["Error: Maximum call stack size exceeded"]);
    }

    #[test]
    fn test_deeply_nested_literal_gives_single_error_line() {
        let mut runner = runner();
        let source = format!("console.log({}1{})", "[".repeat(5_000), "]".repeat(5_000));
        assert!(runner.run(&source).is_err());
        assert_eq!(runner.console().texts(), vec!["Error: Nesting too deep"]);
    }

    #[test]
    fn test_deeply_nested_array_built_at_runtime() {
        let mut runner = runner();
        runner
            .run("let a = 1; for (let i = 0; i < 5000; i++) { a = [a]; } console.log(String(a).length)")
            .unwrap();
        assert_eq!(runner.console().texts(), vec!["0"]);
    }

    // The thrown value's string form is the message: `throw 'boom'` shows
    // "Error: boom", not "Error: undefined".
    #[test]
    fn test_thrown_string_is_shown_as_message() {
        let mut runner = runner();
        assert!(runner.run("throw 'boom'").is_err());
        assert_eq!(runner.console().texts(), vec!["Error: boom"]);
    }

    #[test]
    fn test_each_run_clears_console() {
        let mut runner = runner();
        runner.run("console.log('one')").unwrap();
        runner.run("console.log('two')").unwrap();
        assert_eq!(runner.console().texts(), vec!["two"]);
    }

    #[test]
    fn test_select_unknown_language_is_rejected() {
        let mut runner = runner();
        let err = runner.select_language("COBOL").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_LANGUAGE");
        assert_eq!(runner.selected().as_str(), "JavaScript");
    }

    #[test]
    fn test_switching_back_to_default_evaluates_again() {
        let mut runner = runner();
        runner.select_language("Java").unwrap();
        assert!(runner.run("console.log(2)").is_err());
        runner.select_language("JavaScript").unwrap();
        runner.run("console.log(2)").unwrap();
        assert_eq!(runner.console().texts(), vec!["2"]);
    }
}
